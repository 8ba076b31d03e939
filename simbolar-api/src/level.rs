//! Conversion of an ultrasonic distance into water height and fill percentage.
//!
//! The sensor hangs `sensor_offset` above the brim of a tank that is
//! `tank_height` deep, looking down. A distance equal to `tank_height +
//! sensor_offset` means an empty tank.

/// Calibration constants of one tank installation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Depth of the tank.
    pub tank_height: f64,
    /// Distance between the sensor and the brim.
    pub sensor_offset: f64,
    /// Largest accepted jump between two readings, `0` disables the filter.
    pub max_delta: f64,
}

/// Quantities derived from a single distance reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub water_height: f64,
    pub fill_percent: u8,
}

impl Calibration {
    /// Distance the sensor reports when the tank is empty.
    pub fn ground_point(&self) -> f64 {
        self.tank_height + self.sensor_offset
    }

    pub fn level(&self, distance: f64) -> Level {
        let water_height = self.ground_point() - distance;

        Level {
            water_height,
            fill_percent: fill_percent(water_height, self.tank_height),
        }
    }

    pub fn filter_enabled(&self) -> bool {
        self.max_delta > 0.0
    }

    /// Returns whether `distance` jumps further than `max_delta` from `previous`.
    pub fn rejects(&self, previous: f64, distance: f64) -> bool {
        if !self.filter_enabled() {
            return false;
        }

        let delta = if distance > previous {
            distance - previous
        } else {
            previous - distance
        };

        delta > self.max_delta
    }
}

/// Water height as a rounded percentage of `tank_height`, clamped to `0..=100`.
///
/// A non-positive `tank_height` yields `0` instead of a division by zero.
pub fn fill_percent(water_height: f64, tank_height: f64) -> u8 {
    if !(tank_height > 0.0) {
        return 0;
    }

    let percent = water_height / tank_height * 100.0;

    // NaN falls through to 0
    if !(percent > 0.0) {
        0
    } else if percent >= 100.0 {
        100
    } else {
        (percent + 0.5) as u8
    }
}
