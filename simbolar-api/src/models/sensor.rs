use serde::{Deserialize, Serialize};

use super::Status;
use crate::bits::unpack_buttons;
use crate::level::Calibration;

/// `raw_distance` value before the first reading arrives.
pub const NO_READING: f64 = -1.0;

/// Reading posted by the node.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Measured distance between sensor and water surface
    pub distance: Option<f64>,
    /// Digital input byte, buttons in bit 0..3
    pub raw_button_byte: Option<u8>,
    /// New tank depth
    pub tank_height: Option<f64>,
    /// New distance between sensor and brim
    pub sensor_offset: Option<f64>,
    /// New delta filter threshold, 0 disables it
    pub max_delta: Option<f64>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buttons {
    pub b1: bool,
    pub b2: bool,
    pub b3: bool,
    pub b4: bool,
}

impl From<u8> for Buttons {
    fn from(byte: u8) -> Self {
        let [b1, b2, b3, b4] = unpack_buttons(byte);
        Self { b1, b2, b3, b4 }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorState {
    /// Last accepted distance, -1 until the first reading
    pub raw_distance: f64,
    /// Tank depth
    pub tank_height: f64,
    /// Distance between sensor and brim
    pub sensor_offset: f64,
    /// Delta filter threshold, 0 when disabled
    pub max_delta: f64,
    /// Water column above the tank floor
    pub water_height: f64,
    /// Fill level percentage (0-100)
    pub fill_percent: u8,
    /// Last digital input byte
    pub raw_button_byte: u8,
    /// Buttons decoded from the input byte
    pub buttons: Buttons,
    /// Unix time of the last accepted reading
    pub updated_at: Option<i64>,
}

impl SensorState {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            raw_distance: NO_READING,
            tank_height: calibration.tank_height,
            sensor_offset: calibration.sensor_offset,
            max_delta: calibration.max_delta,
            water_height: 0.0,
            fill_percent: 0,
            raw_button_byte: 0,
            buttons: Buttons::default(),
            updated_at: None,
        }
    }

    pub fn has_reading(&self) -> bool {
        self.raw_distance >= 0.0
    }

    pub fn calibration(&self) -> Calibration {
        Calibration {
            tank_height: self.tank_height,
            sensor_offset: self.sensor_offset,
            max_delta: self.max_delta,
        }
    }

    pub fn set_button_byte(&mut self, byte: u8) {
        self.raw_button_byte = byte;
        self.buttons = Buttons::from(byte);
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new(Calibration {
            tank_height: 300.0,
            sensor_offset: 30.0,
            max_delta: 0.0,
        })
    }
}

/// Answer to the node, carrying the control byte it should apply.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// Current control byte
    pub packed_byte: u8,
    /// Whether the reading was applied
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_reading_accepts_partial_body() {
        let reading: SensorReading = serde_json::from_value(json!({ "distance": 120.5 })).unwrap();
        assert_eq!(reading.distance, Some(120.5));
        assert_eq!(reading.raw_button_byte, None);
        assert_eq!(reading.tank_height, None);
    }

    #[test]
    fn test_reading_rejects_out_of_range_button_byte() {
        let reading = serde_json::from_value::<SensorReading>(json!({
            "distance": 10.0,
            "rawButtonByte": 256
        }));
        assert!(reading.is_err());
    }

    #[test]
    fn test_reading_rejects_textual_distance() {
        let reading = serde_json::from_value::<SensorReading>(json!({ "distance": "120" }));
        assert!(reading.is_err());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let mut state = SensorState::default();
        state.set_button_byte(0b0000_0101);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["rawDistance"], json!(-1.0));
        assert_eq!(value["tankHeight"], json!(300.0));
        assert_eq!(value["sensorOffset"], json!(30.0));
        assert_eq!(value["fillPercent"], json!(0));
        assert_eq!(value["rawButtonByte"], json!(5));
        assert_eq!(value["buttons"], json!({ "b1": true, "b2": false, "b3": true, "b4": false }));
    }

    #[test]
    fn test_default_state_has_no_reading() {
        assert!(!SensorState::default().has_reading());
    }

    #[test]
    fn test_ingest_response_wire_shape() {
        let response = IngestResponse {
            packed_byte: 16,
            status: Status::IgnoredByDelta,
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "packedByte": 16, "status": "ignored_by_delta" })
        );
    }
}
