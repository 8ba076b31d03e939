use std::sync::Arc;

use simbolar_api::level::Calibration;
use simbolar_api::models::{CombinedState, IngestResponse, SensorReading, SensorState, Status};
use time::OffsetDateTime;

use super::StateStore;
use crate::errors::{ApiError, CalibrationError, ReadingError};

/// Ingest side of the relay: turns node readings into sensor state.
pub struct TelemetryService {
    store: Arc<StateStore>,
}

impl TelemetryService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Applies `reading` and answers with the control byte the node should use.
    pub async fn ingest(&self, reading: &SensorReading) -> Result<IngestResponse, ApiError> {
        let distance = validate_distance(reading.distance)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let status = self
            .store
            .update_sensors(|current| reconcile(current, reading, distance, now))
            .await?;

        // Read after the sensor guard is released
        let packed_byte = self.store.packed_byte().await;

        Ok(IngestResponse {
            packed_byte,
            status,
        })
    }

    /// Applies calibration fields without a reading, re-deriving the level of
    /// the stored distance.
    pub async fn apply_calibration(&self, reading: &SensorReading) -> Result<(), ApiError> {
        self.store
            .update_sensors(|current| recalibrate(current, reading))
            .await?;

        Ok(())
    }

    pub async fn state(&self) -> CombinedState {
        self.store.snapshot().await
    }
}

pub fn validate_distance(distance: Option<f64>) -> Result<f64, ReadingError> {
    match distance {
        None => Err(ReadingError::MissingDistance),
        Some(distance) if distance.is_finite() && distance >= 0.0 => Ok(distance),
        Some(_) => Err(ReadingError::InvalidDistance),
    }
}

/// Overlays the calibration fields present in `reading` onto `current`.
pub fn calibrate(
    current: Calibration,
    reading: &SensorReading,
) -> Result<Calibration, CalibrationError> {
    let calibration = Calibration {
        tank_height: reading.tank_height.unwrap_or(current.tank_height),
        sensor_offset: reading.sensor_offset.unwrap_or(current.sensor_offset),
        max_delta: reading.max_delta.unwrap_or(current.max_delta),
    };

    for (name, value) in [
        ("tankHeight", calibration.tank_height),
        ("sensorOffset", calibration.sensor_offset),
        ("maxDelta", calibration.max_delta),
    ] {
        if !value.is_finite() {
            return Err(CalibrationError::NonFinite(name));
        }
    }

    if !calibration.ground_point().is_finite() {
        return Err(CalibrationError::NonFinite("sensorGroundPoint"));
    }

    if calibration.tank_height <= 0.0 {
        return Err(CalibrationError::NonPositiveTankHeight(calibration.tank_height));
    }

    if calibration.max_delta < 0.0 {
        return Err(CalibrationError::NegativeMaxDelta(calibration.max_delta));
    }

    Ok(calibration)
}

/// Derives the sensor record `current` would have under the calibration
/// fields of `reading`. The distance in `reading` is not looked at.
pub fn recalibrate(
    current: &SensorState,
    reading: &SensorReading,
) -> Result<(Option<SensorState>, ()), CalibrationError> {
    let calibration = calibrate(current.calibration(), reading)?;
    if calibration == current.calibration() {
        return Ok((None, ()));
    }

    let mut next = SensorState {
        tank_height: calibration.tank_height,
        sensor_offset: calibration.sensor_offset,
        max_delta: calibration.max_delta,
        ..current.clone()
    };

    if current.has_reading() {
        let level = calibration.level(current.raw_distance);
        if !level.water_height.is_finite() {
            return Err(CalibrationError::NonFinite("waterHeight"));
        }
        next.water_height = level.water_height;
        next.fill_percent = level.fill_percent;
    }

    tracing::info!(
        tank_height = next.tank_height,
        sensor_offset = next.sensor_offset,
        max_delta = next.max_delta,
        "calibration updated"
    );

    Ok((Some(next), ()))
}

/// Derives the next sensor record from `current` and a validated reading.
///
/// A reading dropped by the delta filter only keeps a new `max_delta`; tank
/// geometry changes travel with accepted readings so the derived fields always
/// match the stored calibration.
pub fn reconcile(
    current: &SensorState,
    reading: &SensorReading,
    distance: f64,
    now: i64,
) -> Result<(Option<SensorState>, Status), CalibrationError> {
    let calibration = calibrate(current.calibration(), reading)?;

    if current.has_reading() && calibration.rejects(current.raw_distance, distance) {
        tracing::warn!(
            distance,
            previous = current.raw_distance,
            max_delta = calibration.max_delta,
            "reading ignored by delta filter"
        );

        let next = (calibration.max_delta != current.max_delta).then(|| SensorState {
            max_delta: calibration.max_delta,
            ..current.clone()
        });

        return Ok((next, Status::IgnoredByDelta));
    }

    let level = calibration.level(distance);
    if !level.water_height.is_finite() {
        return Err(CalibrationError::NonFinite("waterHeight"));
    }

    let mut next = SensorState {
        raw_distance: distance,
        tank_height: calibration.tank_height,
        sensor_offset: calibration.sensor_offset,
        max_delta: calibration.max_delta,
        water_height: level.water_height,
        fill_percent: level.fill_percent,
        updated_at: Some(now),
        ..current.clone()
    };
    next.set_button_byte(reading.raw_button_byte.unwrap_or(current.raw_button_byte));

    tracing::debug!(
        distance,
        water_height = next.water_height,
        fill_percent = next.fill_percent,
        raw_button_byte = next.raw_button_byte,
        "reading accepted"
    );

    Ok((Some(next), Status::Ok))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use simbolar_api::models::CommandState;

    use super::*;

    fn reading(distance: f64) -> SensorReading {
        SensorReading {
            distance: Some(distance),
            ..Default::default()
        }
    }

    fn accepted(current: &SensorState, reading: &SensorReading) -> SensorState {
        let distance = reading.distance.unwrap();
        match reconcile(current, reading, distance, 0).unwrap() {
            (Some(next), Status::Ok) => next,
            other => panic!("Expected accepted reading, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_distance() {
        assert!(matches!(validate_distance(None), Err(ReadingError::MissingDistance)));
        assert!(matches!(validate_distance(Some(-0.5)), Err(ReadingError::InvalidDistance)));
        assert!(matches!(validate_distance(Some(f64::INFINITY)), Err(ReadingError::InvalidDistance)));
        assert_eq!(validate_distance(Some(0.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_reconcile_derives_level() {
        let next = accepted(&SensorState::default(), &reading(120.5));

        assert_eq!(next.raw_distance, 120.5);
        assert_eq!(next.water_height, 209.5);
        assert_eq!(next.fill_percent, 70);
        assert_eq!(next.updated_at, Some(0));
    }

    #[test]
    fn test_reconcile_clamps_empty_tank() {
        let next = accepted(&SensorState::default(), &reading(400.0));

        assert!(next.water_height < 0.0);
        assert_eq!(next.fill_percent, 0);
    }

    #[test]
    fn test_reconcile_applies_calibration_in_same_call() {
        let next = accepted(
            &SensorState::default(),
            &SensorReading {
                distance: Some(50.0),
                tank_height: Some(100.0),
                sensor_offset: Some(0.0),
                ..Default::default()
            },
        );

        assert_eq!(next.tank_height, 100.0);
        assert_eq!(next.sensor_offset, 0.0);
        assert_eq!(next.water_height, 50.0);
        assert_eq!(next.fill_percent, 50);
    }

    #[test]
    fn test_reconcile_keeps_button_byte_when_absent() {
        let first = accepted(
            &SensorState::default(),
            &SensorReading {
                distance: Some(100.0),
                raw_button_byte: Some(0b1001),
                ..Default::default()
            },
        );
        let second = accepted(&first, &reading(101.0));

        assert_eq!(second.raw_button_byte, 0b1001);
        assert!(second.buttons.b1);
        assert!(!second.buttons.b2);
        assert!(!second.buttons.b3);
        assert!(second.buttons.b4);
    }

    #[test]
    fn test_reconcile_is_idempotent_without_filter() {
        let first = accepted(&SensorState::default(), &reading(87.25));
        let second = accepted(&first, &reading(87.25));

        assert_eq!(first.fill_percent, second.fill_percent);
        assert_eq!(first.water_height, second.water_height);
    }

    #[test]
    fn test_reconcile_rejects_zero_tank_height() {
        let result = reconcile(
            &SensorState::default(),
            &SensorReading {
                distance: Some(10.0),
                tank_height: Some(0.0),
                ..Default::default()
            },
            10.0,
            0,
        );

        assert!(matches!(result, Err(CalibrationError::NonPositiveTankHeight(_))));
    }

    #[test]
    fn test_reconcile_rejects_negative_max_delta() {
        let result = reconcile(
            &SensorState::default(),
            &SensorReading {
                distance: Some(10.0),
                max_delta: Some(-1.0),
                ..Default::default()
            },
            10.0,
            0,
        );

        assert!(matches!(result, Err(CalibrationError::NegativeMaxDelta(_))));
    }

    #[test]
    fn test_reconcile_rejects_overflowing_ground_point() {
        let result = reconcile(
            &SensorState::default(),
            &SensorReading {
                distance: Some(1.0),
                tank_height: Some(1e308),
                sensor_offset: Some(1e308),
                ..Default::default()
            },
            1.0,
            0,
        );

        assert!(matches!(
            result,
            Err(CalibrationError::NonFinite("sensorGroundPoint"))
        ));
    }

    #[test]
    fn test_reconcile_rejects_overflowing_water_height() {
        let result = reconcile(
            &SensorState::default(),
            &SensorReading {
                distance: Some(1.7e308),
                tank_height: Some(1.0),
                sensor_offset: Some(-1.7e308),
                ..Default::default()
            },
            1.7e308,
            0,
        );

        assert!(matches!(result, Err(CalibrationError::NonFinite("waterHeight"))));
    }

    #[test]
    fn test_recalibrate_rederives_stored_reading() {
        let current = accepted(&SensorState::default(), &reading(120.5));

        let (next, ()) = recalibrate(
            &current,
            &SensorReading {
                tank_height: Some(200.0),
                ..Default::default()
            },
        )
        .unwrap();

        let next = next.unwrap();
        assert_eq!(next.tank_height, 200.0);
        assert_eq!(next.raw_distance, 120.5);
        assert_eq!(next.water_height, 109.5);
        assert_eq!(next.fill_percent, 55);
    }

    #[test]
    fn test_recalibrate_without_reading_only_stores_calibration() {
        let (next, ()) = recalibrate(
            &SensorState::default(),
            &SensorReading {
                tank_height: Some(150.0),
                ..Default::default()
            },
        )
        .unwrap();

        let next = next.unwrap();
        assert_eq!(next.tank_height, 150.0);
        assert!(!next.has_reading());
        assert_eq!(next.fill_percent, 0);
    }

    #[test]
    fn test_recalibrate_with_same_values_changes_nothing() {
        let (next, ()) = recalibrate(
            &SensorState::default(),
            &SensorReading {
                tank_height: Some(300.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(next.is_none());
    }

    #[test]
    fn test_delta_filter_needs_previous_reading() {
        let next = accepted(
            &SensorState::default(),
            &SensorReading {
                distance: Some(250.0),
                max_delta: Some(5.0),
                ..Default::default()
            },
        );

        assert_eq!(next.raw_distance, 250.0);
        assert_eq!(next.max_delta, 5.0);
    }

    #[test]
    fn test_delta_filter_drops_jump() {
        let current = accepted(&SensorState::default(), &reading(100.0));

        let (next, status) = reconcile(
            &current,
            &SensorReading {
                distance: Some(110.0),
                max_delta: Some(5.0),
                tank_height: Some(500.0),
                ..Default::default()
            },
            110.0,
            1,
        )
        .unwrap();

        assert_eq!(status, Status::IgnoredByDelta);

        let next = next.unwrap();
        assert_eq!(next.max_delta, 5.0);
        assert_eq!(next.raw_distance, 100.0);
        assert_eq!(next.tank_height, current.tank_height);
        assert_eq!(next.fill_percent, current.fill_percent);
        assert_eq!(next.water_height, current.water_height);
        assert_eq!(next.updated_at, current.updated_at);
    }

    #[test]
    fn test_delta_filter_with_known_threshold_changes_nothing() {
        let current = SensorState {
            max_delta: 5.0,
            ..accepted(&SensorState::default(), &reading(100.0))
        };

        let (next, status) = reconcile(&current, &reading(94.0), 94.0, 1).unwrap();

        assert_eq!(status, Status::IgnoredByDelta);
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_ingest_returns_packed_byte() {
        let store = Arc::new(StateStore::new(
            SensorState::default(),
            CommandState::new([true, false, true, false], true),
        ));
        let service = TelemetryService::new(store.clone());

        let response = service.ingest(&reading(120.5)).await.unwrap();

        assert_eq!(response.packed_byte, 21);
        assert_eq!(response.status, Status::Ok);
        assert_eq!(store.sensors().await.fill_percent, 70);
    }

    #[tokio::test]
    async fn test_ingest_without_distance_changes_nothing() {
        let store = Arc::new(StateStore::default());
        let service = TelemetryService::new(store.clone());

        let result = service
            .ingest(&SensorReading {
                tank_height: Some(120.0),
                raw_button_byte: Some(3),
                ..Default::default()
            })
            .await;

        assert!(matches!(
            result,
            Err(ApiError::ReadingError(ReadingError::MissingDistance))
        ));
        assert_eq!(store.sensors().await, SensorState::default());
    }

    #[tokio::test]
    async fn test_state_combines_both_records() {
        let store = Arc::new(StateStore::new(
            SensorState::default(),
            CommandState::new([false, false, false, true], false),
        ));
        let service = TelemetryService::new(store);
        service.ingest(&reading(30.0)).await.unwrap();

        let state = service.state().await;

        assert_eq!(state.sensors.fill_percent, 100);
        assert_eq!(state.commands.packed_byte, 8);
    }

    proptest! {
        #[test]
        fn reconciled_fill_percent_stays_bounded(
            distance in 0.0f64..5_000.0,
            tank_height in 0.01f64..5_000.0,
            sensor_offset in -500.0f64..500.0,
        ) {
            let reading = SensorReading {
                distance: Some(distance),
                tank_height: Some(tank_height),
                sensor_offset: Some(sensor_offset),
                ..Default::default()
            };

            let (next, status) = reconcile(&SensorState::default(), &reading, distance, 0).unwrap();
            prop_assert_eq!(status, Status::Ok);
            prop_assert!(next.unwrap().fill_percent <= 100);
        }

        #[test]
        fn delta_filter_keeps_previous_reading(
            previous in 0.0f64..1_000.0,
            max_delta in 0.1f64..50.0,
            excess in 0.001f64..500.0,
            upward in any::<bool>(),
        ) {
            let current = accepted(&SensorState::default(), &reading(previous));
            let distance = if upward {
                previous + max_delta + excess
            } else {
                previous - max_delta - excess
            };
            prop_assume!(distance >= 0.0);

            let filtered = SensorReading {
                distance: Some(distance),
                max_delta: Some(max_delta),
                ..Default::default()
            };
            let (next, status) = reconcile(&current, &filtered, distance, 1).unwrap();

            prop_assert_eq!(status, Status::IgnoredByDelta);
            let next = next.unwrap_or(current.clone());
            prop_assert_eq!(next.raw_distance, current.raw_distance);
            prop_assert_eq!(next.fill_percent, current.fill_percent);
            prop_assert_eq!(next.water_height, current.water_height);
        }
    }
}
