use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("Tank height must be positive, got {0}")]
    NonPositiveTankHeight(f64),

    #[error("Max delta must not be negative, got {0}")]
    NegativeMaxDelta(f64),

    #[error("Calibration value {0} is not finite")]
    NonFinite(&'static str),
}

impl CalibrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CalibrationError::NonPositiveTankHeight(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CalibrationError::NegativeMaxDelta(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CalibrationError::NonFinite(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}
