use axum::extract::rejection::JsonRejection;

use super::{CalibrationError, ReadingError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Reading error: {0}")]
    ReadingError(#[from] ReadingError),

    #[error("Calibration error: {0}")]
    CalibrationError(#[from] CalibrationError),

    #[error("Malformed request body: {0}")]
    BodyError(#[from] JsonRejection),
}
