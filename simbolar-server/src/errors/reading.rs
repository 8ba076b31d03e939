use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    #[error("Distance is required")]
    MissingDistance,

    #[error("Distance must be a finite, non-negative number")]
    InvalidDistance,

    #[error("Levels computed by the node are not accepted, post the raw distance to /api/sensors")]
    NodeComputedLevel,
}

impl ReadingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReadingError::MissingDistance => StatusCode::BAD_REQUEST,
            ReadingError::InvalidDistance => StatusCode::BAD_REQUEST,
            ReadingError::NodeComputedLevel => StatusCode::BAD_REQUEST,
        }
    }
}
