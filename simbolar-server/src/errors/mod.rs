pub mod api;
pub mod calibration;
pub mod reading;

pub use api::ApiError;
pub use calibration::CalibrationError;
pub use reading::ReadingError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ReadingError(e) => (e.status_code(), e.to_string()),
            ApiError::CalibrationError(e) => (e.status_code(), e.to_string()),
            // Every undecodable body is a client error, whatever axum would pick
            ApiError::BodyError(e) => (StatusCode::BAD_REQUEST, e.body_text()),
        };

        tracing::warn!(status = status.as_u16(), "rejected request: {}", error_message);

        let body = Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}
