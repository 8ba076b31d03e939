use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::openapi::OpenApi as OpenApiDocument;
use utoipa::{OpenApi, ToSchema};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::sensor_handle::ingest_reading,
        super::sensor_handle::get_state,
        super::sensor_handle::get_state_events,
        super::command_handle::set_commands,
        super::command_handle::replace_commands,
        super::command_handle::get_commands,
        super::legacy_handle::get_legacy_state,
        super::legacy_handle::set_legacy_commands,
        get_health
    ),
    tags(
        (name = "sensor", description = "Readings posted by the tank node"),
        (name = "command", description = "Actuator commands issued by the dashboard"),
        (name = "legacy", description = "Routes of the first dashboard build"),
        (name = "system", description = "Health and API description")
    )
)]
pub struct ApiDoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

pub fn system_router() -> Router {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/docs/openapi.json", get(get_openapi))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Ok,
    })
}

pub async fn get_openapi() -> Json<OpenApiDocument> {
    Json(ApiDoc::openapi())
}
