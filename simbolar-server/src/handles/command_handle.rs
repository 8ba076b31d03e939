use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::get;
use axum::{Json, Router};
use simbolar_api::models::{CommandRequest, CommandResponse, CommandState};

use crate::errors::ApiError;
use crate::services::{CommandService, UpdateMode};

#[derive(Clone)]
pub struct ControlState {
    pub command_service: Arc<CommandService>,
}

pub fn command_router(control_state: ControlState) -> Router {
    Router::new()
        .route(
            "/api/sensors/commands",
            get(get_commands).post(set_commands).put(replace_commands),
        )
        .with_state(control_state)
}

#[utoipa::path(
    post,
    path = "/api/sensors/commands",
    tag = "command",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Present fields applied, absent fields kept", body = CommandResponse),
        (status = 400, description = "A flag is not a boolean")
    )
)]
pub async fn set_commands(
    State(state): State<ControlState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(request) = body?;

    Ok(Json(state.command_service.set(&request, UpdateMode::Merge).await))
}

#[utoipa::path(
    put,
    path = "/api/sensors/commands",
    tag = "command",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Command state replaced, absent fields off", body = CommandResponse),
        (status = 400, description = "A flag is not a boolean")
    )
)]
pub async fn replace_commands(
    State(state): State<ControlState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(request) = body?;

    Ok(Json(state.command_service.set(&request, UpdateMode::Replace).await))
}

#[utoipa::path(
    get,
    path = "/api/sensors/commands",
    tag = "command",
    responses(
        (status = 200, description = "Current command state", body = CommandState)
    )
)]
pub async fn get_commands(State(state): State<ControlState>) -> Json<CommandState> {
    Json(state.command_service.get().await)
}
