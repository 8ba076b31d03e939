//! Routes of the first dashboard build, which still polls the Spanish paths.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use simbolar_api::models::{CombinedState, CommandRequest, CommandResponse, SensorReading};
use utoipa::ToSchema;

use crate::errors::{ApiError, ReadingError};
use crate::services::{CommandService, TelemetryService, UpdateMode};

#[derive(Clone)]
pub struct LegacyState {
    pub telemetry_service: Arc<TelemetryService>,
    pub command_service: Arc<CommandService>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacySensors {
    pub altura: f64,
    pub porcentaje: u8,
    pub tank_h: f64,
    pub sensor_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacyCommands {
    pub lcd: bool,
    #[serde(rename = "relay1ON")]
    pub relay1_on: bool,
    #[serde(rename = "relay2ON")]
    pub relay2_on: bool,
    #[serde(rename = "relay3ON")]
    pub relay3_on: bool,
    #[serde(rename = "relay4ON")]
    pub relay4_on: bool,
}

/// Body of the old combined node/dashboard POST.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacyCommandRequest {
    pub lcd: Option<bool>,
    #[serde(rename = "relay1ON")]
    pub relay1_on: Option<bool>,
    #[serde(rename = "relay2ON")]
    pub relay2_on: Option<bool>,
    #[serde(rename = "relay3ON")]
    pub relay3_on: Option<bool>,
    #[serde(rename = "relay4ON")]
    pub relay4_on: Option<bool>,
    /// New tank depth
    pub tank_h: Option<f64>,
    /// Water height computed on the node, rejected
    pub altura: Option<f64>,
    /// Fill percentage computed on the node, rejected
    pub porcentaje: Option<f64>,
}

impl LegacyCommandRequest {
    pub fn has_node_level(&self) -> bool {
        self.altura.is_some() || self.porcentaje.is_some()
    }

    /// Calibration carried by the body, if any.
    pub fn calibration(&self) -> Option<SensorReading> {
        self.tank_h.map(|tank_height| SensorReading {
            tank_height: Some(tank_height),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacySnapshot {
    pub sensores: LegacySensors,
    pub comandos: LegacyCommands,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacyStateResponse {
    pub devolver: LegacySnapshot,
}

impl From<CombinedState> for LegacySnapshot {
    fn from(state: CombinedState) -> Self {
        let CombinedState { sensors, commands } = state;

        Self {
            sensores: LegacySensors {
                altura: sensors.water_height,
                porcentaje: sensors.fill_percent,
                tank_h: sensors.tank_height,
                sensor_m: sensors.sensor_offset,
            },
            comandos: LegacyCommands {
                lcd: commands.lcd_on,
                relay1_on: commands.relay1,
                relay2_on: commands.relay2,
                relay3_on: commands.relay3,
                relay4_on: commands.relay4,
            },
        }
    }
}

impl From<LegacyCommandRequest> for CommandRequest {
    fn from(commands: LegacyCommandRequest) -> Self {
        Self {
            relay1: commands.relay1_on,
            relay2: commands.relay2_on,
            relay3: commands.relay3_on,
            relay4: commands.relay4_on,
            lcd_on: commands.lcd,
        }
    }
}

pub fn legacy_router(legacy_state: LegacyState) -> Router {
    Router::new()
        .route("/api/Sensores/estado", get(get_legacy_state))
        .route("/api/Sensores/comandos", post(set_legacy_commands))
        .with_state(legacy_state)
}

#[utoipa::path(
    get,
    path = "/api/Sensores/estado",
    tag = "legacy",
    responses(
        (status = 200, description = "Combined state in the first dashboard's shape", body = LegacyStateResponse)
    )
)]
pub async fn get_legacy_state(State(state): State<LegacyState>) -> Json<LegacyStateResponse> {
    let snapshot = state.telemetry_service.state().await;

    Json(LegacyStateResponse {
        devolver: snapshot.into(),
    })
}

/// Merges `lcd` / `relayNON` flags and applies `tank_h` as a tank height.
/// Node-computed `altura` / `porcentaje` are refused before anything changes.
#[utoipa::path(
    post,
    path = "/api/Sensores/comandos",
    tag = "legacy",
    request_body = LegacyCommandRequest,
    responses(
        (status = 200, description = "Commands merged", body = CommandResponse),
        (status = 400, description = "Malformed body or levels computed by the node"),
        (status = 422, description = "Tank height is not a positive number")
    )
)]
pub async fn set_legacy_commands(
    State(state): State<LegacyState>,
    body: Result<Json<LegacyCommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(commands) = body?;

    if commands.has_node_level() {
        return Err(ReadingError::NodeComputedLevel.into());
    }

    if let Some(calibration) = commands.calibration() {
        state.telemetry_service.apply_calibration(&calibration).await?;
    }

    let request = CommandRequest::from(commands);

    Ok(Json(state.command_service.set(&request, UpdateMode::Merge).await))
}
