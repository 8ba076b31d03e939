use std::sync::Arc;

use axum::Router;
use simbolar_api::models::{CommandState, SensorState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::Settings;
use crate::handles::*;
use crate::services::{CommandService, StateStore, TelemetryService};

pub fn create_app(settings: &Settings) -> Router {
    let store = Arc::new(StateStore::new(
        SensorState::new(settings.tank.calibration()),
        CommandState::new([false; 4], settings.commands.lcd_on),
    ));

    create_router(store)
}

pub fn create_router(store: Arc<StateStore>) -> Router {
    let telemetry_service = Arc::new(TelemetryService::new(store.clone()));
    let command_service = Arc::new(CommandService::new(store.clone()));

    let sensors = sensor_router(TelemetryState {
        telemetry_service: telemetry_service.clone(),
        store: store.clone(),
    });

    let commands = command_router(ControlState {
        command_service: command_service.clone(),
    });

    let legacy = legacy_router(LegacyState {
        telemetry_service: telemetry_service.clone(),
        command_service: command_service.clone(),
    });

    Router::new()
        .merge(sensors)
        .merge(commands)
        .merge(legacy)
        .merge(system_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
