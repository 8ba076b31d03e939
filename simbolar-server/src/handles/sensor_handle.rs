use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::{get, post};
use axum::{Json, Router};
use simbolar_api::models::{CombinedState, IngestResponse, SensorReading};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::errors::ApiError;
use crate::services::{StateStore, TelemetryService};

#[derive(Clone)]
pub struct TelemetryState {
    pub telemetry_service: Arc<TelemetryService>,
    pub store: Arc<StateStore>,
}

pub fn sensor_router(telemetry_state: TelemetryState) -> Router {
    Router::new()
        .route("/api/sensors", post(ingest_reading))
        .route("/api/sensors/state", get(get_state))
        .route("/api/sensors/events", get(get_state_events))
        .with_state(telemetry_state)
}

#[utoipa::path(
    post,
    path = "/api/sensors",
    tag = "sensor",
    request_body = SensorReading,
    responses(
        (status = 200, description = "Reading applied or ignored by the delta filter", body = IngestResponse),
        (status = 400, description = "Distance missing or not a valid number"),
        (status = 422, description = "Calibration is non-positive, negative or overflows")
    )
)]
pub async fn ingest_reading(
    State(state): State<TelemetryState>,
    body: Result<Json<SensorReading>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(reading) = body?;

    let response = state.telemetry_service.ingest(&reading).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/sensors/state",
    tag = "sensor",
    responses(
        (status = 200, description = "Sensor and command snapshot", body = CombinedState)
    )
)]
pub async fn get_state(State(state): State<TelemetryState>) -> Json<CombinedState> {
    Json(state.telemetry_service.state().await)
}

/// Streams a `state` event with the current snapshot, then one per change.
#[utoipa::path(
    get,
    path = "/api/sensors/events",
    tag = "sensor",
    responses(
        (status = 200, description = "Server-sent `state` events carrying CombinedState")
    )
)]
pub async fn get_state_events(
    State(state): State<TelemetryState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the snapshot is taken
    let updates = BroadcastStream::new(state.store.subscribe()).filter_map(|update| match update {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!("state stream lagged: {}", e);
            None
        }
    });
    let initial = state.telemetry_service.state().await;

    let stream = tokio_stream::once(initial)
        .chain(updates)
        .map(|snapshot| Ok::<_, Infallible>(state_event(&snapshot)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn state_event(snapshot: &CombinedState) -> Event {
    match Event::default().event("state").json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Error encoding state event: {}", e);
            Event::default().event("state")
        }
    }
}
