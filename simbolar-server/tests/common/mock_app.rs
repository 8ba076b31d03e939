use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use simbolar_api::models::{CommandState, SensorState};
use simbolar_server::app::create_router;
use simbolar_server::services::StateStore;
use tower::ServiceExt;

pub struct MockApp {
    pub store: Arc<StateStore>,
    pub router: Router,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_state(SensorState::default(), CommandState::new([false; 4], true))
    }

    pub fn with_state(sensors: SensorState, commands: CommandState) -> Self {
        let store = Arc::new(StateStore::new(sensors, commands));
        let router = create_router(store.clone());

        Self { store, router }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap();

        Self::collect(self.router.clone().oneshot(request).await.unwrap()).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().uri(uri).method(method);

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        Self::collect(self.router.clone().oneshot(request).await.unwrap()).await
    }

    async fn collect(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, value)
    }
}
