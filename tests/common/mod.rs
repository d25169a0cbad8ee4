#![allow(dead_code)]

pub mod mocks;

use axum::{Router, body::Body, http::Request};
use salla_agent_relay::{
    config::Environment,
    llm::ModelBackend,
    server::{AppState, router},
};
use std::sync::Arc;

pub const TEST_API_KEY: &str = "sk-test-key";

/// Builds the relay router around a mock backend.
pub fn create_test_app(
    backend: Arc<dyn ModelBackend>,
    api_key: Option<&str>,
    environment: Environment,
) -> Router {
    router(AppState {
        backend,
        api_key: api_key.map(Arc::from),
        environment,
    })
}

pub fn json_request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
