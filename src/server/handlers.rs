use super::error::{INPUT_REQUIRED, RelayError};
use crate::{
    config::{Config, Environment},
    llm::{ModelBackend, UpstreamError},
    protocol::AgentResponse,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-only per-process state shared by every relay invocation.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ModelBackend>,
    pub api_key: Option<Arc<str>>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(config: &Config, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            api_key: config.llm.api_key.as_deref().map(Arc::from),
            environment: config.server.environment,
        }
    }
}

pub async fn agent(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    if method != Method::POST {
        warn!("Rejected {} request to agent endpoint", method);
        return RelayError::MethodNotAllowed.into_response_for(state.environment);
    }

    match relay(&state, &body).await {
        Ok(output_text) => {
            info!("Agent replied with {} characters", output_text.len());
            Json(AgentResponse { output_text }).into_response()
        }
        Err(e) => {
            if e.status().is_server_error() {
                error!("Agent request failed: {}", e);
            } else {
                warn!("Agent request rejected: {}", e);
            }
            e.into_response_for(state.environment)
        }
    }
}

async fn relay(state: &AppState, body: &[u8]) -> Result<String, RelayError> {
    let input = parse_input(body)?;
    let api_key = state
        .api_key
        .as_deref()
        .ok_or(RelayError::MissingCredential)?;

    info!(
        "Forwarding {} characters to the {} backend",
        input.len(),
        state.backend.name()
    );

    let output = state.backend.reply(api_key, &input).await?;
    if output.trim().is_empty() {
        return Err(UpstreamError::Malformed("Agent result missing output_text".to_string()).into());
    }

    Ok(output)
}

/// Extracts the trimmed `input_as_text`, rejecting anything that is not a
/// JSON object carrying a non-blank string there.
fn parse_input(body: &[u8]) -> Result<String, RelayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RelayError::InvalidInput(format!("Invalid JSON body: {}", e)))?;

    value
        .get("input_as_text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RelayError::InvalidInput(INPUT_REQUIRED.to_string()))
}
