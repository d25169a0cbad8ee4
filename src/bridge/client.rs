use super::{
    error::BridgeError,
    settings::{Settings, SettingsStore},
};
use crate::protocol::{AGENT_ROUTE, AgentRequest, AgentResponse};
use reqwest::{RequestBuilder, Url};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Endpoint used when no override is stored; `SALLA_AGENT_API_URL` at build
/// time replaces it.
pub const DEFAULT_ENDPOINT: &str = match option_env!("SALLA_AGENT_API_URL") {
    Some(url) => url,
    None => AGENT_ROUTE,
};

/// Origin that relative endpoints are resolved against.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body reported when a failed response's text cannot be read.
const UNREADABLE_BODY: &str = "Unknown error";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub origin: String,
    pub default_endpoint: String,
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Sends one user message to the relay and validates the reply.
pub struct AgentBridge {
    http: reqwest::Client,
    settings: Arc<dyn SettingsStore>,
    config: BridgeConfig,
}

impl AgentBridge {
    pub fn new(settings: Arc<dyn SettingsStore>, config: BridgeConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), settings, config)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        settings: Arc<dyn SettingsStore>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            http,
            settings,
            config,
        }
    }

    /// Resolves the endpoint the next call will target.
    pub fn endpoint(&self) -> Result<Url, BridgeError> {
        self.resolve_endpoint(&self.settings.load())
    }

    /// Issues exactly one POST of `{"input_as_text": <trimmed message>}`.
    ///
    /// Blank messages fail with [`BridgeError::EmptyInput`] before any
    /// network activity. The whole exchange is bounded by the configured
    /// timeout; on expiry the request is dropped, which aborts it.
    pub async fn send(&self, message: &str) -> Result<AgentResponse, BridgeError> {
        let input = message.trim();
        if input.is_empty() {
            return Err(BridgeError::EmptyInput);
        }

        let settings = self.settings.load();
        let endpoint = self.resolve_endpoint(&settings)?;

        let mut request = self.http.post(endpoint.clone()).json(&AgentRequest {
            input_as_text: input.to_string(),
        });

        if let Some(api_key) = settings.api_key() {
            request = request.bearer_auth(api_key);
        }

        debug!("Sending {} characters to {}", input.len(), endpoint);

        match tokio::time::timeout(self.config.timeout, exchange(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Agent request to {} timed out after {:?}",
                    endpoint, self.config.timeout
                );
                Err(BridgeError::Timeout(self.config.timeout))
            }
        }
    }

    fn resolve_endpoint(&self, settings: &Settings) -> Result<Url, BridgeError> {
        let endpoint = settings
            .endpoint()
            .unwrap_or(self.config.default_endpoint.as_str());

        let invalid = |reason: String| BridgeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        // An absolute endpoint ignores the origin entirely.
        if let Ok(url) = Url::parse(endpoint) {
            return Ok(url);
        }

        Url::parse(&self.config.origin)
            .and_then(|origin| origin.join(endpoint))
            .map_err(|e| invalid(e.to_string()))
    }
}

async fn exchange(request: RequestBuilder) -> Result<AgentResponse, BridgeError> {
    let response = request
        .send()
        .await
        .inspect_err(|e| warn!("Agent request could not be sent: {}", e))?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
        warn!("Agent request failed with status {}", status);
        return Err(BridgeError::RequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .bytes()
        .await
        .inspect_err(|e| warn!("Failed to read agent response body: {}", e))?;
    parse_response(&body).inspect_err(|e| warn!("Agent returned an unusable response: {}", e))
}

/// Validates a success body: a JSON object whose `output_text` is a
/// non-empty string.
pub fn parse_response(body: &[u8]) -> Result<AgentResponse, BridgeError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| BridgeError::malformed(format!("body is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| BridgeError::malformed("expected object"))?;

    let output_text = object
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| BridgeError::malformed("missing or invalid output_text"))?;

    Ok(AgentResponse {
        output_text: output_text.to_string(),
    })
}
