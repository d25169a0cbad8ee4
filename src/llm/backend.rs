use super::{AgentBackend, CompletionBackend};
use crate::{
    Result,
    config::{BackendKind, LlmConfig},
};
use async_openai::error::OpenAIError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Text in, text out: the one capability the relay needs from a model provider.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn reply(&self, api_key: &str, input: &str) -> std::result::Result<String, UpstreamError>;
}

/// Failure of a model-serving call, classified from status codes and
/// provider error codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Model-serving integration unavailable: {0}")]
    Unavailable(String),

    #[error("Model-serving credential rejected: {0}")]
    CredentialRejected(String),

    #[error("Model-serving rate limit or quota exhausted: {0}")]
    RateLimited(String),

    #[error("Malformed model-serving result: {0}")]
    Malformed(String),

    #[error("{0}")]
    Failed(String),
}

const RATE_LIMIT_CODES: &[&str] = &["rate_limit_exceeded", "insufficient_quota"];
const CREDENTIAL_CODES: &[&str] = &["invalid_api_key", "invalid_authentication"];

impl UpstreamError {
    /// Classifies a provider error from its HTTP status (when known) and its
    /// `code`/`type` fields.
    pub fn from_provider(
        status: Option<u16>,
        code: Option<&str>,
        kind: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let is_known = |known: &[&str]| {
            code.is_some_and(|c| known.contains(&c)) || kind.is_some_and(|k| known.contains(&k))
        };

        if status == Some(429) || is_known(RATE_LIMIT_CODES) {
            Self::RateLimited(message)
        } else if matches!(status, Some(401) | Some(403)) || is_known(CREDENTIAL_CODES) {
            Self::CredentialRejected(message)
        } else {
            Self::Failed(message)
        }
    }

    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_builder() {
            Self::Unavailable(error.to_string())
        } else if error.is_decode() {
            Self::Malformed(error.to_string())
        } else {
            Self::Failed(error.to_string())
        }
    }
}

impl From<OpenAIError> for UpstreamError {
    fn from(error: OpenAIError) -> Self {
        match error {
            OpenAIError::ApiError(api) => Self::from_provider(
                None,
                api.code.as_deref(),
                api.r#type.as_deref(),
                api.message,
            ),
            OpenAIError::Reqwest(e) => Self::from_transport(e),
            OpenAIError::JSONDeserialize(e) => Self::Malformed(e.to_string()),
            other => Self::Failed(other.to_string()),
        }
    }
}

pub fn build_backend(config: &LlmConfig) -> Result<Arc<dyn ModelBackend>> {
    let http = reqwest::Client::builder().build()?;

    let backend: Arc<dyn ModelBackend> = match config.backend {
        BackendKind::Agent => Arc::new(AgentBackend::new(config, http)),
        BackendKind::Completion => Arc::new(CompletionBackend::new(config, http)),
    };

    info!(
        "Model backend '{}' targeting {} with model {}",
        backend.name(),
        config.base_url,
        config.model
    );

    Ok(backend)
}
