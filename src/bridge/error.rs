use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Message cannot be empty")]
    EmptyInput,

    #[error("Invalid agent endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Request timeout: the agent took longer than {}s to respond", .0.as_secs())]
    Timeout(Duration),

    #[error("API request failed: {status} {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),

    #[error("Failed to communicate with agent: {0}")]
    Network(#[from] reqwest::Error),
}

impl BridgeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
