//! Wire types shared by the bridge and the relay.

use serde::{Deserialize, Serialize};

/// Route the relay serves and the bridge targets by default.
pub const AGENT_ROUTE: &str = "/api/agent";

pub const ALLOWED_ORIGIN: &str = "*";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub input_as_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub output_text: String,
}
