use super::backend::{ModelBackend, UpstreamError};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

const WORKFLOW_NAME: &str = "salla-developer-agent-v1";

/// Multi-turn agent strategy: runs the Salla developer agent for a
/// single-message conversation on the Responses API, with a web-search tool
/// scoped to the documentation domains and a code-interpreter tool.
pub struct AgentBackend {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    instructions: String,
    reasoning_effort: String,
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: Vec<InputMessage>,
    tools: &'a [ToolDefinition],
    reasoning: Reasoning<'a>,
    store: bool,
    metadata: HashMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: Vec<InputContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContent {
    InputText { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolDefinition {
    WebSearch {
        filters: SearchFilters,
        search_context_size: String,
        user_location: UserLocation,
    },
    CodeInterpreter {
        container: Container,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SearchFilters {
    allowed_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct UserLocation {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Container {
    #[serde(rename = "type")]
    kind: &'static str,
    file_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
    summary: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl ResponsesReply {
    /// The agent's final text: the provider's aggregate when present,
    /// otherwise every `output_text` part of every message item, in order.
    fn final_output(self) -> Option<String> {
        let text = match self.output_text {
            Some(text) => text,
            None => self
                .output
                .into_iter()
                .filter_map(|item| match item {
                    OutputItem::Message { content } => Some(content),
                    OutputItem::Other => None,
                })
                .flatten()
                .filter_map(|part| match part {
                    OutputContent::OutputText { text } => Some(text),
                    OutputContent::Other => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        };

        (!text.trim().is_empty()).then_some(text)
    }
}

fn classify_error_body(status: u16, body: &[u8]) -> UpstreamError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => UpstreamError::from_provider(
            Some(status),
            envelope.error.code.as_deref(),
            envelope.error.kind.as_deref(),
            envelope.error.message,
        ),
        Err(_) => UpstreamError::from_provider(
            Some(status),
            None,
            None,
            format!("{} {}", status, String::from_utf8_lossy(body)),
        ),
    }
}

impl AgentBackend {
    pub fn new(config: &LlmConfig, http: reqwest::Client) -> Self {
        let mut tools = vec![ToolDefinition::WebSearch {
            filters: SearchFilters {
                allowed_domains: config.web_search.allowed_domains.clone(),
            },
            search_context_size: config.web_search.search_context_size.clone(),
            user_location: UserLocation {
                kind: "approximate",
            },
        }];

        if config.code_interpreter {
            tools.push(ToolDefinition::CodeInterpreter {
                container: Container {
                    kind: "auto",
                    file_ids: Vec::new(),
                },
            });
        }

        Self {
            http,
            endpoint: format!("{}/responses", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            instructions: super::instructions(config),
            reasoning_effort: config.reasoning_effort.clone(),
            tools,
        }
    }

    fn request<'a>(&'a self, input: &str) -> ResponsesRequest<'a> {
        ResponsesRequest {
            model: &self.model,
            instructions: &self.instructions,
            input: vec![InputMessage {
                role: "user",
                content: vec![InputContent::InputText {
                    text: input.trim().to_string(),
                }],
            }],
            tools: &self.tools,
            reasoning: Reasoning {
                effort: &self.reasoning_effort,
                summary: "auto",
            },
            store: true,
            metadata: HashMap::from([("workflow", WORKFLOW_NAME)]),
        }
    }
}

#[async_trait]
impl ModelBackend for AgentBackend {
    fn name(&self) -> &'static str {
        "agent"
    }

    async fn reply(&self, api_key: &str, input: &str) -> Result<String, UpstreamError> {
        debug!("Running agent workflow {} via {}", WORKFLOW_NAME, self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request(input))
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(UpstreamError::from_transport)?;

        if !status.is_success() {
            return Err(classify_error_body(status.as_u16(), &body));
        }

        let reply: ResponsesReply = serde_json::from_slice(&body)
            .map_err(|e| UpstreamError::Malformed(format!("Invalid agent response: {}", e)))?;

        if let Some(error) = reply.error.as_ref() {
            warn!("Agent run reported an error: {}", error.message);
            return Err(UpstreamError::from_provider(
                None,
                error.code.as_deref(),
                error.kind.as_deref(),
                error.message.clone(),
            ));
        }

        debug!("Agent run finished with status {:?}", reply.status);

        reply.final_output().ok_or_else(|| {
            UpstreamError::Malformed(
                "Agent did not return a valid response. Final output is missing.".to_string(),
            )
        })
    }
}
