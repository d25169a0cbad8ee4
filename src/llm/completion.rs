use super::backend::{ModelBackend, UpstreamError};
use crate::config::LlmConfig;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use std::time::Duration;
use tracing::debug;

/// Direct chat-completion strategy: instructions as the system message,
/// user text as the only user message, first choice as the reply.
pub struct CompletionBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    instructions: String,
}

impl CompletionBackend {
    pub fn new(config: &LlmConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            instructions: super::instructions(config),
        }
    }

    fn client(&self, api_key: &str) -> Client<OpenAIConfig> {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);

        if !self.base_url.is_empty() {
            openai_config = openai_config.with_api_base(self.base_url.trim_end_matches('/'));
        }

        // async-openai retries 429s by default; a zero budget turns that off.
        let no_retry = ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..ExponentialBackoff::default()
        };

        Client::with_config(openai_config)
            .with_http_client(self.http.clone())
            .with_backoff(no_retry)
    }

    fn messages(&self, input: &str) -> Result<Vec<ChatCompletionRequestMessage>, UpstreamError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(ChatCompletionRequestSystemMessageContent::Text(
                self.instructions.clone(),
            ))
            .build()?;

        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                input.to_string(),
            ))
            .build()?;

        Ok(vec![system.into(), user.into()])
    }
}

#[async_trait]
impl ModelBackend for CompletionBackend {
    fn name(&self) -> &'static str {
        "completion"
    }

    async fn reply(&self, api_key: &str, input: &str) -> Result<String, UpstreamError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.messages(input)?)
            .build()?;

        debug!("Creating chat completion with model {}", self.model);
        let response = self.client(api_key).chat().create(request).await?;

        debug!(
            "Received chat completion response with {} choices",
            response.choices.len()
        );

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| UpstreamError::Malformed("completion returned no text".to_string()))
    }
}
