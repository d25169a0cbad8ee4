mod agent;
mod backend;
mod completion;

pub use agent::AgentBackend;
pub use backend::{ModelBackend, UpstreamError, build_backend};
pub use completion::CompletionBackend;

/// Instructions for the Salla developer agent, used unless
/// `llm.system_prompt` replaces them.
pub const DEFAULT_INSTRUCTIONS: &str = include_str!("../../prompts/salla_developer_agent.md");

pub(crate) fn instructions(config: &crate::config::LlmConfig) -> String {
    config
        .system_prompt
        .clone()
        .filter(|prompt| !prompt.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string())
}
