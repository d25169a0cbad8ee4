use async_trait::async_trait;
use salla_agent_relay::llm::{ModelBackend, UpstreamError};
use std::sync::{Arc, Mutex};

/// A recorded call to the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub api_key: String,
    pub input: String,
}

/// Mock model backend for testing
#[derive(Debug)]
pub struct MockBackend {
    pub reply: Result<String, UpstreamError>,
    pub calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl MockBackend {
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing(error: UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn reply(&self, api_key: &str, input: &str) -> Result<String, UpstreamError> {
        self.calls.lock().unwrap().push(BackendCall {
            api_key: api_key.to_string(),
            input: input.to_string(),
        });

        self.reply.clone()
    }
}
