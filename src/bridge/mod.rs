//! Client side of the chat: resolves where the relay lives and what
//! credential to present, then performs a single bounded call.

mod client;
mod error;
mod settings;

pub use client::{
    AgentBridge, BridgeConfig, DEFAULT_ENDPOINT, DEFAULT_ORIGIN, DEFAULT_TIMEOUT, parse_response,
};
pub use error::BridgeError;
pub use settings::{
    DEFAULT_SETTINGS_PATH, FileSettingsStore, MemorySettingsStore, Settings, SettingsStore,
};
