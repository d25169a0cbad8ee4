pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod protocol;
pub mod server;

pub use error::{Error, Result};
