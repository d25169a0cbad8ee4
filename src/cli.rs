use crate::bridge::{DEFAULT_ORIGIN, DEFAULT_SETTINGS_PATH, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "salla-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file holding the endpoint override and API key
    #[arg(long, global = true, env = "SALLA_AGENT_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay that forwards chat messages to the model backend
    Serve,

    /// Send one message through the bridge and print the reply
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Origin that relative endpoints are resolved against
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,

        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },

    /// Inspect or change the persisted bridge settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,

    Set {
        /// Relay URL; an empty value restores the default
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        api_key: Option<String>,
    },

    Clear,
}

/// Applies a `settings set` invocation; unspecified fields keep their value.
pub fn update_settings(
    current: Settings,
    endpoint: Option<String>,
    api_key: Option<String>,
) -> Settings {
    Settings {
        endpoint: endpoint.or(current.endpoint),
        api_key: api_key.or(current.api_key),
    }
    .normalized()
}

pub fn describe_settings(settings: &Settings, default_endpoint: &str) -> String {
    let endpoint = match settings.endpoint() {
        Some(endpoint) => endpoint.to_string(),
        None => format!("{} (default)", default_endpoint),
    };
    let api_key = settings
        .api_key()
        .map(mask_secret)
        .unwrap_or_else(|| "(not set)".to_string());

    format!("endpoint: {}\napi key:  {}", endpoint, api_key)
}

/// Shows only the last four characters of a credential.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
