use anyhow::Result;
use clap::Parser;
use salla_agent_relay::{
    bridge::{AgentBridge, BridgeConfig, DEFAULT_ENDPOINT, FileSettingsStore, SettingsStore},
    cli::{Cli, Commands, SettingsCommand, describe_settings, update_settings},
    config, server,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve().await,
        Commands::Ask {
            message,
            origin,
            timeout_secs,
        } => ask(cli.settings, message.join(" "), origin, timeout_secs).await,
        Commands::Settings { action } => settings(cli.settings, action),
    }
}

async fn serve() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Determine log level: environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&log_level))
        .json()
        .init();

    info!("Starting Salla agent relay with log level: {}", log_level);
    info!("Configuration loaded successfully");

    server::run(config).await?;

    Ok(())
}

async fn ask(settings_path: PathBuf, message: String, origin: String, timeout_secs: u64) -> Result<()> {
    init_cli_logging()?;

    let bridge = AgentBridge::new(
        Arc::new(FileSettingsStore::new(settings_path)),
        BridgeConfig {
            origin,
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        },
    );

    match bridge.send(&message).await {
        Ok(response) => {
            println!("{}", response.output_text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn settings(settings_path: PathBuf, action: SettingsCommand) -> Result<()> {
    init_cli_logging()?;

    let store = FileSettingsStore::new(settings_path);

    match action {
        SettingsCommand::Show => {}
        SettingsCommand::Set { endpoint, api_key } => {
            store.save(&update_settings(store.load(), endpoint, api_key))?;
            println!("Settings saved to {}", store.path().display());
        }
        SettingsCommand::Clear => {
            store.clear()?;
            println!("Settings cleared");
        }
    }

    println!("{}", describe_settings(&store.load(), DEFAULT_ENDPOINT));
    Ok(())
}

/// Human-readable logs on stderr so stdout carries only the reply.
fn init_cli_logging() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    validate_log_level(&log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&log_level))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
