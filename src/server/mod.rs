mod error;
pub mod handlers;
pub mod types;

pub use error::{INPUT_REQUIRED, RelayError};
pub use handlers::AppState;

use crate::{
    Result,
    config::Config,
    llm::build_backend,
    protocol::{AGENT_ROUTE, ALLOWED_HEADERS, ALLOWED_METHODS, ALLOWED_ORIGIN},
};
use axum::{
    Router,
    http::{HeaderValue, header},
    routing::any,
};
use std::net::SocketAddr;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Builds the relay router. Every response carries the CORS headers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(AGENT_ROUTE, any(handlers::agent))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOWED_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let backend = build_backend(&config.llm)?;

    if config.llm.api_key.is_none() {
        warn!("No model-serving API key configured; agent requests will fail until OPENAI_API_KEY is set");
    }

    let app = router(AppState::new(&config, backend));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!(
        "Starting relay on {} ({:?} environment)",
        addr, config.server.environment
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
