//! Recommendation HTTP server.
//!
//! Configured entirely through environment variables (see `server::config`).
//! The engine is built on the first request, not at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{serve, AppState, ArtifactEngineLoader, EngineCell, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,server=debug")),
        )
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    info!(
        "Starting recommendation server (artifacts: {}, max_k: {})",
        config.location, config.max_k
    );

    let cell = EngineCell::new(ArtifactEngineLoader::new(config.location.clone()));
    let state = AppState::new(Arc::new(cell), config.max_k);

    serve(state, &config.bind_addr).await
}
