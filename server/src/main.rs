//! Forum Server - Main Entry Point
//!
//! Community forum backend.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use forum_server::{api, auth::HeaderIdentity, clock::SystemClock, config, store::MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        trending_window_days = config.trending_window_days,
        trending_ttl_secs = config.trending_ttl_secs,
        "Starting Forum Server"
    );

    // Build application state
    let state = api::AppState::new(
        config.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
        Arc::new(HeaderIdentity),
    );

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
