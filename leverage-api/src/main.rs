//! Leverage Gateway API Server
//!
//! HTTP and WebSocket façade in front of a leveraged-trading backend.

use leverage_api::config::DEFAULT_LOG_FILTER;
use leverage_api::{build_router, AppState, ServerConfig};
use leverage_services::{PlaceholderBackend, TrailingStopMonitor};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if the file doesn't exist
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting Leverage Gateway API");

    let config = ServerConfig::from_env()?;

    // No SDK client is wired up yet
    let state = AppState::new(Arc::new(PlaceholderBackend));

    // Start trailing stop monitor in background
    let monitor = TrailingStopMonitor::new(
        Arc::clone(&state.trade_service),
        config.trailing_stop_poll,
    );
    let monitor_handle = tokio::spawn(monitor.run());

    let app = build_router(state);

    let addr = config.socket_addr();
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
