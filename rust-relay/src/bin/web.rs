//! LINE relay web server.
//!
//! This binary provides a thin, fast web server that:
//! - Answers verification probes from the messaging platform
//! - Acknowledges webhook deliveries with 200 OK immediately
//! - Relays each payload to the configured collector in the background
//!
//! On shutdown the server stops accepting connections, then waits for
//! in-flight deliveries up to `SHUTDOWN_GRACE_MS`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use line_relay::{build_router, AppState, BackgroundTasks, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        downstream_configured = config.downstream_url.is_some(),
        signature_header = %config.signature_header,
        max_redirects = config.max_redirects,
        hop_timeout_ms = config.hop_timeout_ms,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    if let Err(e) = config.downstream_url() {
        // Probes still succeed; POSTs will get 500 until this is fixed.
        warn!(error = %e, "downstream_url_unusable");
    }

    let grace = config.shutdown_grace();
    let port = config.port;

    let tasks = BackgroundTasks::new();
    let state = AppState::new(config, tasks.clone())?;
    let app = build_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let detached deliveries finish
    tasks.drain(grace).await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
