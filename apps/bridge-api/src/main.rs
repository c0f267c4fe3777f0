//! # Channel Bridge API
//!
//! HTTP service bridging a PMS and an OTA channel manager.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Bridge API Server                             │
//! │                                                                         │
//! │  Channel Mgr ───► webhook ──► BookingReconciler ──► SQLite              │
//! │  PMS ───────────► /sync/*  ──► sync_queue ────────► SQLite              │
//! │                                                        │                │
//! │                   Supervisor (sync / retry / housekeeping) ──► CM API   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bridge_db::{Database, DbConfig};
use bridge_sync::{BookingReconciler, Supervisor, SyncConfig};

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Channel Bridge API server...");

    // Load configuration
    let api_config = ApiConfig::load()?;
    let sync_config = SyncConfig::load()?;
    info!(
        port = api_config.port,
        db = %api_config.database_path,
        channel = %sync_config.channel,
        "Configuration loaded"
    );

    // Open database and run migrations
    let db = Database::new(DbConfig::new(&api_config.database_path)).await?;
    info!("Database ready");

    // Start background tasks
    let mut supervisor = Supervisor::new(db.clone(), sync_config.clone());
    supervisor.start()?;

    // Build shared state and routes
    let reconciler = BookingReconciler::new(db.clone(), &sync_config.channel);
    let state = AppState::new(db.clone(), reconciler, api_config.clone());
    let app = routes::router(state);

    // Serve
    let addr: SocketAddr = format!("0.0.0.0:{}", api_config.port).parse()?;
    info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background tasks, then release the database
    supervisor.shutdown().await;
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
