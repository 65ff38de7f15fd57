//! Web interface for the C programming assistant.
//!
//! Server-rendered login, signup, chat and history pages backed by SQLite
//! and the Gemini code generator.

mod config;
mod error;
mod routes;
mod session;
mod state;

use std::sync::Arc;

use database::Database;
use gemini_coder::GeminiCoder;
use tower_http::services::ServeDir;
use tower_sessions::cookie::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting assistant web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let coder = GeminiCoder::from_env()?;

    // Build application state
    let state = AppState::new(
        db.clone(),
        Arc::new(coder),
        Duration::minutes(config.session_idle_minutes),
    );

    // Build router
    let app = routes::router(state).nest_service("/static", ServeDir::new(&config.static_dir));

    // Start server
    info!(addr = %config.addr, "Assistant web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
