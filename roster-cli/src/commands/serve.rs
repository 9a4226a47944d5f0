//! `roster serve`: run the HTTP API

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use roster_core::{Config, Store};
use roster_db::Database;

use crate::api::{self, AppState};

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and env)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// SQLite database file (overrides config and env)
    #[arg(long)]
    pub database: Option<PathBuf>,
}

impl ServeArgs {
    /// Open the database, check it, and serve until Ctrl-C
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = Database::connect(&config.database)
            .await
            .with_context(|| {
                format!("Failed to open database at {}", config.database.path.display())
            })?;
        db.ping().await.context("Database health check failed")?;

        let app = api::router(AppState::new(Arc::new(db)));

        let listener = tokio::net::TcpListener::bind(config.server.bind)
            .await
            .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

        tracing::info!(addr = %config.server.bind, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
