//! # webchat
//!
//! Minimal multi-user web chat server.
//!
//! This binary provides:
//! - **Registration**: a display name bound to the caller's IP address via a
//!   long-lived `username` cookie
//! - **Chat**: posting short text messages and polling the full message log
//! - **Persistence** (optional): periodic flushes of the log to a JSON file,
//!   restored at startup
//! - **Pages and static assets** served from configurable directories, over
//!   plain HTTP or TLS

mod api;
mod config;
mod error;
mod message_log;
mod pages;
mod persist;
mod registry;
mod session;
mod state;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::{Cli, ServerConfig};
use crate::persist::PersistenceScheduler;
use crate::state::ChatState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,webchat=debug")),
        )
        .init();

    info!("Starting webchat v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Resolve configuration (flags, then config file overrides)
    // -----------------------------------------------------------------------
    let config = ServerConfig::resolve(Cli::parse()).await?;
    info!(?config, "Loaded configuration");
    info!(
        port = config.port,
        ssl = config.ssl,
        persist = config.persist,
        get_clients_endpoint = config.get_clients,
        "Instance settings"
    );

    let chat = ChatState::new();

    // -----------------------------------------------------------------------
    // 3. Restore and schedule persistence
    // -----------------------------------------------------------------------
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let persistence = if config.persist {
        let mut scheduler = PersistenceScheduler::new(chat.clone(), &config)?;
        scheduler.restore_on_startup().await;
        info!(watermark = scheduler.watermark(), "Persistence ready");
        Some(tokio::spawn(scheduler.run(shutdown_rx)))
    } else {
        None
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let app_state = AppState::new(chat.clone(), config);

    tokio::select! {
        result = api::serve(app_state) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    // -----------------------------------------------------------------------
    // 5. Final flush
    // -----------------------------------------------------------------------
    if let Some(handle) = persistence {
        let _ = shutdown_tx.send(true);
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Persistence task ended abnormally");
        }
    }
    info!(messages = chat.message_count().await, "Stopped");

    Ok(())
}
