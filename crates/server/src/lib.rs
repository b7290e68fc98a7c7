//! # shelfkeep-server
//!
//! The HTTP face of the inventory assistant: a small axum service exposing
//! the master orchestrator over `POST /chat`, with sessions kept in process
//! and archived to long-term memory after every interaction.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;

use crate::config::AppConfig;
use crate::router::create_router;
use crate::state::build_app_state;
use tracing::{debug, info};

/// The main entry point for running the server.
pub async fn run(listener: tokio::net::TcpListener, config: AppConfig) -> anyhow::Result<()> {
    debug!(?config, "Server configuration loaded");

    let app_state = build_app_state(config).await?;
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
