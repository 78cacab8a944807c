// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WHOOP snapshot API server
//!
//! Serves the published snapshot and the scheduled refresh trigger.

use anyhow::Context;
use std::sync::Arc;
use whoop_snapshot::{config::Config, db, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting WHOOP snapshot API");

    let kv = db::connect(&config)?;
    let state = Arc::new(AppState::new(config.clone(), kv)?);

    // Build router
    let app = whoop_snapshot::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
