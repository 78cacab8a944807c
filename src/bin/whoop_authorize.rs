// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bootstrap authorization: run locally once to obtain the first token pair.
//!
//! Open http://localhost:3000 in a browser, approve access, and the tokens are
//! stored in the configured key-value store (and in `WHOOP_ENV_FILE`, if set).

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use whoop_snapshot::{
    bootstrap::{self, BootstrapState},
    config::Config,
    db::{self, CredentialStore},
    logging,
    services::WhoopClient,
};

const LISTEN_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let kv = db::connect(&config)?;

    let done = Arc::new(Notify::new());
    let state = Arc::new(BootstrapState {
        client: WhoopClient::from_config(&config)?,
        store: CredentialStore::new(kv),
        redirect_uri: config.whoop_redirect_uri.clone(),
        env_file: std::env::var("WHOOP_ENV_FILE").ok().map(PathBuf::from),
        done: done.clone(),
    });

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!(
        url = %format!("http://localhost:{}", listener.local_addr()?.port()),
        "Open this URL in your browser to authorize WHOOP"
    );

    axum::serve(listener, bootstrap::routes(state))
        .with_graceful_shutdown(async move {
            done.notified().await;
            // Let the confirmation page reach the browser.
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        })
        .await?;

    tracing::info!("Authorization complete");
    Ok(())
}
