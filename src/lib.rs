// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! WHOOP snapshot service
//!
//! Polls the WHOOP API on a schedule, rotating the single-use OAuth refresh
//! token through a durable key-value store, aggregates the results into one
//! snapshot document and serves it from the same store.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{CredentialStore, SharedKvStore};
use error::AppError;
use services::{Aggregator, SnapshotPublisher, TokenRefresher, WhoopClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub aggregator: Aggregator,
    pub publisher: SnapshotPublisher,
}

impl AppState {
    /// Wire every service over one key-value store.
    pub fn new(config: Config, kv: SharedKvStore) -> Result<Self, AppError> {
        let client = WhoopClient::from_config(&config)?;
        let refresher =
            TokenRefresher::from_config(&config, client.clone(), CredentialStore::new(kv.clone()));
        let aggregator = Aggregator::from_config(&config, client, refresher);

        Ok(Self {
            config,
            aggregator,
            publisher: SnapshotPublisher::new(kv),
        })
    }
}
