// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: a Redis-style key-value store reached over REST.
//!
//! The store is the only state shared between invocations. Every operation is
//! a single round trip touching a single key.

pub mod credentials;
pub mod memory;
pub mod rest;

pub use credentials::CredentialStore;
pub use memory::MemoryKvStore;
pub use rest::RestKvStore;

use crate::config::Config;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Key names as constants.
pub mod keys {
    /// Current access/refresh token pair (JSON).
    pub const TOKENS: &str = "whoop:tokens";
    /// Last published snapshot (JSON).
    pub const SNAPSHOT: &str = "whoop:data";
    /// Single-flight guard around token rotation.
    pub const REFRESH_LOCK: &str = "whoop:refresh_lock";
}

/// Minimal key-value contract the service needs.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a key. `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Overwrite a key with no expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Set a key only if it does not exist, expiring after `ttl`.
    /// Returns whether the key was set.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, AppError>;

    /// Delete a key only if it currently holds `value`.
    /// Returns whether the key was deleted.
    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, AppError>;
}

/// Shared store handle.
pub type SharedKvStore = Arc<dyn KvStore>;

/// Build the store selected by configuration.
pub fn connect(config: &Config) -> Result<SharedKvStore, AppError> {
    if config.kv_rest_api_url.starts_with("memory://") {
        tracing::warn!("Using in-process key-value store; state will not survive restarts");
        return Ok(Arc::new(MemoryKvStore::new()));
    }

    let store = RestKvStore::new(
        &config.kv_rest_api_url,
        &config.kv_rest_api_token,
        config.http_timeout,
    )?;
    tracing::info!(url = %config.kv_rest_api_url, "Using REST key-value store");
    Ok(Arc::new(store))
}
