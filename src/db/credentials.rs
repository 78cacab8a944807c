// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable token pair storage.

use super::{keys, SharedKvStore};
use crate::error::AppError;
use crate::models::TokenPair;
use std::time::Duration;

/// Credential Store: the token pair lives under a single key, so a rotation
/// replaces access and refresh token in one all-or-nothing write.
#[derive(Clone)]
pub struct CredentialStore {
    kv: SharedKvStore,
}

impl CredentialStore {
    pub fn new(kv: SharedKvStore) -> Self {
        Self { kv }
    }

    /// Read the stored token pair.
    pub async fn load(&self) -> Result<Option<TokenPair>, AppError> {
        let Some(raw) = self.kv.get(keys::TOKENS).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Store(format!("Stored token pair is corrupt: {}", e)))
    }

    /// Replace the stored token pair.
    pub async fn save(&self, tokens: &TokenPair) -> Result<(), AppError> {
        let raw = serde_json::to_string(tokens)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode tokens: {}", e)))?;
        self.kv.set(keys::TOKENS, &raw).await
    }

    /// Try to take the refresh lock for `owner`.
    pub async fn try_lock_refresh(&self, owner: &str, ttl: Duration) -> Result<bool, AppError> {
        self.kv.set_nx_ex(keys::REFRESH_LOCK, owner, ttl).await
    }

    /// Release the refresh lock if `owner` still holds it.
    pub async fn unlock_refresh(&self, owner: &str) -> Result<bool, AppError> {
        self.kv.delete_if_equals(keys::REFRESH_LOCK, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KvStore, MemoryKvStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_save_then_load() {
        let store = CredentialStore::new(Arc::new(MemoryKvStore::new()));
        assert!(store.load().await.unwrap().is_none());

        let pair = TokenPair {
            access_token: "a1".to_string(),
            refresh_token: "r1".to_string(),
        };
        store.save(&pair).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(pair));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_store_error() {
        let kv = MemoryKvStore::new();
        kv.set(keys::TOKENS, "not json").await.unwrap();

        let store = CredentialStore::new(Arc::new(kv));
        assert!(matches!(store.load().await, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_refresh_lock_is_exclusive() {
        let store = CredentialStore::new(Arc::new(MemoryKvStore::new()));
        let ttl = Duration::from_secs(30);

        assert!(store.try_lock_refresh("one", ttl).await.unwrap());
        assert!(!store.try_lock_refresh("two", ttl).await.unwrap());
        assert!(!store.unlock_refresh("two").await.unwrap());
        assert!(store.unlock_refresh("one").await.unwrap());
        assert!(store.try_lock_refresh("two", ttl).await.unwrap());
    }
}
