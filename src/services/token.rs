// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh-token rotation.
//!
//! WHOOP refresh tokens are single-use: every exchange invalidates the token it
//! consumed. Two cycles refreshing with the same stored token would leave one
//! of them holding a dead token, so rotation runs under a lock key in the same
//! store that holds the tokens.

use crate::config::Config;
use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::TokenPair;
use crate::services::whoop::WhoopClient;
use ring::rand::{SecureRandom, SystemRandom};
use std::time::Duration;

/// Interval between lock acquisition attempts.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Obtains fresh access tokens and persists rotated credentials.
#[derive(Clone)]
pub struct TokenRefresher {
    client: WhoopClient,
    store: CredentialStore,
    /// Operator-provisioned fallback when the store holds no tokens.
    bootstrap_refresh_token: Option<String>,
    lock_ttl: Duration,
    lock_wait: Duration,
}

impl TokenRefresher {
    pub fn new(
        client: WhoopClient,
        store: CredentialStore,
        bootstrap_refresh_token: Option<String>,
        lock_ttl: Duration,
        lock_wait: Duration,
    ) -> Self {
        Self {
            client,
            store,
            bootstrap_refresh_token,
            lock_ttl,
            lock_wait,
        }
    }

    pub fn from_config(config: &Config, client: WhoopClient, store: CredentialStore) -> Self {
        Self::new(
            client,
            store,
            config.bootstrap_refresh_token.clone(),
            config.refresh_lock_ttl,
            config.refresh_lock_wait,
        )
    }

    /// Access token currently in the store, without refreshing.
    pub async fn stored_access_token(&self) -> Result<Option<String>, AppError> {
        Ok(self.store.load().await?.map(|t| t.access_token))
    }

    /// Rotate the token pair and return the new access token.
    ///
    /// If another cycle rotates while this one waits for the lock, its result
    /// is used instead of exchanging again.
    pub async fn refresh(&self) -> Result<String, AppError> {
        let before = self.store.load().await?;
        let owner = lock_owner_id()?;

        let waited = self.acquire_lock(&owner).await?;
        let result = self.refresh_locked(before, waited).await;

        match self.store.unlock_refresh(&owner).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Refresh lock expired before release"),
            Err(e) => tracing::warn!(error = %e, "Failed to release refresh lock"),
        }

        result
    }

    async fn refresh_locked(
        &self,
        before: Option<TokenPair>,
        waited: bool,
    ) -> Result<String, AppError> {
        let current = self.store.load().await?;

        if waited {
            if let (Some(before), Some(current)) = (&before, &current) {
                if before.refresh_token != current.refresh_token {
                    tracing::info!("Tokens rotated by a concurrent cycle, reusing them");
                    return Ok(current.access_token.clone());
                }
            }
        }

        let refresh_token = match current {
            Some(tokens) => tokens.refresh_token,
            None => {
                tracing::info!("No stored tokens, using bootstrap refresh token");
                self.bootstrap_refresh_token
                    .clone()
                    .ok_or(AppError::NoCredential)?
            }
        };

        self.exchange(&refresh_token).await
    }

    /// Exchange `refresh_token` upstream and persist the new pair.
    ///
    /// The store is written before the access token is handed back, so a crash
    /// after use cannot leave the store holding a consumed refresh token. A
    /// rejected exchange leaves the store untouched.
    pub async fn exchange(&self, refresh_token: &str) -> Result<String, AppError> {
        let response = self.client.refresh_token(refresh_token).await?;

        let access_token = response
            .access_token
            .ok_or_else(|| AppError::RefreshFailed("response lacks access_token".to_string()))?;

        let new_refresh_token = match response.refresh_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                tracing::warn!("Token response carried no refresh token, keeping the current one");
                refresh_token.to_string()
            }
        };

        self.store
            .save(&TokenPair {
                access_token: access_token.clone(),
                refresh_token: new_refresh_token,
            })
            .await?;

        tracing::info!(expires_in = ?response.expires_in, "Tokens rotated and stored");
        Ok(access_token)
    }

    /// Take the refresh lock. Returns whether another holder had to be waited out.
    async fn acquire_lock(&self, owner: &str) -> Result<bool, AppError> {
        let deadline = tokio::time::Instant::now() + self.lock_wait;
        let mut waited = false;

        loop {
            if self.store.try_lock_refresh(owner, self.lock_ttl).await? {
                return Ok(waited);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::RefreshFailed(
                    "timed out waiting for a concurrent token refresh".to_string(),
                ));
            }

            if !waited {
                tracing::info!("Token refresh already in progress, waiting");
                waited = true;
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
    }
}

/// Random lock owner id.
fn lock_owner_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_owner_ids_are_unique() {
        let a = lock_owner_id().unwrap();
        let b = lock_owner_id().unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
