// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redis-compatible REST store client.
//!
//! Each command is sent as a JSON array (`["SET", "key", "value"]`) in the body
//! of a POST to the store URL, authenticated with a bearer token. Replies are
//! `{"result": ...}` on success or `{"error": "..."}` on failure.

use super::KvStore;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Compare-and-delete, so a lock is only released by its owner.
const DELETE_IF_EQUALS_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// REST key-value store client.
#[derive(Clone)]
pub struct RestKvStore {
    http: reqwest::Client,
    url: String,
    token: String,
}

/// Reply envelope.
#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

impl RestKvStore {
    /// Create a client for the store at `url`.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Store(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Send one command and return its `result`.
    async fn command(&self, args: &[&str]) -> Result<Value, AppError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("{} request failed: {}", args[0], e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Store(format!(
                "{} failed with HTTP {}: failed to read response body: {}",
                args[0], status, e
            ))
        })?;

        let reply: CommandReply = serde_json::from_str(&body).map_err(|_| {
            AppError::Store(format!("{} failed with HTTP {}: {}", args[0], status, body))
        })?;

        if let Some(error) = reply.error {
            return Err(AppError::Store(format!("{} failed: {}", args[0], error)));
        }
        if !status.is_success() {
            return Err(AppError::Store(format!(
                "{} failed with HTTP {}: {}",
                args[0], status, body
            )));
        }

        Ok(reply.result)
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(AppError::Store(format!(
                "GET {} returned a non-string value: {}",
                key, other
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        match self.command(&["SET", key, value]).await? {
            Value::String(ref s) if s == "OK" => Ok(()),
            other => Err(AppError::Store(format!(
                "SET {} was not acknowledged: {}",
                key, other
            ))),
        }
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, AppError> {
        let ttl_secs = ttl.as_secs().max(1).to_string();
        let result = self
            .command(&["SET", key, value, "NX", "EX", &ttl_secs])
            .await?;
        // SET ... NX replies "OK" when the key was set, nil otherwise.
        Ok(!result.is_null())
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, AppError> {
        let result = self
            .command(&["EVAL", DELETE_IF_EQUALS_SCRIPT, "1", key, value])
            .await?;
        Ok(result.as_i64() == Some(1))
    }
}
