// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (client secret, KV token, cron secret, bootstrap refresh token) are
//! injected as environment variables by the deployment and read once at startup.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default WHOOP API host.
pub const DEFAULT_WHOOP_API_BASE: &str = "https://api.prod.whoop.com";

/// Default refresh lock lifetime, above twice the default HTTP timeout.
pub const DEFAULT_REFRESH_LOCK_TTL_SECS: u64 = 90;

/// Largest page size the WHOOP collection endpoints accept.
pub const MAX_PAGE_LIMIT: u32 = 25;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// WHOOP OAuth client ID
    pub whoop_client_id: String,
    /// WHOOP API base URL (no trailing slash)
    pub whoop_api_base: String,
    /// Redirect URI registered for the bootstrap authorization flow
    pub whoop_redirect_uri: String,
    /// KV REST endpoint (`memory://` selects the in-process store)
    pub kv_rest_api_url: String,
    /// Origin of the display page, allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
    /// Page size used when paginating collections
    pub page_limit: u32,
    /// Hard cap on records accumulated per paginated collection
    pub max_records: usize,
    /// Number of workouts included in a scheduled snapshot
    pub workout_limit: u32,
    /// Lifetime of the refresh lock key
    pub refresh_lock_ttl: Duration,
    /// How long a cycle waits for another cycle's refresh to finish
    pub refresh_lock_wait: Duration,

    // --- Secrets ---
    /// WHOOP OAuth client secret
    pub whoop_client_secret: String,
    /// Operator-provisioned refresh token used when the store holds none
    pub bootstrap_refresh_token: Option<String>,
    /// KV REST bearer token
    pub kv_rest_api_token: String,
    /// Shared secret the scheduler presents to the trigger endpoint
    pub cron_secret: String,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            whoop_client_id: "test_client_id".to_string(),
            whoop_api_base: "http://127.0.0.1:9".to_string(),
            whoop_redirect_uri: "http://localhost:3000/callback".to_string(),
            kv_rest_api_url: "memory://".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            http_timeout: Duration::from_secs(5),
            page_limit: MAX_PAGE_LIMIT,
            max_records: 100,
            workout_limit: 25,
            refresh_lock_ttl: Duration::from_secs(30),
            refresh_lock_wait: Duration::from_secs(2),
            whoop_client_secret: "test_secret".to_string(),
            bootstrap_refresh_token: None,
            kv_rest_api_token: "test_kv_token".to_string(),
            cron_secret: "test_cron_secret".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let page_limit: u32 = parse_or("WHOOP_PAGE_LIMIT", MAX_PAGE_LIMIT)?;
        if page_limit == 0 || page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid(
                "WHOOP_PAGE_LIMIT",
                format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }

        let max_records: usize = parse_or("WHOOP_MAX_RECORDS", 100)?;
        if max_records == 0 {
            return Err(ConfigError::Invalid(
                "WHOOP_MAX_RECORDS",
                "must be at least 1".to_string(),
            ));
        }

        let workout_limit: u32 = parse_or("WHOOP_WORKOUT_LIMIT", MAX_PAGE_LIMIT)?;
        if workout_limit == 0 || workout_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid(
                "WHOOP_WORKOUT_LIMIT",
                format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }

        let config = Self {
            whoop_client_id: required("WHOOP_CLIENT_ID")?,
            whoop_api_base: env::var("WHOOP_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_WHOOP_API_BASE.to_string()),
            whoop_redirect_uri: env::var("WHOOP_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:3000/callback".to_string()),
            kv_rest_api_url: required("KV_REST_API_URL")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 30)?),
            page_limit,
            max_records,
            workout_limit,
            refresh_lock_ttl: Duration::from_secs(parse_or(
                "REFRESH_LOCK_TTL_SECS",
                DEFAULT_REFRESH_LOCK_TTL_SECS,
            )?),
            refresh_lock_wait: Duration::from_secs(parse_or("REFRESH_LOCK_WAIT_SECS", 10)?),

            whoop_client_secret: required("WHOOP_CLIENT_SECRET")?,
            bootstrap_refresh_token: env::var("WHOOP_REFRESH_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            kv_rest_api_token: required("KV_REST_API_TOKEN")?,
            cron_secret: required("CRON_SECRET")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks.
    ///
    /// The refresh lock must outlive the token exchange it guards. The
    /// exchange is bounded by `http_timeout`, so the lock TTL has to exceed
    /// twice that; otherwise a second cycle can take an expired lock and spend
    /// the refresh token that is still in flight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_lock_ttl <= self.http_timeout * 2 {
            return Err(ConfigError::Invalid(
                "REFRESH_LOCK_TTL_SECS",
                format!(
                    "must be more than twice HTTP_TIMEOUT_SECS ({}s)",
                    self.http_timeout.as_secs()
                ),
            ));
        }
        Ok(())
    }
}

/// Read a required variable, trimmed.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse {:?}", raw))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
