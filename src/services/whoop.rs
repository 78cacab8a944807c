// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WHOOP API client.
//!
//! Handles:
//! - Token exchange (refresh-token and authorization-code grants)
//! - Authenticated resource reads, with 401 reported as a stale-token signal
//! - Bounded cursor pagination over collection endpoints

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Page, TokenResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Scope that makes the token endpoint issue a new refresh token.
const OFFLINE_SCOPE: &str = "offline";

/// Outcome of a resource read.
///
/// Only the token endpoint produces errors. Resource reads degrade instead, so
/// one flaky resource cannot block the rest of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    /// HTTP 401: the access token is stale.
    TokenExpired,
    /// Any other failure: non-success status, transport error, bad body.
    Unavailable(String),
}

impl<T> ApiResponse<T> {
    /// The payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            ApiResponse::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Ok(value) => ApiResponse::Ok(f(value)),
            ApiResponse::TokenExpired => ApiResponse::TokenExpired,
            ApiResponse::Unavailable(reason) => ApiResponse::Unavailable(reason),
        }
    }

    /// The payload, or a `ResourceUnavailable` describing why there is none.
    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            ApiResponse::Ok(value) => Ok(value),
            ApiResponse::TokenExpired => Err(AppError::ResourceUnavailable(
                "access token rejected".to_string(),
            )),
            ApiResponse::Unavailable(reason) => Err(AppError::ResourceUnavailable(reason)),
        }
    }
}

/// WHOOP API client.
#[derive(Clone)]
pub struct WhoopClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl WhoopClient {
    /// Create a new client with OAuth credentials.
    pub fn new(
        base_url: &str,
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            &config.whoop_api_base,
            config.whoop_client_id.clone(),
            config.whoop_client_secret.clone(),
            config.http_timeout,
        )
    }

    fn token_url(&self) -> String {
        format!("{}/oauth/oauth2/token", self.base_url)
    }

    /// Browser URL that starts the authorization-code flow.
    pub fn authorize_url(&self, redirect_uri: &str, scopes: &[&str], state: &str) -> String {
        format!(
            "{}/oauth/oauth2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(state),
        )
    }

    // ─── OAuth ───────────────────────────────────────────────────────────────

    /// Exchange a refresh token for a new access/refresh pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", OFFLINE_SCOPE),
        ])
        .await
    }

    /// Exchange an authorization code for the initial token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// POST a token grant. Any response without an access token is a failure,
    /// whatever its status, and carries the raw body.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(self.token_url())
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::RefreshFailed(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::RefreshFailed(format!(
                "HTTP {}: failed to read response body: {}",
                status, e
            ))
        })?;

        let tokens: TokenResponse = serde_json::from_str(&body).unwrap_or_default();
        if tokens.access_token.as_deref().map_or(true, str::is_empty) {
            tracing::error!(status = %status, body = %body, "WHOOP token request rejected");
            return Err(AppError::RefreshFailed(format!("HTTP {}: {}", status, body)));
        }

        Ok(tokens)
    }

    // ─── Resources ───────────────────────────────────────────────────────────

    /// Authenticated GET of a developer API path (e.g. `/v2/cycle`).
    pub async fn get<T: DeserializeOwned>(&self, path: &str, access_token: &str) -> ApiResponse<T> {
        self.get_with_query(path, access_token, &[]).await
    }

    /// Fetch a single page of a collection.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> ApiResponse<Page<T>> {
        let limit = limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            query.push(("nextToken", cursor));
        }
        self.get_with_query(path, access_token, &query).await
    }

    /// Fetch a collection page by page until the cursor runs out or
    /// `max_records` have been accumulated.
    ///
    /// Never returns more than `max_records` records and never fetches more
    /// than `ceil(max_records / page_limit) + 1` pages. Any failed page fails
    /// the whole collection.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        page_limit: u32,
        max_records: usize,
    ) -> ApiResponse<Vec<T>> {
        let page_limit = page_limit.max(1);
        let max_pages = max_records.div_ceil(page_limit as usize) + 1;

        let mut records: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let page: Page<T> = match self
                .get_page(path, access_token, page_limit, cursor.as_deref())
                .await
            {
                ApiResponse::Ok(page) => page,
                ApiResponse::TokenExpired => return ApiResponse::TokenExpired,
                ApiResponse::Unavailable(reason) => {
                    return ApiResponse::Unavailable(format!(
                        "{} page {}: {}",
                        path,
                        pages + 1,
                        reason
                    ))
                }
            };
            pages += 1;
            records.extend(page.records);

            cursor = page.next_token.filter(|t| !t.is_empty());
            if cursor.is_none() || records.len() >= max_records {
                break;
            }
            if pages >= max_pages {
                tracing::warn!(path, pages, "Pagination page cap reached");
                break;
            }
        }

        records.truncate(max_records);
        tracing::debug!(path, pages, records = records.len(), "Collection fetched");
        ApiResponse::Ok(records)
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> ApiResponse<T> {
        let url = format!("{}/developer{}", self.base_url, path);

        let response = match self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return ApiResponse::Unavailable(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ApiResponse::TokenExpired;
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return ApiResponse::Unavailable(format!("HTTP {}: {}", status, body));
        }

        match response.bytes().await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => ApiResponse::Ok(value),
                Err(e) => ApiResponse::Unavailable(format!("JSON parse error: {}", e)),
            },
            Err(e) => ApiResponse::Unavailable(format!("failed to read body: {}", e)),
        }
    }
}
