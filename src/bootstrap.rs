// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time interactive authorization.
//!
//! A local server that sends the operator's browser to the WHOOP consent page
//! and, on the redirect back, exchanges the code for the first token pair and
//! seeds the Credential Store with it.

use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::TokenPair;
use crate::services::WhoopClient;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

/// Scopes requested at authorization. `offline` is what yields a refresh token.
pub const SCOPES: &[&str] = &[
    "read:recovery",
    "read:cycles",
    "read:workout",
    "read:sleep",
    "read:profile",
    "read:body_measurement",
    "offline",
];

/// Opaque `state` round-tripped through the consent page.
pub const AUTH_STATE: &str = "whoopauth";

/// State for the bootstrap server.
pub struct BootstrapState {
    pub client: WhoopClient,
    pub store: CredentialStore,
    pub redirect_uri: String,
    /// Optional dotenv file that also receives the tokens.
    pub env_file: Option<PathBuf>,
    /// Notified once tokens are stored, so the server can exit.
    pub done: Arc<Notify>,
}

pub fn routes(state: Arc<BootstrapState>) -> Router {
    Router::new()
        .route("/callback", get(callback))
        .fallback(start)
        .with_state(state)
}

/// Any path other than the callback starts the flow.
async fn start(State(state): State<Arc<BootstrapState>>) -> Redirect {
    Redirect::to(
        &state
            .client
            .authorize_url(&state.redirect_uri, SCOPES, AUTH_STATE),
    )
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(state): State<Arc<BootstrapState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<&'static str>, AppError> {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!(error = ?params.error, "Callback without authorization code");
        return Err(AppError::BadRequest("Missing code parameter".to_string()));
    };

    seed_tokens(&state, &code).await?;
    state.done.notify_one();
    Ok(Html("<h1>Done! Tokens saved. You can close this tab.</h1>"))
}

async fn seed_tokens(state: &BootstrapState, code: &str) -> Result<(), AppError> {
    let response = state.client.exchange_code(code, &state.redirect_uri).await?;

    let tokens = TokenPair {
        access_token: response.access_token.unwrap_or_default(),
        refresh_token: response.refresh_token.ok_or_else(|| {
            AppError::RefreshFailed("response lacks refresh_token; was the offline scope granted?".to_string())
        })?,
    };

    state.store.save(&tokens).await?;
    tracing::info!(expires_in = ?response.expires_in, "Initial tokens stored");

    if let Some(path) = &state.env_file {
        update_env_file(path, &tokens)
            .await
            .map_err(|e| AppError::Internal(e.context(format!("writing {}", path.display()))))?;
        tracing::info!(path = %path.display(), "Tokens written to env file");
    }

    Ok(())
}

/// Replace or append the token variables in a dotenv file.
pub async fn update_env_file(path: &Path, tokens: &TokenPair) -> anyhow::Result<()> {
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let updated = set_env_var(&existing, "WHOOP_ACCESS_TOKEN", &tokens.access_token);
    let updated = set_env_var(&updated, "WHOOP_REFRESH_TOKEN", &tokens.refresh_token);

    tokio::fs::write(path, updated).await?;
    Ok(())
}

fn set_env_var(content: &str, name: &str, value: &str) -> String {
    let prefix = format!("{}=", name);
    let mut found = false;

    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&prefix) {
                found = true;
                format!("{}{}", prefix, value)
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(format!("{}{}", prefix, value));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
