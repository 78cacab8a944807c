// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for the scheduled refresh trigger.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <CRON_SECRET>`.
///
/// Runs before the handler, so a rejected request has no side effects.
pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if !secret_matches(presented, &state.config.cron_secret) {
        tracing::warn!(
            has_header = presented.is_some(),
            "Blocked refresh trigger with invalid secret"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

fn secret_matches(header_value: Option<&str>, secret: &str) -> bool {
    // An unset secret must never match an empty bearer.
    if secret.is_empty() {
        return false;
    }
    let expected = format!("Bearer {}", secret);
    header_value.is_some_and(|v| bool::from(v.as_bytes().ct_eq(expected.as_bytes())))
}
