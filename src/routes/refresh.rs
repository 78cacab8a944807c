// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled refresh trigger.
//!
//! Called by the external cron scheduler, authenticated by the shared secret
//! middleware applied in routes/mod.rs.

use crate::error::Result;
use crate::services::{SnapshotScope, TokenMode};
use crate::time_utils;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Trigger routes. GET is what the scheduler sends; POST is accepted for
/// manual runs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/whoop-refresh", get(run_cycle).post(run_cycle))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub ok: bool,
    #[serde(with = "time_utils::rfc3339_millis")]
    pub fetched_at: DateTime<Utc>,
}

/// Rotate tokens, aggregate, publish.
async fn run_cycle(State(state): State<Arc<AppState>>) -> Result<Json<RefreshResponse>> {
    let snapshot = state
        .aggregator
        .run(TokenMode::AlwaysRefresh, SnapshotScope::Latest)
        .await?;

    state.publisher.publish(&snapshot).await?;

    Ok(Json(RefreshResponse {
        ok: true,
        fetched_at: snapshot.fetched_at,
    }))
}
