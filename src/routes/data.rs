// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read path for the published snapshot.
//!
//! Never triggers a refresh: it only reads what the last cycle published.

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Fresh for five minutes; a stale copy may be served for ten more while a
/// revalidation happens. Cycles run less often than the page is read.
pub const SNAPSHOT_CACHE_CONTROL: &str = "s-maxage=300, max-age=300, stale-while-revalidate=600";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/whoop-data", get(get_snapshot))
}

async fn get_snapshot(State(state): State<Arc<AppState>>) -> Result<Response> {
    let snapshot: Snapshot = state
        .publisher
        .load()
        .await?
        .ok_or_else(|| AppError::NotFound("No data yet".to_string()))?;

    Ok((
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(SNAPSHOT_CACHE_CONTROL),
        )],
        Json(snapshot),
    )
        .into_response())
}
