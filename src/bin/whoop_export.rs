// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Manual export: aggregate the full history once and write it to a static
//! JSON file the display page can load without the API.
//!
//! Usage: `whoop-export [OUTPUT]` (default `public/whoop-data.json`).

use anyhow::Context;
use std::path::PathBuf;
use whoop_snapshot::{
    config::Config,
    db, logging,
    services::{export_to_file, SnapshotScope, TokenMode},
    AppState,
};

const DEFAULT_OUTPUT: &str = "public/whoop-data.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let config = Config::from_env().context("Failed to load configuration")?;
    let kv = db::connect(&config)?;
    let state = AppState::new(config, kv)?;

    let snapshot = state
        .aggregator
        .run(TokenMode::ProbeFirst, SnapshotScope::Full)
        .await?;

    export_to_file(&snapshot, &output)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = snapshot.summary();
    tracing::info!(
        path = %output.display(),
        recovery_score = ?summary.recovery_score,
        hrv_rmssd_milli = ?summary.hrv_rmssd_milli,
        resting_heart_rate = ?summary.resting_heart_rate,
        workouts = summary.workouts,
        sleeps = ?summary.sleeps,
        "Snapshot exported"
    );
    Ok(())
}
