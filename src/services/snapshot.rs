// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot publication and retrieval.

use crate::db::{keys, SharedKvStore};
use crate::error::AppError;
use crate::models::Snapshot;
use std::path::Path;

/// Writes snapshots to the cache key and reads them back.
///
/// Publishing is a single whole-value `SET`: the last cycle to finish wins, and
/// a failed write leaves the previous snapshot in place.
#[derive(Clone)]
pub struct SnapshotPublisher {
    kv: SharedKvStore,
}

impl SnapshotPublisher {
    pub fn new(kv: SharedKvStore) -> Self {
        Self { kv }
    }

    /// Publish `snapshot`, replacing whatever was there.
    pub async fn publish(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let raw = serde_json::to_string(snapshot).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to encode snapshot: {}", e))
        })?;
        self.kv.set(keys::SNAPSHOT, &raw).await?;

        tracing::info!(
            fetched_at = %snapshot.fetched_at,
            bytes = raw.len(),
            "Snapshot published"
        );
        Ok(())
    }

    /// Last published snapshot, or `None` if nothing was ever published.
    pub async fn load(&self) -> Result<Option<Snapshot>, AppError> {
        let Some(raw) = self.kv.get(keys::SNAPSHOT).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Store(format!("Published snapshot is corrupt: {}", e)))
    }
}

/// Write a snapshot to a static JSON file for the display page.
pub async fn export_to_file(snapshot: &Snapshot, path: &Path) -> anyhow::Result<()> {
    let pretty = serde_json::to_string_pretty(snapshot)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, pretty).await?;
    Ok(())
}
