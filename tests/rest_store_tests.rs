// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST key-value store failure reporting.

use std::time::Duration;
use whoop_snapshot::db::{KvStore, RestKvStore};
use whoop_snapshot::error::AppError;

mod common;

#[tokio::test]
async fn test_cut_off_reply_reports_read_failure() {
    let url = common::truncated_response_server().await;
    let store = RestKvStore::new(&url, "kv-token", Duration::from_secs(5)).unwrap();

    let err = store.get("whoop:data").await.unwrap_err();

    match err {
        AppError::Store(msg) => {
            assert!(msg.starts_with("GET failed with HTTP 200"), "{}", msg);
            assert!(msg.contains("failed to read response body"), "{}", msg);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
