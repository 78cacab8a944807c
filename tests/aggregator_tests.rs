// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregation cycles against a mock WHOOP API.

use serde_json::json;
use std::time::Duration;
use whoop_snapshot::db::MemoryKvStore;
use whoop_snapshot::services::aggregator::{
    BODY_PATH, CYCLE_PATH, PROFILE_PATH, RECOVERY_PATH, SLEEP_PATH, WORKOUT_PATH,
};
use whoop_snapshot::services::{Aggregator, SnapshotScope, TokenMode, WhoopClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn aggregator(server: &MockServer, kv: &MemoryKvStore) -> Aggregator {
    let config = common::test_config(server);
    Aggregator::new(
        WhoopClient::from_config(&config).unwrap(),
        common::test_refresher(server, kv, None, Duration::from_secs(2)),
        2,
        10,
        config.workout_limit,
    )
}

async fn mount_profile(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", PROFILE_PATH)))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": 10129,
            "email": "jsmith123@whoop.com",
            "first_name": "John",
            "last_name": "Smith"
        })))
        .mount(server)
        .await;
}

/// Full-scope resources, with recoveries split across two pages.
async fn mount_full_resources(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", BODY_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "height_meter": 1.8288,
            "weight_kilogram": 90.7185,
            "max_heart_rate": 200
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/developer{}", RECOVERY_PATH)))
        .and(query_param("nextToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [common::recovery(3, "2024-05-30T11:00:00.000Z", 55.0)]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", RECOVERY_PATH)))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                common::recovery(5, "2024-06-01T11:00:00.000Z", 80.0),
                common::recovery(4, "2024-05-31T11:00:00.000Z", 62.0)
            ],
            "next_token": "page2"
        })))
        .mount(server)
        .await;

    common::mount_page(
        server,
        SLEEP_PATH,
        2,
        json!([common::timed("sleep-20", "2024-05-31T23:00:00Z")]),
    )
    .await;
    common::mount_page(
        server,
        CYCLE_PATH,
        2,
        json!([common::timed(30, "2024-05-31T22:00:00Z")]),
    )
    .await;
    common::mount_page(
        server,
        WORKOUT_PATH,
        2,
        json!([common::workout("w1", "2024-05-30T07:00:00Z", "running")]),
    )
    .await;
}

#[tokio::test]
async fn test_full_scope_latest_matches_first_history_record() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    mount_full_resources(&server).await;

    let kv = MemoryKvStore::new();
    common::seed_tokens(&kv, "a1", "r1").await;

    let snapshot = aggregator(&server, &kv)
        .run(TokenMode::ProbeFirst, SnapshotScope::Full)
        .await
        .unwrap();

    let recoveries = snapshot.recoveries.clone().flatten().unwrap();
    assert_eq!(recoveries.len(), 3);
    assert_eq!(snapshot.latest.recovery.as_ref(), recoveries.first());
    assert_eq!(
        snapshot.latest.sleep.as_ref(),
        snapshot.sleeps.as_ref().unwrap().as_ref().unwrap().first()
    );

    let profile = snapshot.profile.clone().flatten().unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("John"));
    assert!(snapshot.body.clone().flatten().is_some());
    assert_eq!(snapshot.workouts.as_ref().unwrap().len(), 1);

    let summary = snapshot.summary();
    assert_eq!(summary.recovery_score, Some(80.0));
    assert_eq!(summary.sleeps, Some(1));
}

#[tokio::test]
async fn test_probe_success_skips_refresh() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    mount_full_resources(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let kv = MemoryKvStore::new();
    common::seed_tokens(&kv, "a1", "r1").await;

    aggregator(&server, &kv)
        .run(TokenMode::ProbeFirst, SnapshotScope::Full)
        .await
        .unwrap();

    assert_eq!(common::stored_tokens(&kv).await.unwrap().refresh_token, "r1");
}

#[tokio::test]
async fn test_expired_probe_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", PROFILE_PATH)))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_profile(&server, "a2").await;
    mount_full_resources(&server).await;
    common::mount_refresh(&server, "r1", "a2", "r2").await;

    let kv = MemoryKvStore::new();
    common::seed_tokens(&kv, "stale", "r1").await;

    let snapshot = aggregator(&server, &kv)
        .run(TokenMode::ProbeFirst, SnapshotScope::Full)
        .await
        .unwrap();

    assert!(snapshot.profile.clone().flatten().is_some());
    let tokens = common::stored_tokens(&kv).await.unwrap();
    assert_eq!(tokens.access_token, "a2");
    assert_eq!(tokens.refresh_token, "r2");
}

#[tokio::test]
async fn test_out_of_order_history_is_null() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    // Oldest first: must not be trusted for `latest`.
    common::mount_page(
        &server,
        CYCLE_PATH,
        2,
        json!([
            common::timed(30, "2024-05-30T22:00:00Z"),
            common::timed(31, "2024-05-31T22:00:00Z")
        ]),
    )
    .await;
    mount_full_resources(&server).await;

    let kv = MemoryKvStore::new();
    common::seed_tokens(&kv, "a1", "r1").await;

    let snapshot = aggregator(&server, &kv)
        .run(TokenMode::ProbeFirst, SnapshotScope::Full)
        .await
        .unwrap();

    assert_eq!(snapshot.cycles, Some(None));
    assert!(snapshot.latest.cycle.is_none());
    assert!(snapshot.latest.recovery.is_some());

    let value = serde_json::to_value(&snapshot).unwrap();
    assert!(value["cycles"].is_null());
    assert!(value.get("cycles").is_some());
}

#[tokio::test]
async fn test_latest_scope_requests_single_records() {
    let server = MockServer::start().await;
    common::mount_refresh(&server, "r1", "a2", "r2").await;
    common::mount_page(
        &server,
        RECOVERY_PATH,
        1,
        json!([common::recovery(5, "2024-06-01T11:00:00.000Z", 80.0)]),
    )
    .await;
    common::mount_page(&server, SLEEP_PATH, 1, json!([])).await;
    common::mount_page(
        &server,
        CYCLE_PATH,
        1,
        json!([common::timed(30, "2024-05-31T22:00:00Z")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", WORKOUT_PATH)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let kv = MemoryKvStore::new();
    common::seed_tokens(&kv, "a1", "r1").await;

    let snapshot = aggregator(&server, &kv)
        .run(TokenMode::AlwaysRefresh, SnapshotScope::Latest)
        .await
        .unwrap();

    assert!(snapshot.latest.recovery.is_some());
    // An empty collection and a failed one both leave the field null.
    assert!(snapshot.latest.sleep.is_none());
    assert!(snapshot.latest.cycle.is_some());
    assert!(snapshot.workouts.is_none());
    assert!(snapshot.profile.is_none());
    assert!(snapshot.recoveries.is_none());

    let value = serde_json::to_value(&snapshot).unwrap();
    assert!(value.get("profile").is_none());
    assert!(value["workouts"].is_null());
}
