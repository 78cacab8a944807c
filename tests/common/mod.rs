// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use whoop_snapshot::config::Config;
use whoop_snapshot::db::{keys, CredentialStore, KvStore, MemoryKvStore, SharedKvStore};
use whoop_snapshot::error::AppError;
use whoop_snapshot::models::TokenPair;
use whoop_snapshot::routes::create_router;
use whoop_snapshot::services::{TokenRefresher, WhoopClient};
use whoop_snapshot::AppState;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Shared secret accepted by the trigger endpoint in tests.
#[allow(dead_code)]
pub const CRON_SECRET: &str = "test_cron_secret";

/// Test configuration pointing at a mock WHOOP server.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::test_default();
    config.whoop_api_base = server.uri();
    config
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app(server: &MockServer) -> (axum::Router, Arc<AppState>, MemoryKvStore) {
    let kv = MemoryKvStore::new();
    let (app, state) = create_test_app_with_store(server, Arc::new(kv.clone()));
    (app, state, kv)
}

#[allow(dead_code)]
pub fn create_test_app_with_store(
    server: &MockServer,
    kv: SharedKvStore,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(test_config(server), kv).expect("state should build"));
    (create_router(state.clone()), state)
}

/// Refresher over `kv` talking to `server`.
#[allow(dead_code)]
pub fn test_refresher(
    server: &MockServer,
    kv: &MemoryKvStore,
    bootstrap: Option<&str>,
    lock_wait: Duration,
) -> TokenRefresher {
    let config = test_config(server);
    TokenRefresher::new(
        WhoopClient::from_config(&config).unwrap(),
        CredentialStore::new(Arc::new(kv.clone())),
        bootstrap.map(str::to_string),
        Duration::from_secs(30),
        lock_wait,
    )
}

#[allow(dead_code)]
pub async fn seed_tokens(kv: &MemoryKvStore, access: &str, refresh: &str) {
    CredentialStore::new(Arc::new(kv.clone()))
        .save(&TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        })
        .await
        .unwrap();
}

#[allow(dead_code)]
pub async fn stored_tokens(kv: &MemoryKvStore) -> Option<TokenPair> {
    CredentialStore::new(Arc::new(kv.clone()))
        .load()
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn stored_snapshot(kv: &MemoryKvStore) -> Option<Value> {
    kv.get(keys::SNAPSHOT)
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

/// Token endpoint: exchanging `refresh` yields `new_access`/`new_refresh`.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, refresh: &str, new_access: &str, new_refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .and(body_string_contains(format!("refresh_token={}", refresh)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": new_access,
            "refresh_token": new_refresh,
            "expires_in": 3600,
            "scope": "offline",
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

/// Token endpoint: exchanging `refresh` is rejected.
#[allow(dead_code)]
pub async fn mount_refresh_rejected(server: &MockServer, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .and(body_string_contains(format!("refresh_token={}", refresh)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The refresh token is invalid"
        })))
        .mount(server)
        .await;
}

/// One collection page for `resource_path` at page size `limit`.
#[allow(dead_code)]
pub async fn mount_page(server: &MockServer, resource_path: &str, limit: u32, records: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/developer{}", resource_path)))
        .and(query_param("limit", limit.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": records })))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn recovery(cycle_id: i64, created_at: &str, score: f64) -> Value {
    json!({
        "cycle_id": cycle_id,
        "sleep_id": format!("sleep-{}", cycle_id),
        "user_id": 10129,
        "created_at": created_at,
        "updated_at": created_at,
        "score_state": "SCORED",
        "score": {
            "user_calibrating": false,
            "recovery_score": score,
            "resting_heart_rate": 52,
            "hrv_rmssd_milli": 61.5
        }
    })
}

#[allow(dead_code)]
pub fn timed(id: impl Into<Value>, start: &str) -> Value {
    let id: Value = id.into();
    json!({
        "id": id,
        "user_id": 10129,
        "start": start,
        "score_state": "SCORED"
    })
}

#[allow(dead_code)]
pub fn workout(id: &str, start: &str, sport: &str) -> Value {
    json!({
        "id": id,
        "user_id": 10129,
        "start": start,
        "sport_name": sport,
        "score_state": "SCORED",
        "score": { "strain": 8.25, "average_heart_rate": 123 }
    })
}

/// Store whose every operation fails, for error-path tests.
#[allow(dead_code)]
pub struct FailingKvStore;

#[async_trait]
impl KvStore for FailingKvStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn set_nx_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool, AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn delete_if_equals(&self, _key: &str, _value: &str) -> Result<bool, AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }
}

/// Serve a single `200 OK` whose body stops short of its declared length.
/// Returns the base URL.
#[allow(dead_code)]
pub async fn truncated_response_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // Drain the whole request so closing the socket is a clean EOF.
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let declared = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + declared {
                    break;
                }
            }
        }

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"access_tok")
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });

    format!("http://{}", addr)
}
