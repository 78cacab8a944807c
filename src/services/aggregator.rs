// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot aggregation.
//!
//! Handles the core workflow:
//! 1. Obtain a usable access token (always refresh, or probe first)
//! 2. Fetch every resource concurrently
//! 3. Assemble the latest view and collections into one snapshot
//!
//! A resource that cannot be fetched becomes `null` in the snapshot; only
//! credential and store failures abort the cycle.

use crate::config::Config;
use crate::error::AppError;
use crate::models::whoop::ordering_violation;
use crate::models::{
    BodyMeasurement, Cycle, Latest, Profile, Recovery, Sleep, Snapshot, Timestamped, Workout,
};
use crate::services::token::TokenRefresher;
use crate::services::whoop::{ApiResponse, WhoopClient};
use serde::de::DeserializeOwned;

pub const PROFILE_PATH: &str = "/v2/user/profile/basic";
pub const BODY_PATH: &str = "/v2/user/measurement/body";
pub const RECOVERY_PATH: &str = "/v2/recovery";
pub const SLEEP_PATH: &str = "/v2/activity/sleep";
pub const CYCLE_PATH: &str = "/v2/cycle";
pub const WORKOUT_PATH: &str = "/v2/activity/workout";

/// How a cycle obtains its access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Refresh unconditionally. Used by the scheduled cycle so tokens rotate
    /// on every run.
    AlwaysRefresh,
    /// Probe the profile endpoint with the stored token and refresh only on a
    /// stale-token signal.
    ProbeFirst,
}

/// Which resources a snapshot contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    /// Latest recovery, sleep and cycle plus one page of workouts.
    Latest,
    /// Profile, body measurement and the bounded history of every collection.
    Full,
}

/// Runs aggregation cycles.
#[derive(Clone)]
pub struct Aggregator {
    client: WhoopClient,
    refresher: TokenRefresher,
    page_limit: u32,
    max_records: usize,
    workout_limit: u32,
}

impl Aggregator {
    pub fn new(
        client: WhoopClient,
        refresher: TokenRefresher,
        page_limit: u32,
        max_records: usize,
        workout_limit: u32,
    ) -> Self {
        Self {
            client,
            refresher,
            page_limit,
            max_records,
            workout_limit,
        }
    }

    pub fn from_config(config: &Config, client: WhoopClient, refresher: TokenRefresher) -> Self {
        Self::new(
            client,
            refresher,
            config.page_limit,
            config.max_records,
            config.workout_limit,
        )
    }

    /// Run one aggregation cycle.
    pub async fn run(&self, mode: TokenMode, scope: SnapshotScope) -> Result<Snapshot, AppError> {
        tracing::info!(?mode, ?scope, "Starting aggregation cycle");

        let (token, probed_profile) = self.access_token(mode).await?;

        let snapshot = match scope {
            SnapshotScope::Latest => self.collect_latest(&token).await,
            SnapshotScope::Full => self.collect_full(&token, probed_profile).await,
        };

        let summary = snapshot.summary();
        tracing::info!(
            fetched_at = %snapshot.fetched_at,
            recovery = snapshot.latest.recovery.is_some(),
            sleep = snapshot.latest.sleep.is_some(),
            cycle = snapshot.latest.cycle.is_some(),
            workouts = summary.workouts,
            "Aggregation cycle complete"
        );

        Ok(snapshot)
    }

    /// Resolve the access token, plus the profile when a probe already fetched it.
    async fn access_token(
        &self,
        mode: TokenMode,
    ) -> Result<(String, Option<ApiResponse<Profile>>), AppError> {
        match mode {
            TokenMode::AlwaysRefresh => Ok((self.refresher.refresh().await?, None)),
            TokenMode::ProbeFirst => {
                if let Some(token) = self.refresher.stored_access_token().await? {
                    match self.client.get::<Profile>(PROFILE_PATH, &token).await {
                        ApiResponse::TokenExpired => {
                            tracing::info!("Access token expired, refreshing");
                        }
                        probed => {
                            tracing::debug!("Stored access token accepted");
                            return Ok((token, Some(probed)));
                        }
                    }
                } else {
                    tracing::info!("No stored access token, refreshing");
                }
                Ok((self.refresher.refresh().await?, None))
            }
        }
    }

    async fn collect_latest(&self, token: &str) -> Snapshot {
        let (recovery, sleep, cycle, workouts) = tokio::join!(
            self.first_record::<Recovery>(RECOVERY_PATH, token),
            self.first_record::<Sleep>(SLEEP_PATH, token),
            self.first_record::<Cycle>(CYCLE_PATH, token),
            self.client
                .get_page::<Workout>(WORKOUT_PATH, token, self.workout_limit, None),
        );

        let workouts = newest_first(workouts.map(|page| page.records));

        Snapshot {
            latest: Latest {
                recovery: settle("recovery", recovery).flatten(),
                sleep: settle("sleep", sleep).flatten(),
                cycle: settle("cycle", cycle).flatten(),
            },
            workouts: settle("workouts", workouts),
            profile: None,
            body: None,
            recoveries: None,
            sleeps: None,
            cycles: None,
            fetched_at: chrono::Utc::now(),
        }
    }

    async fn collect_full(
        &self,
        token: &str,
        probed_profile: Option<ApiResponse<Profile>>,
    ) -> Snapshot {
        let profile_fetch = async {
            match probed_profile {
                Some(probed) => probed,
                None => self.client.get::<Profile>(PROFILE_PATH, token).await,
            }
        };

        let (profile, body, recoveries, sleeps, workouts, cycles) = tokio::join!(
            profile_fetch,
            self.client.get::<BodyMeasurement>(BODY_PATH, token),
            self.history::<Recovery>(RECOVERY_PATH, token),
            self.history::<Sleep>(SLEEP_PATH, token),
            self.history::<Workout>(WORKOUT_PATH, token),
            self.history::<Cycle>(CYCLE_PATH, token),
        );

        let recoveries = settle("recoveries", recoveries);
        let sleeps = settle("sleeps", sleeps);
        let cycles = settle("cycles", cycles);

        Snapshot {
            latest: Latest {
                recovery: first_of(&recoveries),
                sleep: first_of(&sleeps),
                cycle: first_of(&cycles),
            },
            workouts: settle("workouts", workouts),
            profile: Some(settle("profile", profile)),
            body: Some(settle("body", body)),
            recoveries: Some(recoveries),
            sleeps: Some(sleeps),
            cycles: Some(cycles),
            fetched_at: chrono::Utc::now(),
        }
    }

    /// Most recent record of a collection. `Ok(None)` when the collection is empty.
    async fn first_record<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> ApiResponse<Option<T>> {
        self.client
            .get_page::<T>(path, token, 1, None)
            .await
            .map(|page| page.records.into_iter().next())
    }

    /// Bounded history of a collection, checked to be newest first.
    async fn history<T: DeserializeOwned + Timestamped>(
        &self,
        path: &str,
        token: &str,
    ) -> ApiResponse<Vec<T>> {
        newest_first(
            self.client
                .get_all::<T>(path, token, self.page_limit, self.max_records)
                .await,
        )
    }
}

/// Reject collections that break the newest-first contract `latest` relies on.
fn newest_first<T: Timestamped>(response: ApiResponse<Vec<T>>) -> ApiResponse<Vec<T>> {
    match response {
        ApiResponse::Ok(records) => match ordering_violation(&records) {
            Some(index) => ApiResponse::Unavailable(format!(
                "upstream ordering violated at record {}",
                index
            )),
            None => ApiResponse::Ok(records),
        },
        other => other,
    }
}

/// Collapse a fetch outcome into a snapshot field, logging degradation.
fn settle<T>(resource: &str, response: ApiResponse<T>) -> Option<T> {
    match response.into_result() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(resource, error = %e, "Leaving resource empty");
            None
        }
    }
}

fn first_of<T: Clone>(collection: &Option<Vec<T>>) -> Option<T> {
    collection.as_ref().and_then(|records| records.first().cloned())
}
