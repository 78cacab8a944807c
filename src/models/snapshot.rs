// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot document published to the cache and served to the display page.

use super::whoop::{BodyMeasurement, Cycle, Profile, Recovery, Sleep, Workout};
use crate::time_utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One aggregation cycle's result. Immutable once published.
///
/// Resources that could not be fetched are `null`. Optional collections that
/// were not requested are omitted entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(with = "time_utils::rfc3339_millis")]
    pub fetched_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "requested")]
    pub profile: Option<Option<Profile>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "requested")]
    pub body: Option<Option<BodyMeasurement>>,

    pub latest: Latest,

    pub workouts: Option<Vec<Workout>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "requested")]
    pub recoveries: Option<Option<Vec<Recovery>>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "requested")]
    pub sleeps: Option<Option<Vec<Sleep>>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "requested")]
    pub cycles: Option<Option<Vec<Cycle>>>,
}

/// Most recent record of each daily resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Latest {
    pub recovery: Option<Recovery>,
    pub sleep: Option<Sleep>,
    pub cycle: Option<Cycle>,
}

/// A present key (even `null`) means the field was requested.
fn requested<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Headline numbers for log output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotSummary {
    pub recovery_score: Option<f64>,
    pub hrv_rmssd_milli: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub workouts: usize,
    pub sleeps: Option<usize>,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        let score = self.latest.recovery.as_ref().and_then(|r| r.score.as_ref());
        SnapshotSummary {
            recovery_score: score.and_then(|s| s.recovery_score),
            hrv_rmssd_milli: score.and_then(|s| s.hrv_rmssd_milli),
            resting_heart_rate: score.and_then(|s| s.resting_heart_rate),
            workouts: self.workouts.as_ref().map_or(0, Vec::len),
            sleeps: self.sleeps.as_ref().and_then(|s| s.as_ref()).map(Vec::len),
        }
    }
}
