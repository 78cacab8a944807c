// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WHOOP API response models.
//!
//! Every upstream field is optional so a missing field never fails a decode.
//! Fields the snapshot does not model are kept in `extra` and passed through
//! to the display page unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One page of a collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    /// Present when more records exist upstream.
    pub next_token: Option<String>,
}

/// Scoring state shared by recovery, sleep, cycle and workout records.
///
/// States this crate does not know keep their upstream spelling, so a
/// republished record carries exactly what WHOOP sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreState {
    Scored,
    PendingScore,
    Unscorable,
    Unknown(String),
}

impl ScoreState {
    pub fn as_str(&self) -> &str {
        match self {
            ScoreState::Scored => "SCORED",
            ScoreState::PendingScore => "PENDING_SCORE",
            ScoreState::Unscorable => "UNSCORABLE",
            ScoreState::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ScoreState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SCORED" => ScoreState::Scored,
            "PENDING_SCORE" => ScoreState::PendingScore,
            "UNSCORABLE" => ScoreState::Unscorable,
            _ => ScoreState::Unknown(raw),
        }
    }
}

impl Serialize for ScoreState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScoreState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ScoreState::from)
    }
}

/// Records that carry the timestamp upstream orders them by.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// Verify records are newest first.
///
/// Records without a timestamp are skipped. Returns the index of the first
/// record that is newer than its predecessor.
pub fn ordering_violation<T: Timestamped>(records: &[T]) -> Option<usize> {
    let mut previous: Option<DateTime<Utc>> = None;
    for (index, record) in records.iter().enumerate() {
        let Some(ts) = record.timestamp() else {
            continue;
        };
        if previous.is_some_and(|prev| ts > prev) {
            return Some(index);
        }
        previous = Some(ts);
    }
    None
}

// ─── Recovery ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recovery {
    pub cycle_id: Option<i64>,
    pub sleep_id: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub score_state: Option<ScoreState>,
    pub score: Option<RecoveryScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryScore {
    pub user_calibrating: Option<bool>,
    pub recovery_score: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub hrv_rmssd_milli: Option<f64>,
    pub spo2_percentage: Option<f64>,
    pub skin_temp_celsius: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Recovery {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

// ─── Sleep ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sleep {
    pub id: Option<String>,
    pub cycle_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub timezone_offset: Option<String>,
    pub nap: Option<bool>,
    pub score_state: Option<ScoreState>,
    pub score: Option<SleepScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sleep score. Stage summary and sleep need stay in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepScore {
    pub respiratory_rate: Option<f64>,
    pub sleep_performance_percentage: Option<f64>,
    pub sleep_consistency_percentage: Option<f64>,
    pub sleep_efficiency_percentage: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Sleep {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start
    }
}

// ─── Cycle ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    /// Absent while the cycle is still open.
    pub end: Option<DateTime<Utc>>,
    pub timezone_offset: Option<String>,
    pub score_state: Option<ScoreState>,
    pub score: Option<CycleScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleScore {
    pub strain: Option<f64>,
    pub kilojoule: Option<f64>,
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Cycle {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start
    }
}

// ─── Workout ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub timezone_offset: Option<String>,
    pub sport_name: Option<String>,
    pub sport_id: Option<i64>,
    pub score_state: Option<ScoreState>,
    pub score: Option<WorkoutScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Workout score. Heart-rate zone durations stay in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutScore {
    pub strain: Option<f64>,
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub kilojoule: Option<f64>,
    pub percent_recorded: Option<f64>,
    pub distance_meter: Option<f64>,
    pub altitude_gain_meter: Option<f64>,
    pub altitude_change_meter: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timestamped for Workout {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start
    }
}

// ─── Singletons ──────────────────────────────────────────────

/// Basic user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    pub height_meter: Option<f64>,
    pub weight_kilogram: Option<f64>,
    pub max_heart_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
