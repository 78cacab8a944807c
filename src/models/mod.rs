// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod snapshot;
pub mod token;
pub mod whoop;

pub use snapshot::{Latest, Snapshot, SnapshotSummary};
pub use token::{TokenPair, TokenResponse};
pub use whoop::{
    BodyMeasurement, Cycle, Page, Profile, Recovery, ScoreState, Sleep, Timestamped, Workout,
};
