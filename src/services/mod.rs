// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregator;
pub mod snapshot;
pub mod token;
pub mod whoop;

pub use aggregator::{Aggregator, SnapshotScope, TokenMode};
pub use snapshot::{export_to_file, SnapshotPublisher};
pub use token::TokenRefresher;
pub use whoop::{ApiResponse, WhoopClient};
