// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (trigger authentication, response headers).

pub mod cron_auth;
pub mod security;

pub use cron_auth::require_cron_secret;
