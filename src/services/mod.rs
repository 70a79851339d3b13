// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - API access and session handling.

pub mod api;
pub mod fitlog;
pub mod session;

pub use api::{ApiClient, ApiRequest};
pub use fitlog::{FitlogService, WorkoutDetail, DEFAULT_CHART_LIMIT};
pub use session::{RetryBudget, SessionEvent, SessionManager, SessionState};
