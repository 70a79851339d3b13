// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! fitlog: client for a personal workout-logging API
//!
//! This crate manages the signed-in session (token storage, refresh and
//! retry) and provides typed access to workouts, exercises and stats, plus
//! the aggregation behind the charts.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::{FitlogService, SessionManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub service: FitlogService,
}

impl AppState {
    /// Wire up the session manager and service from configuration.
    pub fn new(config: Config) -> error::Result<Self> {
        let session = Arc::new(SessionManager::from_config(&config)?);
        Ok(Self::with_session(config, session))
    }

    pub fn with_session(config: Config, session: Arc<SessionManager>) -> Self {
        let service = FitlogService::new(session.clone());
        Self {
            config,
            session,
            service,
        }
    }
}
