// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the fitness API (no trailing slash)
    pub api_url: String,
    /// Where the access/refresh tokens and user snapshot are persisted
    pub session_file: PathBuf,
    /// Per-request timeout
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("FITLOG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let session_file = match env::var("FITLOG_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()?,
        };

        let http_timeout = match env::var("FITLOG_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("FITLOG_HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: normalize_base_url(&api_url),
            session_file,
            http_timeout,
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: env::temp_dir().join("fitlog-test-session.json"),
            http_timeout: Duration::from_secs(5),
        }
    }
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::Missing("FITLOG_SESSION_FILE"))?;
    Ok(base.join("fitlog").join("session.json"))
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
