// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness API client.
//!
//! Handles:
//! - Request building against the configured base URL
//! - Bearer token attachment
//! - Token refresh (outside the retry path)
//! - Error classification of non-success responses

use crate::config::Config;
use crate::error::ApiError;
use crate::models::user::{RefreshRequest, RefreshResponse};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Endpoint paths, relative to the base URL.
pub mod paths {
    pub const REGISTER: &str = "/users/register/";
    pub const LOGIN: &str = "/users/login/";
    pub const PROFILE: &str = "/users/profile/";
    pub const TOKEN_REFRESH: &str = "/token/refresh/";
    pub const WORKOUTS: &str = "/workouts/";
    pub const EXERCISES: &str = "/exercises/";
    pub const DASHBOARD_STATS: &str = "/dashboard/stats/";

    pub fn workout(id: u64) -> String {
        format!("{}{}/", WORKOUTS, id)
    }

    pub fn exercise(id: u64) -> String {
        format!("{}{}/", EXERCISES, id)
    }
}

/// A request description that can be sent more than once.
///
/// The body is serialized up front so a retry re-sends exactly the same bytes.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, params: Vec<(&'static str, String)>) -> Self {
        self.query.extend(params);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Low-level HTTP client for the fitness API.
///
/// Knows nothing about sessions: the caller decides which token (if any) to
/// attach. See [`crate::services::SessionManager`] for the retrying layer.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, attaching `access_token` as a bearer credential if given.
    ///
    /// Only transport failures are errors here; the response is returned
    /// whatever its status.
    pub async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = access_token.is_some(),
            "Sending API request"
        );

        builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Sent without any bearer credential.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let response = self
            .http
            .post(self.url(paths::TOKEN_REFRESH))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Token refresh request failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    /// Check response status and return error if not successful.
    pub async fn check_response(response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(response).await)
    }

    /// Check response and parse JSON body.
    pub async fn check_response_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Network(format!("JSON parse error: {}", e)))
    }

    /// Consume a failed response and classify it.
    pub async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_server_error() {
            tracing::warn!(status = %status, body = %body, "API server error");
        } else {
            tracing::debug!(status = %status, "API request rejected");
        }

        ApiError::from_status(status, &body)
    }
}
