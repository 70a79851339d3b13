// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and credential models for the auth endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// User profile as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// When the account was created (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Any further profile fields, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

/// Access/refresh bearer token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body returned by both login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

/// Login credentials. `identifier` may be an email address or a username.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "email_or_username")]
    pub identifier: String,
    pub password: String,
}

/// New account details.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Editable profile fields for `PATCH /users/profile/`. Unset fields are
/// left unchanged.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
}

/// Body of `POST /token/refresh/`.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /token/refresh/`.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}
