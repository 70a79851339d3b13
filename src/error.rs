// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types with consistent user-facing messages.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Error type for every call that goes through the fitness API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Message shown when creating a second workout of the same type on the same date.
    pub const DUPLICATE_WORKOUT: &'static str =
        "You already have a workout of this type on this date. Please choose a different date or type.";

    pub const GENERIC_FAILURE: &'static str = "Something went wrong. Please try again.";

    /// Classify a non-success response into the error taxonomy.
    ///
    /// `body` is the raw response text. Only JSON payloads yield a message;
    /// HTML error pages and the like are dropped.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let payload = ErrorPayload::parse(body);
        let message = payload.message().unwrap_or_default();

        match status {
            StatusCode::BAD_REQUEST => ApiError::Validation(payload.field_messages()),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Server-provided message carried by this error, if any.
    pub fn detail(&self) -> Option<&str> {
        let msg = match self {
            ApiError::AuthenticationFailure(msg)
            | ApiError::SessionExpired(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Http { message: msg, .. } => msg.as_str(),
            ApiError::Validation(msgs) => msgs.first().map(String::as_str)?,
            _ => return None,
        };
        (!msg.is_empty()).then_some(msg)
    }

    /// Text suitable for showing directly to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthenticationFailure(msg) => msg.clone(),
            ApiError::SessionExpired(_) => "Your session has expired. Please log in again.".into(),
            ApiError::Unauthorized(_) => "Please log in to continue.".into(),
            ApiError::Validation(msgs) if msgs.is_empty() => {
                "Invalid data. Please check your inputs.".into()
            }
            ApiError::Validation(msgs) => format!("Validation Error: {}", msgs.join(", ")),
            ApiError::Conflict(msg) if msg.is_empty() => Self::DUPLICATE_WORKOUT.into(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::NotFound(_) => "Not found".into(),
            _ => Self::GENERIC_FAILURE.into(),
        }
    }

    /// Returns `true` if the caller must sign in again to proceed.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::SessionExpired(_) | ApiError::Unauthorized(_)
        )
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(|err| match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{}: {}", field, err.code),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Error body as returned by the API.
///
/// The backend answers either `{"detail": "..."}` or a map of field names to
/// lists of messages (`{"date": ["..."], "non_field_errors": ["..."]}`).
#[derive(Debug, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    non_field_errors: Vec<String>,
    #[serde(flatten)]
    fields: serde_json::Map<String, Value>,
}

impl ErrorPayload {
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => serde_json::from_value(Value::Object(map)).unwrap_or_default(),
            // Bare list of messages, e.g. a validation error raised outside a serializer
            Ok(Value::Array(items)) => Self {
                non_field_errors: items.iter().map(value_text).collect(),
                ..Self::default()
            },
            Ok(Value::String(s)) => Self {
                detail: Some(Value::String(s)),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Primary message: `detail`, then the first non-field error.
    pub fn message(&self) -> Option<String> {
        self.detail_text()
            .or_else(|| self.non_field_errors.first().cloned())
    }

    /// Whether the payload names individual fields.
    pub fn has_field_errors(&self) -> bool {
        self.fields.keys().any(|key| key != "code")
    }

    fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(value_text).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            other => Some(value_text(other)),
        }
    }

    /// Every message in the payload, flattened into a single list.
    pub fn field_messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self.detail_text().into_iter().collect();
        out.extend(self.non_field_errors.iter().cloned());

        for value in self.fields.values() {
            match value {
                Value::String(s) => out.push(s.clone()),
                Value::Array(items) => out.extend(items.iter().map(value_text)),
                Value::Null => {}
                other => out.push(other.to_string()),
            }
        }
        out
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result type alias for API calls
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_flattens_field_messages() {
        let body = r#"{"date": ["Enter a valid date."], "duration": ["Must be positive.", "Too big."]}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);

        match err {
            ApiError::Validation(msgs) => {
                assert_eq!(msgs.len(), 3);
                assert!(msgs.contains(&"Enter a valid date.".to_string()));
                assert!(msgs.contains(&"Too big.".to_string()));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_conflict_falls_back_to_duplicate_message() {
        let err = ApiError::from_status(StatusCode::CONFLICT, "");
        assert_eq!(err.user_message(), ApiError::DUPLICATE_WORKOUT);

        let err = ApiError::from_status(
            StatusCode::CONFLICT,
            r#"{"non_field_errors": ["Already logged"]}"#,
        );
        assert_eq!(err.user_message(), "Already logged");
    }

    #[test]
    fn test_detail_preferred_over_non_field_errors() {
        let payload =
            ErrorPayload::parse(r#"{"detail": "Token is invalid", "non_field_errors": ["x"]}"#);
        assert_eq!(payload.message().as_deref(), Some("Token is invalid"));
    }

    #[test]
    fn test_non_string_detail_keeps_messages() {
        let payload = ErrorPayload::parse(r#"{"detail": ["Too many", "requests"], "email": ["Taken."]}"#);
        assert_eq!(payload.message().as_deref(), Some("Too many, requests"));
        assert_eq!(payload.field_messages(), vec!["Too many, requests", "Taken."]);
        assert!(payload.has_field_errors());

        let err = ApiError::from_status(
            StatusCode::FORBIDDEN,
            r#"{"detail": {"reason": "locked"}, "code": "account_locked"}"#,
        );
        assert_eq!(err.detail(), Some(r#"{"reason":"locked"}"#));
        assert!(!ErrorPayload::parse(r#"{"detail": "x", "code": "y"}"#).has_field_errors());
    }

    #[test]
    fn test_bare_message_list() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"["Workout not found"]"#);
        assert_eq!(err.detail(), Some("Workout not found"));
    }

    #[test]
    fn test_non_json_body_has_no_detail() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert!(matches!(err, ApiError::Http { status: 502, .. }));
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message(), ApiError::GENERIC_FAILURE);
    }

    #[test]
    fn test_empty_bad_request() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message(), "Invalid data. Please check your inputs.");
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::SessionExpired("x".into()).requires_login());
        assert!(!ApiError::NotFound("x".into()).requires_login());
    }
}
