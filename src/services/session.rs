// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session management: sign-in state, persisted credentials, and the
//! refresh-and-retry protocol every API call goes through.
//!
//! State transitions:
//!
//! ```text
//! Unauthenticated --login/register ok--> Authenticated
//! Unauthenticated --login/register err--> Failed
//! (startup) --stored credentials--> Restoring --> Authenticated | Unauthenticated
//! Authenticated --logout | refresh failure--> Unauthenticated
//! ```

use crate::config::Config;
use crate::error::{ApiError, ErrorPayload, Result};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::services::api::{paths, ApiClient, ApiRequest};
use crate::store::{CredentialStore, FileStore, StoredSession};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const SESSION_EXPIRED: &str = "Session expired";

/// Where the client stands with the API.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    /// Stored credentials are being checked; `cached` is the stored snapshot
    /// and may be shown until the check completes.
    Restoring { cached: Option<User> },
    Authenticated(User),
    /// Last login/registration attempt failed with this message.
    Failed(String),
}

/// Input to [`SessionState::apply`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RestoreStarted { cached: Option<User> },
    SignedIn(User),
    AuthFailed(String),
    SignedOut,
    ErrorCleared,
}

impl SessionState {
    /// Pure transition function.
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (_, SessionEvent::RestoreStarted { cached }) => SessionState::Restoring { cached },
            (_, SessionEvent::SignedIn(user)) => SessionState::Authenticated(user),
            // A failed attempt never evicts a live session
            (SessionState::Authenticated(user), SessionEvent::AuthFailed(_)) => {
                SessionState::Authenticated(user)
            }
            (_, SessionEvent::AuthFailed(message)) => SessionState::Failed(message),
            (_, SessionEvent::SignedOut) => SessionState::Unauthenticated,
            (SessionState::Failed(_), SessionEvent::ErrorCleared) => SessionState::Unauthenticated,
            (state, SessionEvent::ErrorCleared) => state,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Signed-in user, or the cached snapshot while restoring.
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Restoring { cached } => cached.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// How many more times a request may be re-sent after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// A 401 may trigger one refresh and one re-send.
    Once,
    /// A 401 is returned to the caller as-is.
    Exhausted,
}

/// Owns the session state and credential store, and mediates every call
/// to the API.
///
/// Construct one per application and share it via `Arc`.
pub struct SessionManager {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    /// Serializes refreshes so concurrent 401s trigger a single refresh call.
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            client,
            store,
            state,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Manager backed by the configured API and session file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        let store = Arc::new(FileStore::new(config.session_file.clone()));
        Ok(Self::new(client, store))
    }

    // ─── State ───────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn dispatch(&self, event: SessionEvent) {
        self.state.send_modify(|state| {
            let previous = std::mem::replace(state, SessionState::Unauthenticated);
            *state = previous.apply(event);
        });
        tracing::debug!(state = ?self.state.borrow().clone(), "Session state changed");
    }

    // ─── Sign-in / Sign-out ──────────────────────────────────────────────────

    /// Log in with an email/username and password.
    ///
    /// On failure the state becomes `Failed` and the error is returned. A
    /// rejection of the credentials themselves is
    /// [`ApiError::AuthenticationFailure`]; field errors, transport and server
    /// failures keep their own kind.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User> {
        let request = ApiRequest::post(paths::LOGIN).json(credentials)?;
        self.authenticate(request, LOGIN_FAILED).await
    }

    /// Create an account and sign in to it.
    pub async fn register(&self, details: &RegisterRequest) -> Result<User> {
        let request = ApiRequest::post(paths::REGISTER).json(details)?;
        self.authenticate(request, REGISTRATION_FAILED).await
    }

    async fn authenticate(&self, request: ApiRequest, fallback: &str) -> Result<User> {
        match self.request_session(&request, fallback).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, path = %request.path, "Signed in");
                self.dispatch(SessionEvent::SignedIn(user.clone()));
                Ok(user)
            }
            Err(e) => {
                let message = match &e {
                    ApiError::Validation(msgs) if !msgs.is_empty() => msgs.join(", "),
                    _ => e.detail().unwrap_or(fallback).to_string(),
                };
                tracing::warn!(error = %e, path = %request.path, "Sign-in failed");
                self.dispatch(SessionEvent::AuthFailed(message));
                Err(e)
            }
        }
    }

    /// Exchange credentials for a token pair and persist it with the user.
    async fn request_session(&self, request: &ApiRequest, fallback: &str) -> Result<User> {
        // A 401 here rejects the credentials, not a stale token
        let response = self
            .send_with_budget(request, RetryBudget::Exhausted)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_auth_failure(status, &body, fallback));
        }

        let auth: AuthResponse = ApiClient::check_response_json(response).await?;
        let session = StoredSession {
            access_token: auth.tokens.access,
            refresh_token: auth.tokens.refresh,
            user: auth.user,
        };
        self.store.save(&session)?;
        Ok(session.user)
    }

    /// Check stored credentials at startup.
    ///
    /// With nothing stored this makes no network call. Otherwise the profile
    /// is re-fetched; any failure clears the stored credentials.
    pub async fn restore_session(&self) {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable stored session, discarding");
                self.clear_store();
                self.dispatch(SessionEvent::SignedOut);
                return;
            }
        };

        let Some(stored) = stored else {
            tracing::debug!("No stored session");
            self.dispatch(SessionEvent::SignedOut);
            return;
        };

        let StoredSession {
            refresh_token,
            user: cached,
            ..
        } = stored;
        self.dispatch(SessionEvent::RestoreStarted {
            cached: Some(cached),
        });

        match self.send_json::<User>(&ApiRequest::get(paths::PROFILE)).await {
            Ok(user) => {
                if let Err(e) = self.store.replace_user(&refresh_token, &user) {
                    tracing::warn!(error = %e, "Failed to update cached profile");
                }
                tracing::info!(user_id = user.id, "Session restored");
                self.dispatch(SessionEvent::SignedIn(user));
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored session rejected, signing out");
                self.clear_store();
                self.dispatch(SessionEvent::SignedOut);
            }
        }
    }

    /// Forget all stored credentials. Safe to call when signed out.
    pub fn logout(&self) -> Result<()> {
        let cleared = self.store.clear();
        self.dispatch(SessionEvent::SignedOut);
        tracing::info!("Signed out");
        cleared
    }

    /// Dismiss a failed login/registration message.
    pub fn clear_error(&self) {
        self.dispatch(SessionEvent::ErrorCleared);
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear stored credentials");
        }
    }

    // ─── Requests ────────────────────────────────────────────────────────────

    /// Send a request with the stored access token, refreshing once on 401.
    pub async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        self.send_with_budget(request, RetryBudget::Once).await
    }

    /// Send a request, re-sending at most as often as `budget` allows.
    ///
    /// The re-send happens only after the refresh response has been fully
    /// processed and the new token stored.
    pub async fn send_with_budget(
        &self,
        request: &ApiRequest,
        mut budget: RetryBudget,
    ) -> Result<reqwest::Response> {
        let mut token = self.store.access_token()?;

        loop {
            let response = self.client.send(request, token.as_deref()).await?;

            if response.status() != reqwest::StatusCode::UNAUTHORIZED
                || budget == RetryBudget::Exhausted
            {
                return Ok(response);
            }
            budget = RetryBudget::Exhausted;

            let rejected = ApiClient::error_from_response(response).await;
            tracing::debug!(path = %request.path, "Request unauthorized, refreshing token");

            let fresh = self.refresh_access_token(token.as_deref(), rejected).await?;
            token = Some(fresh);
        }
    }

    /// Send and decode a JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        ApiClient::check_response_json(response).await
    }

    /// Send and expect an empty success response.
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<()> {
        let response = self.send(request).await?;
        ApiClient::check_response(response).await
    }

    /// Get an access token to replace `stale`, which the API just rejected.
    ///
    /// If another task refreshed while this one waited for the lock, its token
    /// is reused. When no refresh is possible the session is ended and
    /// `SessionExpired` (carrying the rejection message) is returned.
    async fn refresh_access_token(&self, stale: Option<&str>, rejected: ApiError) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let stored = self.store.load()?;
        match &stored {
            Some(session) if Some(session.access_token.as_str()) != stale => {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Ok(session.access_token.clone());
            }
            None if stale.is_some() => {
                // Signed out while this request was in flight
                return Err(self.expire(rejected));
            }
            _ => {}
        }

        let Some(refresh_token) = stored.map(|s| s.refresh_token) else {
            return Err(self.expire(rejected));
        };

        match self.client.refresh_token(&refresh_token).await {
            Ok(refreshed) => {
                if !self
                    .store
                    .replace_access_token(&refresh_token, &refreshed.access)?
                {
                    // Signed out, maybe into another account, while refreshing
                    tracing::info!("Session replaced during refresh, dropping new token");
                    return Err(expired_error(&rejected));
                }
                tracing::info!("Access token refreshed");
                Ok(refreshed.access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                Err(self.expire(rejected))
            }
        }
    }

    /// End the session after an unrecoverable 401.
    fn expire(&self, rejected: ApiError) -> ApiError {
        self.clear_store();
        self.dispatch(SessionEvent::SignedOut);
        expired_error(&rejected)
    }
}

fn expired_error(rejected: &ApiError) -> ApiError {
    ApiError::SessionExpired(rejected.detail().unwrap_or(SESSION_EXPIRED).to_string())
}

/// Classify a failed login/registration response.
///
/// A 400 or 401 that names no field is a rejection of the credentials.
/// Anything else keeps its usual classification.
fn classify_auth_failure(status: StatusCode, body: &str, fallback: &str) -> ApiError {
    let payload = ErrorPayload::parse(body);
    let rejected = status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED;

    if rejected && !payload.has_field_errors() {
        let message = payload.message().unwrap_or_else(|| fallback.to_string());
        return ApiError::AuthenticationFailure(message);
    }
    ApiError::from_status(status, body)
}
