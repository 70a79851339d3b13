// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential storage.
//!
//! The access token, refresh token and user snapshot form one unit: they are
//! saved together and cleared together, so a reader never sees a token
//! without its user or the other way round.

pub mod file;

pub use file::FileStore;

use crate::error::ApiError;
use crate::models::User;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Everything persisted for a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Cached profile, used only until the fresh one is fetched
    pub user: User,
}

/// Durable storage for a [`StoredSession`].
///
/// Implementations must make `save` all-or-nothing.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, ApiError>;

    fn save(&self, session: &StoredSession) -> Result<(), ApiError>;

    /// Remove everything. Succeeds when nothing is stored.
    fn clear(&self) -> Result<(), ApiError>;

    fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.load()?.map(|s| s.access_token))
    }

    fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.load()?.map(|s| s.refresh_token))
    }

    /// Apply `update` to the stored session if it is still the one issued
    /// with `refresh_token`. Load, check and save happen under one lock.
    ///
    /// Returns `false` (and writes nothing) when no session or a different
    /// session is stored.
    fn update_if_current(
        &self,
        refresh_token: &str,
        update: &dyn Fn(&mut StoredSession),
    ) -> Result<bool, ApiError>;

    /// Swap in a refreshed access token, keeping the refresh token and user.
    fn replace_access_token(&self, refresh_token: &str, access_token: &str) -> Result<bool, ApiError> {
        self.update_if_current(refresh_token, &|session| {
            session.access_token = access_token.to_string();
        })
    }

    /// Swap in a fresh user snapshot, keeping the tokens.
    fn replace_user(&self, refresh_token: &str, user: &User) -> Result<bool, ApiError> {
        self.update_if_current(refresh_token, &|session| session.user = user.clone())
    }
}

/// In-process store; nothing survives the process. Used by tests and
/// short-lived tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn update_if_current(
        &self,
        refresh_token: &str,
        update: &dyn Fn(&mut StoredSession),
    ) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.as_mut() {
            Some(session) if session.refresh_token == refresh_token => {
                update(session);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
