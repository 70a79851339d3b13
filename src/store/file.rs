// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file credential store.
//!
//! Writes go to a temporary file in the same directory which is fsynced and
//! then renamed over the target, so the file always holds either the old or
//! the new session in full.

use crate::error::ApiError;
use crate::store::{CredentialStore, StoredSession};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Credential store backed by a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes writers within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf, ApiError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ApiError::Storage(format!("Invalid session path: {:?}", self.path)))?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }

    /// Serialize and write `session`. Callers hold `write_lock`.
    fn write_session(&self, session: &StoredSession) -> Result<(), ApiError> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ApiError::Storage(format!("Failed to serialize session: {}", e)))?;

        self.write_atomic(&json).map_err(|e| {
            ApiError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn write_atomic(&self, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self
            .temp_path()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // Tokens are secrets
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ApiError::Storage(format!("Corrupt session file: {}", e)))
    }

    fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.write_session(session)
    }

    fn update_if_current(
        &self,
        refresh_token: &str,
        update: &dyn Fn(&mut StoredSession),
    ) -> Result<bool, ApiError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match self.load()? {
            Some(mut session) if session.refresh_token == refresh_token => {
                update(&mut session);
                self.write_session(&session)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn clear(&self) -> Result<(), ApiError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
