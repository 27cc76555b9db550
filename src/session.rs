//! Explicit session context and its persisted store.
//!
//! The session holds the bearer credential and the viewer's identity. It is
//! loaded once when a session starts and saved when it ends; components that
//! need the credential receive the `Session` by reference.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The viewer's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(rename = "profileImage", default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl Session {
    /// An authenticated session for `uid`.
    #[must_use]
    pub fn authenticated(uid: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            uid: Some(uid.into()),
            ..Self::default()
        }
    }

    /// The credential, if one is stored and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The viewer's uid, if logged in.
    #[must_use]
    pub fn viewer_uid(&self) -> Option<&str> {
        self.uid.as_deref().filter(|u| !u.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.viewer_uid().is_some() && self.token().is_some()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// JSON file holding the session under fixed keys.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Session> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored session");
                return Ok(Session::default());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)).with_context(|| {
                    format!("Failed to read session file: {}", self.path.display())
                });
            }
        };

        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse session file: {}", self.path.display()))
    }

    /// Persist the session, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_vec_pretty(session).context("Failed to serialize session")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }
}
