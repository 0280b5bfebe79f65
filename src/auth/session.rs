// Allow dead code: Infrastructure methods for future use
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, TokenPair};
use crate::auth::token;

/// Session file name in data directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        token::is_expired(&self.access_token, Utc::now())
    }
}

/// Persisted token pair. The file plays the role the original deployment
/// gave to browser local storage: two strings, read at startup, cleared on
/// sign-out.
pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns true if a session was found.
    /// An expired access token is still loaded - the refresh token may be
    /// good, and the guard will exchange it on first use.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;
            self.data = Some(data);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

/// Shared session context handed to every data-fetching collaborator.
///
/// `bearer()` is the one gate in front of protected requests: it checks the
/// stored token's embedded expiry and exchanges the refresh token when
/// needed. The check and the exchange happen under one async lock, so N
/// concurrent callers produce at most one refresh request.
#[derive(Clone)]
pub struct SessionGuard {
    api: ApiClient,
    session: Arc<Mutex<Session>>,
}

impl SessionGuard {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Return a currently-valid access token, refreshing it first if the
    /// stored one is missing or past its embedded expiry.
    ///
    /// A failed refresh is fatal: the persisted session is cleared and the
    /// caller gets `SessionExpired`, which the app maps to the sign-in
    /// overlay. Network and HTTP failures are deliberately not distinguished
    /// here - either way the console cannot proceed without new credentials.
    pub async fn bearer(&self) -> Result<String, ApiError> {
        let mut session = self.session.lock().await;

        let data = match session.data.as_ref() {
            Some(data) => data,
            None => return Err(ApiError::SessionExpired),
        };

        if !data.is_expired() {
            return Ok(data.access_token.clone());
        }

        debug!("Access token expired, exchanging refresh token");
        let refresh_token = data.refresh_token.clone();

        match self.api.refresh(&refresh_token).await {
            Ok(pair) => {
                if let Some(data) = session.data.as_mut() {
                    data.access_token = pair.access_token.clone();
                    if let Some(new_refresh) = pair.refresh_token {
                        data.refresh_token = new_refresh;
                    }
                }
                if let Err(e) = session.save() {
                    warn!(error = %e, "Failed to persist refreshed session");
                }
                info!("Access token refreshed");
                Ok(pair.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(e) = session.clear() {
                    warn!(error = %e, "Failed to clear session file");
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Exchange username/password for a token pair and persist it.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let pair = self.api.sign_in(username, password).await?;

        let mut session = self.session.lock().await;
        session.data = Some(SessionData {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token.unwrap_or_default(),
            username: username.to_string(),
            signed_in_at: Utc::now(),
        });
        if let Err(e) = session.save() {
            warn!(error = %e, "Failed to persist session");
        }
        info!(username, "Signed in");
        Ok(())
    }

    /// Drop the stored token pair and delete the session file.
    pub async fn sign_out(&self) {
        let mut session = self.session.lock().await;
        if let Err(e) = session.clear() {
            warn!(error = %e, "Failed to clear session file");
        }
        info!("Signed out");
    }

    /// True if a token pair is stored. The access token may still be
    /// expired - bearer() handles that transparently.
    pub async fn is_signed_in(&self) -> bool {
        self.session.lock().await.data.is_some()
    }

    pub async fn username(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .data
            .as_ref()
            .map(|d| d.username.clone())
    }

    /// Apply a freshly issued token pair (used by the headless export path,
    /// which signs in outside the TUI).
    pub async fn adopt(&self, pair: TokenPair, username: &str) {
        let mut session = self.session.lock().await;
        session.data = Some(SessionData {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token.unwrap_or_default(),
            username: username.to_string(),
            signed_in_at: Utc::now(),
        });
        if let Err(e) = session.save() {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tapdeck-test-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn sample_data() -> SessionData {
        SessionData {
            access_token: "a.b.c".to_string(),
            refresh_token: "refresh".to_string(),
            username: "admin".to_string(),
            signed_in_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_missing_session() {
        let mut session = Session::new(temp_dir("missing"));
        assert!(!session.load().unwrap());
        assert!(session.data.is_none());
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = temp_dir("roundtrip");
        let mut session = Session::new(dir.clone());
        session.data = Some(sample_data());
        session.save().unwrap();

        let mut reloaded = Session::new(dir.clone());
        assert!(reloaded.load().unwrap());
        let data = reloaded.data.as_ref().unwrap();
        assert_eq!(data.username, "admin");
        assert_eq!(data.refresh_token, "refresh");

        reloaded.clear().unwrap();
        assert!(reloaded.data.is_none());
        let mut again = Session::new(dir.clone());
        assert!(!again.load().unwrap());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_undecodable_token_counts_as_expired() {
        // Forces a refresh attempt instead of sending a doomed request
        assert!(sample_data().is_expired());
    }
}
