//! Best-effort remote mirror of the save blob.
//!
//! The mirror is a plain HTTP key/value endpoint: GET fetches the blob
//! for an account, PUT replaces it. Every call is wrapped in a short
//! timeout and a small retry loop so a dead endpoint degrades the app to
//! local-only instead of hanging it.

use crate::constants::{REMOTE_BACKOFF_BASE_SECONDS, REMOTE_MAX_RETRIES, REMOTE_TIMEOUT_SECONDS};
use crate::core::player::PlayerState;
use crate::local_store::sanitize_username;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum RemoteError {
    /// The endpoint answered with a non-success status.
    Http(u16),
    /// The request never completed (DNS, connect, timeout, TLS).
    Transport(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Http(status) => write!(f, "remote returned HTTP {}", status),
            RemoteError::Transport(msg) => write!(f, "remote unreachable: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => RemoteError::Http(code),
            ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct RemoteStore {
    agent: ureq::Agent,
    base_url: String,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECONDS))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn state_url(&self, username: &str) -> String {
        format!("{}/state/{}", self.base_url, sanitize_username(username))
    }

    /// Fetches the remote blob for an account. `Ok(None)` means the
    /// account has never been mirrored.
    pub fn fetch_state(&self, username: &str) -> Result<Option<PlayerState>, RemoteError> {
        let result = self.with_retries(|| {
            self.agent
                .get(&self.state_url(username))
                .set("User-Agent", "arise")
                .call()
        });
        match result {
            Ok(response) => {
                let state: PlayerState = response
                    .into_json()
                    .map_err(|e| RemoteError::Transport(e.to_string()))?;
                Ok(Some(state))
            }
            Err(RemoteError::Http(404)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces the remote blob for an account.
    pub fn push_state(&self, state: &PlayerState) -> Result<(), RemoteError> {
        let json = serde_json::to_string(state)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        self.with_retries(|| {
            self.agent
                .put(&self.state_url(&state.username))
                .set("User-Agent", "arise")
                .set("Content-Type", "application/json")
                .send_string(&json)
        })?;
        Ok(())
    }

    /// Removes the remote blob. Used by the termination protocol; a
    /// blob that was never mirrored is not an error.
    pub fn delete_state(&self, username: &str) -> Result<(), RemoteError> {
        let result = self.with_retries(|| {
            self.agent
                .delete(&self.state_url(username))
                .set("User-Agent", "arise")
                .call()
        });
        match result {
            Ok(_) | Err(RemoteError::Http(404)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Runs a request with linear backoff. Client errors (4xx) are not
    /// retried; they will not get better.
    fn with_retries<F>(&self, mut request: F) -> Result<ureq::Response, RemoteError>
    where
        F: FnMut() -> Result<ureq::Response, ureq::Error>,
    {
        let mut attempt = 0u32;
        loop {
            match request() {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let err = RemoteError::from(err);
                    let retryable = match err {
                        RemoteError::Http(code) => code >= 500,
                        RemoteError::Transport(_) => true,
                    };
                    if !retryable || attempt >= REMOTE_MAX_RETRIES {
                        return Err(err);
                    }
                    attempt += 1;
                    std::thread::sleep(Duration::from_secs(
                        REMOTE_BACKOFF_BASE_SECONDS * attempt as u64,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_url_sanitizes_username() {
        let store = RemoteStore::new("https://mirror.example/api/");
        assert_eq!(
            store.state_url("Jin Woo"),
            "https://mirror.example/api/state/jin_woo"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let a = RemoteStore::new("https://mirror.example/api");
        let b = RemoteStore::new("https://mirror.example/api/");
        assert_eq!(a.state_url("h"), b.state_url("h"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(RemoteError::Http(503).to_string(), "remote returned HTTP 503");
        assert!(RemoteError::Transport("timed out".to_string())
            .to_string()
            .contains("timed out"));
    }
}
