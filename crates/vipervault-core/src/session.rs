//! File-backed session store for `ViperVault`.
//!
//! One JSON file per session under the session directory. A session is
//! valid until its absolute duration or its inactivity timeout elapses,
//! whichever comes first; validation bumps the activity timestamp.
//!
//! # Security model
//!
//! - Tokens are 32 bytes of OS CSPRNG randomness, URL-safe base64
//!   without padding. The plaintext token lives only in the client's
//!   cookie.
//! - On disk the file is named by `SHA-256(token)` — the plaintext
//!   token is never persisted.
//! - The session directory is created with mode `0o700` and session
//!   files with `0o600` on Unix.
//! - Expired and corrupted session files are deleted on sight.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::SessionError;

/// A stored session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    /// When the session was created (UNIX seconds).
    created: i64,
    /// Last validated activity (UNIX seconds).
    last_activity: i64,
}

/// Manages session creation, validation, destruction, and sweeping.
pub struct SessionStore {
    /// Directory holding one JSON file per session.
    dir: PathBuf,
    /// Absolute session lifetime in seconds.
    session_duration_secs: u64,
    /// Idle session lifetime in seconds.
    inactivity_timeout_secs: u64,
}

impl SessionStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on the first session write.
    #[must_use]
    pub fn new(
        dir: impl AsRef<Path>,
        session_duration_secs: u64,
        inactivity_timeout_secs: u64,
    ) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            session_duration_secs,
            inactivity_timeout_secs,
        }
    }

    /// Create a new session and return the plaintext token.
    ///
    /// Sweeps expired sessions as a side effect, so abandoned files do
    /// not accumulate between logins.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Directory`] if the session directory cannot be
    ///   created or secured.
    /// - [`SessionError::Write`] if the session file cannot be written.
    pub async fn create(&self) -> Result<String, SessionError> {
        self.ensure_dir().await?;
        self.sweep().await;

        let token = new_token();
        let now = Utc::now().timestamp();
        let record = SessionRecord {
            created: now,
            last_activity: now,
        };

        self.write_record(&token, &record).await?;

        info!("session created");
        Ok(token)
    }

    /// Validate a token, bumping its activity timestamp.
    ///
    /// Returns `false` for missing, unreadable, or expired sessions.
    /// Expired sessions are deleted before returning.
    pub async fn validate(&self, token: &str) -> bool {
        let path = self.session_path(token);

        let Ok(bytes) = tokio::fs::read(&path).await else {
            return false;
        };
        let Ok(mut record) = serde_json::from_slice::<SessionRecord>(&bytes) else {
            // Corrupted record — treat as invalid and remove.
            let _ = tokio::fs::remove_file(&path).await;
            return false;
        };

        let now = Utc::now().timestamp();
        if self.is_expired(&record, now) {
            let _ = tokio::fs::remove_file(&path).await;
            debug!("expired session rejected");
            return false;
        }

        record.last_activity = now;
        if self.write_record(token, &record).await.is_err() {
            // The session is still valid even if the bump failed; the
            // inactivity clock just doesn't advance this request.
            debug!("failed to bump session activity");
        }
        true
    }

    /// Delete a session (best effort — a missing file is fine).
    pub async fn destroy(&self, token: &str) {
        let _ = tokio::fs::remove_file(self.session_path(token)).await;
        info!("session destroyed");
    }

    /// Remove expired and corrupted session files.
    ///
    /// Returns the number of files removed. All failures are swallowed:
    /// sweeping is housekeeping, never a reason to fail a request.
    pub async fn sweep(&self) -> usize {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return 0;
        };

        let now = Utc::now().timestamp();
        let mut removed = 0usize;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let stale = match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<SessionRecord>(&bytes) {
                    Ok(record) => self.is_expired(&record, now),
                    Err(_) => true, // corrupted
                },
                Err(_) => true, // unreadable
            };

            if stale && tokio::fs::remove_file(&path).await.is_ok() {
                removed = removed.saturating_add(1);
            }
        }

        if removed > 0 {
            info!(removed, "swept stale sessions");
        }
        removed
    }

    fn is_expired(&self, record: &SessionRecord, now: i64) -> bool {
        let age = now.saturating_sub(record.created);
        let idle = now.saturating_sub(record.last_activity);
        age > i64::try_from(self.session_duration_secs).unwrap_or(i64::MAX)
            || idle > i64::try_from(self.inactivity_timeout_secs).unwrap_or(i64::MAX)
    }

    fn session_path(&self, token: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_token(token)))
    }

    async fn write_record(
        &self,
        token: &str,
        record: &SessionRecord,
    ) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec(record).map_err(|e| SessionError::Write {
            reason: format!("session serialization failed: {e}"),
        })?;

        let path = self.session_path(token);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| SessionError::Write {
                reason: format!("write to '{}' failed: {e}", path.display()),
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await;
        }

        Ok(())
    }

    async fn ensure_dir(&self) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SessionError::Directory {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(|e| SessionError::Directory {
                    path: self.dir.display().to_string(),
                    reason: format!("chmod failed: {e}"),
                })?;
        }

        Ok(())
    }
}

/// Generate a fresh session token: 32 bytes of OS CSPRNG randomness,
/// URL-safe base64 without padding.
#[must_use]
pub fn new_token() -> String {
    // Two UUID v4s = 32 bytes of OS CSPRNG randomness.
    let a = uuid::Uuid::new_v4();
    let b = uuid::Uuid::new_v4();
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(a.as_bytes());
    bytes.extend_from_slice(b.as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a plaintext token with SHA-256, returning the hex-encoded hash.
#[must_use]
pub fn hash_token(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}
