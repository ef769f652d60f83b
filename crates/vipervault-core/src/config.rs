//! Viewer configuration for `ViperVault`.
//!
//! Loads a small JSON file describing the access password, session
//! lifetimes, and the named log views. Every view is normalized to the
//! same shape regardless of whether the admin wrote a bare command
//! string or a full object, and the view table is sorted
//! case-insensitively so the dropdown order is stable.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default access password (deliberately an obvious placeholder).
const DEFAULT_PASSWORD: &str = "correct horse battery staple";

/// Default per-view refresh interval in seconds.
const DEFAULT_REFRESH_SECS: u64 = 30;

/// Default absolute session lifetime in seconds (24 hours).
const DEFAULT_SESSION_DURATION_SECS: u64 = 86_400;

/// Default idle session lifetime in seconds (1 hour).
const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 3_600;

/// Default upper bound on a single command run, in seconds.
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;

/// A normalized log view entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogView {
    /// Shell command to run (executed via `sh -c`).
    pub cmd: String,
    /// Auto-refresh interval in seconds.
    pub refresh: u64,
    /// Whether command output is HTML-escaped before serving.
    pub safe_output: bool,
    /// Whether the client scrolls to the end after each refresh.
    pub bottom: bool,
}

/// Fully loaded and normalized viewer configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Access password compared at login.
    pub password: String,
    /// Absolute session lifetime in seconds.
    pub session_duration_secs: u64,
    /// Idle session lifetime in seconds.
    pub inactivity_timeout_secs: u64,
    /// Upper bound on a single command run, in seconds.
    pub command_timeout_secs: u64,
    /// Named views, sorted case-insensitively by name.
    views: Vec<(String, LogView)>,
}

/// Raw on-disk shape before normalization.
#[derive(Debug, Deserialize)]
struct RawConfig {
    password: Option<String>,
    refresh_interval: Option<u64>,
    session_duration: Option<u64>,
    inactivity_timeout: Option<u64>,
    command_timeout: Option<u64>,
    #[serde(default)]
    log_views: std::collections::HashMap<String, RawView>,
}

/// A view entry as the admin may write it: a bare command string or a
/// full object with per-view overrides.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawView {
    Command(String),
    Full {
        cmd: Option<String>,
        refresh: Option<u64>,
        safe_output: Option<bool>,
        bottom: Option<bool>,
    },
}

impl ViewerConfig {
    /// Load and normalize the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file is missing or unreadable.
    /// - [`ConfigError::Parse`] if the contents are not valid JSON.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ConfigError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let raw: RawConfig =
            serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let refresh_interval = raw.refresh_interval.unwrap_or(DEFAULT_REFRESH_SECS);

        let mut views: Vec<(String, LogView)> = raw
            .log_views
            .into_iter()
            .map(|(name, view)| {
                let normalized = match view {
                    RawView::Command(cmd) => LogView {
                        cmd,
                        refresh: refresh_interval,
                        safe_output: true,
                        bottom: true,
                    },
                    RawView::Full {
                        cmd,
                        refresh,
                        safe_output,
                        bottom,
                    } => LogView {
                        cmd: cmd.unwrap_or_default(),
                        refresh: refresh.unwrap_or(refresh_interval),
                        safe_output: safe_output.unwrap_or(true),
                        bottom: bottom.unwrap_or(true),
                    },
                };
                (name, normalized)
            })
            .collect();

        // Stable dropdown order.
        views.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()));

        Self {
            password: raw.password.unwrap_or_else(|| DEFAULT_PASSWORD.to_owned()),
            session_duration_secs: raw
                .session_duration
                .unwrap_or(DEFAULT_SESSION_DURATION_SECS),
            inactivity_timeout_secs: raw
                .inactivity_timeout
                .unwrap_or(DEFAULT_INACTIVITY_TIMEOUT_SECS),
            command_timeout_secs: raw
                .command_timeout
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            views,
        }
    }

    /// Look up a view by its exact name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&LogView> {
        self.views
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// All views in dropdown order.
    #[must_use]
    pub fn views(&self) -> &[(String, LogView)] {
        &self.views
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ViewerConfig {
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        ViewerConfig::from_raw(raw)
    }

    // ── normalization ────────────────────────────────────────────────

    #[test]
    fn bare_string_view_gets_defaults() {
        let cfg = parse(r#"{"log_views": {"syslog": "tail -n 100 /var/log/syslog"}}"#);
        let view = cfg.view("syslog").unwrap();
        assert_eq!(view.cmd, "tail -n 100 /var/log/syslog");
        assert_eq!(view.refresh, 30);
        assert!(view.safe_output);
        assert!(view.bottom);
    }

    #[test]
    fn object_view_keeps_overrides() {
        let cfg = parse(
            r#"{"log_views": {"auth": {"cmd": "journalctl -u ssh", "refresh": 5, "safe_output": false, "bottom": false}}}"#,
        );
        let view = cfg.view("auth").unwrap();
        assert_eq!(view.cmd, "journalctl -u ssh");
        assert_eq!(view.refresh, 5);
        assert!(!view.safe_output);
        assert!(!view.bottom);
    }

    #[test]
    fn object_view_inherits_global_refresh() {
        let cfg = parse(r#"{"refresh_interval": 12, "log_views": {"a": {"cmd": "uptime"}}}"#);
        assert_eq!(cfg.view("a").unwrap().refresh, 12);
    }

    #[test]
    fn object_view_without_cmd_is_empty() {
        let cfg = parse(r#"{"log_views": {"a": {"refresh": 9}}}"#);
        assert_eq!(cfg.view("a").unwrap().cmd, "");
    }

    #[test]
    fn views_sorted_case_insensitively() {
        let cfg = parse(r#"{"log_views": {"Zebra": "z", "apple": "a", "Mango": "m"}}"#);
        let names: Vec<&str> = cfg.views().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["apple", "Mango", "Zebra"]);
    }

    #[test]
    fn unknown_view_is_none() {
        let cfg = parse(r#"{"log_views": {"a": "uptime"}}"#);
        assert!(cfg.view("b").is_none());
    }

    // ── defaults ─────────────────────────────────────────────────────

    #[test]
    fn empty_config_gets_all_defaults() {
        let cfg = parse("{}");
        assert_eq!(cfg.password, DEFAULT_PASSWORD);
        assert_eq!(cfg.session_duration_secs, 86_400);
        assert_eq!(cfg.inactivity_timeout_secs, 3_600);
        assert_eq!(cfg.command_timeout_secs, 60);
        assert!(cfg.views().is_empty());
    }

    #[test]
    fn explicit_timeouts_override_defaults() {
        let cfg = parse(
            r#"{"password": "pw", "session_duration": 600, "inactivity_timeout": 60, "command_timeout": 5}"#,
        );
        assert_eq!(cfg.password, "pw");
        assert_eq!(cfg.session_duration_secs, 600);
        assert_eq!(cfg.inactivity_timeout_secs, 60);
        assert_eq!(cfg.command_timeout_secs, 5);
    }

    // ── file loading ─────────────────────────────────────────────────

    #[tokio::test]
    async fn load_missing_file_is_read_error() {
        let err = ViewerConfig::load("/nonexistent/vipervault.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn load_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vipervault.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ViewerConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vipervault.json");
        std::fs::write(
            &path,
            r#"{"password": "hunter2", "log_views": {"uptime": "uptime"}}"#,
        )
        .unwrap();

        let cfg = ViewerConfig::load(&path).await.unwrap();
        assert_eq!(cfg.password, "hunter2");
        assert_eq!(cfg.views().len(), 1);
    }
}
