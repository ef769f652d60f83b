//! Shared application state for the `ViperVault` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the normalized viewer
//! configuration, the session store, and the command runner.

use std::sync::Arc;

use vipervault_core::command::CommandRunner;
use vipervault_core::config::ViewerConfig;
use vipervault_core::session::SessionStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Normalized viewer configuration (password, timeouts, views).
    pub config: ViewerConfig,
    /// Session creation, validation, and sweeping.
    pub sessions: Arc<SessionStore>,
    /// Runs configured view commands.
    pub runner: CommandRunner,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[cfg(test)]
impl AppState {
    /// Build a state over a temporary session directory for route tests.
    #[allow(clippy::unwrap_used)]
    pub(crate) async fn for_tests(dir: &std::path::Path, json: &str) -> Arc<Self> {
        let path = dir.join("vipervault.json");
        tokio::fs::write(&path, json).await.unwrap();
        let config = ViewerConfig::load(&path).await.unwrap();
        Arc::new(Self {
            sessions: Arc::new(SessionStore::new(
                dir.join(".sessions"),
                config.session_duration_secs,
                config.inactivity_timeout_secs,
            )),
            runner: CommandRunner::new(std::time::Duration::from_secs(
                config.command_timeout_secs,
            )),
            cookie_secure: false,
            config,
        })
    }
}
