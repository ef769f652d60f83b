//! Error types for `vipervault-core`.
//!
//! Each variant carries enough context to diagnose the problem without a
//! debugger. Command errors never include the command's environment —
//! only the command string the admin already wrote into the config.

/// Errors from loading or normalizing the viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The configuration file is not valid JSON (or violates the schema).
    #[error("invalid JSON in config file '{path}': {reason}")]
    Parse { path: String, reason: String },
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session directory could not be created or secured.
    #[error("failed to prepare session directory '{path}': {reason}")]
    Directory { path: String, reason: String },

    /// A session record could not be written.
    #[error("failed to write session file: {reason}")]
    Write { reason: String },
}

/// Errors from running a configured command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The shell itself could not be spawned.
    #[error("failed to spawn shell for command: {reason}")]
    Spawn { reason: String },

    /// Waiting on the child process failed.
    #[error("failed to collect command output: {reason}")]
    Wait { reason: String },
}
