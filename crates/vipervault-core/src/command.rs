//! Shell command runner for `ViperVault`.
//!
//! Runs an admin-configured command string via `sh -c` so pipes and
//! redirections work, capturing stdout and stderr. A failed or timed-out
//! command produces a report string shown in place of output — the
//! viewer must keep serving, whatever the command does.

use std::time::Duration;

use tokio::process::Command;
use tracing::warn;

use crate::error::CommandError;

/// Conventional exit code for a timed-out command (as `timeout(1)` uses).
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Runs configured commands with a fixed per-run timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    /// Create a runner with the given per-run timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run a command string and return its output as text.
    ///
    /// - Exit 0: stdout, decoded lossily as UTF-8.
    /// - Non-zero exit: a report with stderr and the exit code.
    /// - Timeout: the child is killed and a report with code 124 is
    ///   returned.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Spawn`] if the shell cannot be started.
    /// - [`CommandError::Wait`] if collecting the output fails.
    pub async fn run(&self, cmd: &str) -> Result<String, CommandError> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Dropping the timed-out future must reap the child.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandError::Wait {
                    reason: e.to_string(),
                });
            }
            Err(_elapsed) => {
                warn!(timeout_secs = self.timeout.as_secs(), "command timed out");
                return Ok(format!(
                    "Error running command: timed out after {}s\nReturn code: {TIMEOUT_EXIT_CODE}",
                    self.timeout.as_secs()
                ));
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            Ok(format!(
                "Error running command: {stderr}\nReturn code: {code}"
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn runner() -> CommandRunner {
        CommandRunner::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = runner().run("echo hello").await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn shell_pipes_work() {
        let out = runner().run("printf 'b\\na\\n' | sort").await.unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[tokio::test]
    async fn nonzero_exit_reports_stderr_and_code() {
        let out = runner()
            .run("echo oops 1>&2; exit 3")
            .await
            .unwrap();
        assert!(out.contains("oops"), "stderr missing: {out}");
        assert!(out.contains("Return code: 3"), "code missing: {out}");
    }

    #[tokio::test]
    async fn failing_command_does_not_error() {
        let out = runner().run("false").await.unwrap();
        assert!(out.contains("Return code: 1"));
    }

    #[tokio::test]
    async fn timeout_kills_and_reports_124() {
        let runner = CommandRunner::new(Duration::from_millis(100));
        let out = runner.run("sleep 30").await.unwrap();
        assert!(out.contains("timed out"), "no timeout report: {out}");
        assert!(out.contains("Return code: 124"));
    }
}
