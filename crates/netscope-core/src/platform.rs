// ── Platform command adapter ──
//
// The single seam between the diagnostics engine and OS-specific tooling.
// Providers depend only on the narrow `CommandRunner` contract (program +
// args in, normalized text + exit code out), so their parsing logic is
// unit-testable against recorded fixture output with no subprocess at all.

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

/// Wireless interface status query. The parser in [`crate::link`] consumes
/// the normalized line-oriented output; on hosts without this binary the
/// provider degrades to an all-absent link snapshot.
pub(crate) const WIRELESS_STATUS: (&str, &[&str]) = ("netsh", &["wlan", "show", "interfaces"]);

/// Address-resolution table dump, common to Windows and Unix.
pub(crate) const NEIGHBOR_TABLE: (&str, &[&str]) = ("arp", &["-a"]);

/// Interface-wide traffic statistics (cumulative byte counters).
pub(crate) const INTERFACE_COUNTERS: (&str, &[&str]) = ("netstat", &["-e"]);

/// Captured output of one platform command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Stdout decoded lossily — platform tools occasionally emit
    /// locale-dependent bytes and a replacement character must not abort
    /// a diagnostics pass.
    pub stdout: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Narrow subprocess contract the providers depend on.
pub trait CommandRunner: Send + Sync {
    /// Run a platform command to completion and capture its output.
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<CommandOutput, CoreError>> + Send;
}

/// Production runner backed by `tokio::process`, bounded by a short fixed
/// timeout so no diagnostics query can hang the caller.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<CommandOutput, CoreError>> + Send {
        let timeout = self.timeout;
        async move {
            // kill_on_drop so a timed-out query reclaims its subprocess
            // instead of leaving it running detached.
            let invocation = tokio::process::Command::new(program)
                .args(args)
                .kill_on_drop(true)
                .output();
            match tokio::time::timeout(timeout, invocation).await {
                Ok(Ok(output)) => Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                }),
                Ok(Err(e)) => Err(CoreError::CommandUnavailable {
                    program: program.to_owned(),
                    reason: e.to_string(),
                }),
                Err(_) => Err(CoreError::CommandTimeout {
                    program: program.to_owned(),
                    timeout_secs: timeout.as_secs(),
                }),
            }
        }
    }
}
