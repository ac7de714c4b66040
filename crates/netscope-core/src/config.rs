// ── Runtime session configuration ──
//
// Built by the caller and handed to `DiagnosticsSession` — the core never
// reads configuration from disk.

use std::time::Duration;

use netscope_probe::ProbeConfig;

/// Configuration for one diagnostics session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Label for the topology hub node. Purely presentational — no subnet
    /// semantics are attached to it.
    pub hub_label: String,
    /// Timeout for each platform command invocation.
    pub command_timeout: Duration,
    /// Bandwidth probe tuning, including the server directory.
    pub probe: ProbeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hub_label: "Host".into(),
            command_timeout: Duration::from_secs(5),
            probe: ProbeConfig::default(),
        }
    }
}
