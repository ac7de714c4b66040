// ── Core error types ──
//
// Only hard failures live here. Parse gaps in platform command output are
// never errors — providers absorb them into absent fields — and a missing
// neighbor table degrades into an empty report with an advisory. What
// remains is the command adapter's own failure modes plus probe failures
// bubbling up through the session.

use thiserror::Error;

use netscope_probe::ProbeError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Platform command adapter ─────────────────────────────────────
    #[error("Platform command unavailable: {program} ({reason})")]
    CommandUnavailable { program: String, reason: String },

    #[error("Platform command timed out after {timeout_secs}s: {program}")]
    CommandTimeout { program: String, timeout_secs: u64 },

    // ── Bandwidth probe (wrapped, surfaced as-is) ────────────────────
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl CoreError {
    /// The underlying probe error, if this came from a bandwidth probe.
    pub fn probe(&self) -> Option<&ProbeError> {
        match self {
            Self::Probe(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` for the explicit probe cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Probe(e) if e.is_cancelled())
    }
}
