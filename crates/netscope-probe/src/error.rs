use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which transfer phase of a probe failed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferPhase {
    Download,
    Upload,
}

/// Top-level error type for the `netscope-probe` crate.
///
/// Individual stream failures during a transfer phase are absorbed (the
/// stream simply contributes fewer bytes) and never appear here; only
/// whole-phase and whole-probe failures are surfaced.
#[derive(Debug, Error)]
pub enum ProbeError {
    // ── Server selection ────────────────────────────────────────────
    /// No candidate answered the latency handshake within its timeout.
    #[error("No reachable reference server among {candidates} candidate(s)")]
    NoServerReachable { candidates: usize },

    /// The server directory could not be fetched or decoded.
    #[error("Server directory error: {message}")]
    Directory { message: String },

    // ── Transfer ────────────────────────────────────────────────────
    /// A transfer phase could not establish a single stream.
    #[error("Could not establish any {phase} stream")]
    Phase { phase: TransferPhase },

    // ── Lifecycle ───────────────────────────────────────────────────
    /// The probe was cancelled before producing a result. Partial byte
    /// counts are discarded; this is distinct from a phase failure.
    #[error("Probe cancelled")]
    Cancelled,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error outside a transfer phase (client setup,
    /// directory fetch plumbing).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ProbeError {
    /// Returns `true` for the explicit cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The transfer phase that failed, if this is a phase error.
    pub fn failed_phase(&self) -> Option<TransferPhase> {
        match self {
            Self::Phase { phase } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(TransferPhase::Download.to_string(), "download");
        assert_eq!(TransferPhase::Upload.to_string(), "upload");
    }

    #[test]
    fn failed_phase_extraction() {
        let err = ProbeError::Phase {
            phase: TransferPhase::Upload,
        };
        assert_eq!(err.failed_phase(), Some(TransferPhase::Upload));
        assert!(ProbeError::Cancelled.failed_phase().is_none());
    }
}
