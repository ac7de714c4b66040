// ── Wireless link snapshot ──

use serde::{Deserialize, Serialize};

/// Sentinel local address reported when resolution fails. Never an error —
/// a host with no usable route still gets a link snapshot.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Cumulative interface byte counters since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Point-in-time wireless association state. Created fresh per query.
///
/// Absent fields are legitimate — a link-state query can return partial
/// data (no associated network, driver without a signal readout) and that
/// is reported as `None`, never as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Associated network name, if any.
    pub network_name: Option<String>,
    /// Signal quality percentage, 0–100.
    pub signal_quality: Option<u8>,
    /// The host's own address, or [`UNKNOWN_ADDRESS`].
    pub local_address: String,
    /// Interface-wide traffic counters, if the statistics query works.
    pub counters: Option<InterfaceCounters>,
}
