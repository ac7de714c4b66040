// ── Diagnostics snapshot ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use netscope_probe::BandwidthResult;

use crate::model::{LinkInfo, PeerRecord};
use crate::topology::TopologyGraph;

/// Immutable aggregation of one diagnostics cycle.
///
/// Constructed fresh on every discovery or probe cycle and never mutated
/// afterwards — the session replaces its current snapshot wholesale. The
/// bandwidth slot carries the last *completed* probe, which may predate
/// the link/peer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub link: LinkInfo,
    /// Discovered peers in discovery order (drives topology labeling).
    pub peers: Vec<PeerRecord>,
    /// Star topology derived from `peers`.
    pub topology: TopologyGraph,
    /// Last completed bandwidth probe, if any.
    pub bandwidth: Option<Arc<BandwidthResult>>,
    /// Non-fatal degradation notices (e.g. neighbor table unavailable).
    pub advisories: Vec<String>,
    pub captured_at: DateTime<Utc>,
}
