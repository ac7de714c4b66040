//! Local network diagnostics engine.
//!
//! Gathers a point-in-time view of the host's network surroundings:
//! wireless association state, the set of directly reachable peers, a
//! star topology over those peers, and (on demand) an active bandwidth
//! measurement against an HTTP measurement server.
//!
//! [`DiagnosticsSession`] is the entry point. It owns the transient
//! state — the current [`DiagnosticsSnapshot`] and the last completed
//! [`BandwidthResult`] — and serializes probe runs so at most one is in
//! flight. Everything underneath is a read-only provider:
//!
//! - [`link::LinkInfoProvider`] — wireless name/signal plus the host's
//!   own address, degrading to absent fields on any failure.
//! - [`neighbors::NeighborDiscoverer`] — peer records parsed from the
//!   platform's address-resolution table.
//! - [`topology::TopologyBuilder`] — pure peer-set → star-graph
//!   transformation.
//!
//! The bandwidth probe itself lives in the `netscope-probe` crate; its
//! public types are re-exported here so most consumers depend on this
//! crate alone.

pub mod config;
pub mod error;
pub mod link;
pub mod model;
pub mod neighbors;
pub mod platform;
pub mod session;
pub mod topology;

pub use config::SessionConfig;
pub use error::CoreError;
pub use model::{
    DiagnosticsSnapshot, InterfaceCounters, LinkInfo, MacAddress, PeerRecord, UNKNOWN_ADDRESS,
};
pub use neighbors::DiscoveryReport;
pub use session::DiagnosticsSession;
pub use topology::{TopologyBuilder, TopologyGraph, TopologyNode};

pub use netscope_probe::{
    BandwidthProbe, BandwidthResult, DirectorySource, ProbeConfig, ProbeError, SelectedServer,
    ServerCandidate, ServerDirectory, TransferPhase,
};
