// ── Domain model ──
//
// Point-in-time value types with no persisted identity. Everything here is
// `Serialize`/`Deserialize` so the presentation layer can consume snapshots
// as read-only data.

pub mod link;
pub mod peer;
pub mod snapshot;

pub use link::{InterfaceCounters, LinkInfo, UNKNOWN_ADDRESS};
pub use peer::{MacAddress, PeerRecord};
pub use snapshot::DiagnosticsSnapshot;
