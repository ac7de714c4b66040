// netscope-probe: reference-server selection and parallel-stream
// bandwidth/latency measurement.
//
// The probe speaks a small HTTP contract against each candidate server:
// `GET {base}/ping` for the latency handshake, `GET {base}/download` for
// pull streams, `POST {base}/upload` for push streams. Server discovery
// policy beyond "measure and pick lowest latency" lives with the caller.

pub mod directory;
pub mod error;
pub mod probe;
mod transfer;

pub use directory::{DirectorySource, SelectedServer, ServerCandidate, ServerDirectory};
pub use error::{ProbeError, TransferPhase};
pub use probe::{BandwidthProbe, BandwidthResult, ProbeConfig};
