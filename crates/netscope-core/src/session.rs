// ── DiagnosticsSession ──
//
// Orchestrates the providers and the bandwidth probe, owns the single
// "current snapshot" and "last completed probe" slots, and serializes
// probe runs. Discovery results are never cached across calls — link and
// peer state is time-varying, so every snapshot re-queries the OS.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use netscope_probe::{BandwidthProbe, BandwidthResult};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::link::LinkInfoProvider;
use crate::model::DiagnosticsSnapshot;
use crate::neighbors::NeighborDiscoverer;
use crate::platform::{CommandRunner, SystemCommandRunner};
use crate::topology::TopologyBuilder;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Generic over the platform command runner
/// so the whole session is testable against recorded fixture output.
pub struct DiagnosticsSession<R> {
    inner: Arc<SessionInner<R>>,
}

impl<R> Clone for DiagnosticsSession<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<R> {
    config: SessionConfig,
    runner: R,
    probe: BandwidthProbe,
    /// Current snapshot, replaced wholesale each cycle.
    current: watch::Sender<Option<Arc<DiagnosticsSnapshot>>>,
    /// Last *completed* probe. Failed or cancelled probes never touch it.
    last_probe: watch::Sender<Option<Arc<BandwidthResult>>>,
    /// At most one probe in flight — concurrent callers queue here so two
    /// probes never contend with each other and bias both results.
    probe_gate: Mutex<()>,
    /// Session-wide cancellation; each probe run gets a child token.
    cancel: CancellationToken,
    /// Token for the probe currently in flight (child of `cancel`).
    probe_cancel: std::sync::Mutex<CancellationToken>,
}

impl DiagnosticsSession<SystemCommandRunner> {
    /// Session backed by real subprocess invocations.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let runner = SystemCommandRunner::new(config.command_timeout);
        Self::with_runner(runner, config)
    }
}

impl<R: CommandRunner> DiagnosticsSession<R> {
    /// Session with a caller-supplied command runner.
    pub fn with_runner(runner: R, config: SessionConfig) -> Result<Self, CoreError> {
        let probe = BandwidthProbe::new(config.probe.clone())?;
        let (current, _) = watch::channel(None);
        let (last_probe, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let probe_cancel = std::sync::Mutex::new(cancel.child_token());

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                runner,
                probe,
                current,
                last_probe,
                probe_gate: Mutex::new(()),
                cancel,
                probe_cancel,
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Produce a fresh snapshot: link and neighbor queries run
    /// concurrently, topology is derived from the peers, and the last
    /// completed probe result (if any) is carried along.
    ///
    /// Cheap relative to a probe; never fails — degradation shows up as
    /// absent fields and advisories.
    pub async fn snapshot(&self) -> Arc<DiagnosticsSnapshot> {
        let link_provider = LinkInfoProvider::new(&self.inner.runner);
        let discoverer = NeighborDiscoverer::new(&self.inner.runner);
        let (link, report) = tokio::join!(
            link_provider.current_link_info(),
            discoverer.discover_peers(),
        );

        if let Some(ref advisory) = report.advisory {
            warn!(advisory = %advisory, "discovery degraded");
        }

        let topology = TopologyBuilder::build_graph(&report.peers, &self.inner.config.hub_label);
        let snapshot = Arc::new(DiagnosticsSnapshot {
            link,
            peers: report.peers,
            topology,
            bandwidth: self.inner.last_probe.borrow().clone(),
            advisories: report.advisory.into_iter().collect(),
            captured_at: chrono::Utc::now(),
        });

        self.inner.current.send_replace(Some(Arc::clone(&snapshot)));
        debug!(
            peers = snapshot.peers.len(),
            degraded = !snapshot.advisories.is_empty(),
            "snapshot refreshed"
        );
        snapshot
    }

    /// Run a bandwidth probe, record it as the last completed probe, and
    /// return a fresh snapshot carrying the result.
    ///
    /// Concurrent calls are serialized — at most one probe is ever in
    /// flight on a session. A failed or cancelled probe propagates its
    /// error, leaves "last probe" untouched, and leaves the session fully
    /// usable for further snapshots.
    pub async fn run_probe_and_update(&self) -> Result<Arc<DiagnosticsSnapshot>, CoreError> {
        let _gate = self.inner.probe_gate.lock().await;

        let run_cancel = self.inner.cancel.child_token();
        *self
            .inner
            .probe_cancel
            .lock()
            .expect("probe cancel lock poisoned") = run_cancel.clone();

        let result = self.inner.probe.run(&run_cancel).await?;
        info!(server = %result.server_id, "probe recorded");
        self.inner.last_probe.send_replace(Some(Arc::new(result)));
        drop(_gate);

        Ok(self.snapshot().await)
    }

    /// The last completed probe result, if any.
    pub fn last_probe(&self) -> Option<Arc<BandwidthResult>> {
        self.inner.last_probe.borrow().clone()
    }

    /// Observe snapshot replacement (for a presentation layer).
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DiagnosticsSnapshot>>> {
        self.inner.current.subscribe()
    }

    /// Cancel the probe currently in flight, if any. Future probes are
    /// unaffected.
    pub fn cancel_probe(&self) {
        self.inner
            .probe_cancel
            .lock()
            .expect("probe cancel lock poisoned")
            .cancel();
    }

    /// Shut the session down: cancels any in-flight probe and every
    /// future one.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}
