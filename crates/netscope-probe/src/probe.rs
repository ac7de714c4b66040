// ── BandwidthProbe ──
//
// Full probe pipeline: resolve the server directory, select the
// lowest-latency candidate, then run the download and upload phases
// sequentially (parallel phases would contend with each other and bias
// both measurements downward). The latency measured at selection time is
// reported as the probe's ping.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::directory::{self, DirectorySource, SelectedServer, ServerDirectory};
use crate::error::ProbeError;
use crate::transfer;

/// Completed probe measurement. Created once per run, immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthResult {
    /// Aggregate download rate, decimal megabits per second, two decimals.
    pub download_mbps: f64,
    /// Aggregate upload rate, decimal megabits per second, two decimals.
    pub upload_mbps: f64,
    /// Round-trip latency to the selected server, milliseconds.
    pub ping_ms: f64,
    /// Identifier of the server the transfer actually ran against.
    pub server_id: String,
}

/// Probe tuning. Built by the caller and handed in; the probe never reads
/// configuration from disk.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Where candidate servers come from.
    pub directory: DirectorySource,
    /// Concurrent streams per transfer phase.
    pub streams_per_phase: usize,
    /// Fixed measurement window per transfer phase.
    pub transfer_window: Duration,
    /// Per-candidate latency handshake timeout.
    pub latency_timeout: Duration,
    /// TCP connect timeout for all probe requests.
    pub connect_timeout: Duration,
    /// Size of each generated upload chunk.
    pub upload_chunk_bytes: usize,
}

impl ProbeConfig {
    pub fn new(directory: DirectorySource) -> Self {
        Self {
            directory,
            streams_per_phase: 4,
            transfer_window: Duration::from_secs(10),
            latency_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
            upload_chunk_bytes: 256 * 1024,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new(DirectorySource::Static(Vec::new()))
    }
}

/// End-to-end bandwidth/latency probe against a reference server.
pub struct BandwidthProbe {
    http: reqwest::Client,
    config: ProbeConfig,
}

impl BandwidthProbe {
    /// Build a probe with its own HTTP client.
    ///
    /// The client carries only a connect timeout — transfer requests are
    /// bounded by the phase deadline, not a per-request timeout, since a
    /// download stream is expected to run for the whole window.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent("netscope-probe/0.1.0")
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one full probe: select, download, upload.
    ///
    /// Cancellation at any point winds down in-flight streams, discards
    /// partial counts, and reports [`ProbeError::Cancelled`] — a cancelled
    /// probe never yields a [`BandwidthResult`].
    pub async fn run(&self, cancel: &CancellationToken) -> Result<BandwidthResult, ProbeError> {
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let selected = self.select_server(cancel).await?;
        let download_url = directory::endpoint(&selected.candidate.url, "download")?;
        let upload_url = directory::endpoint(&selected.candidate.url, "upload")?;

        let download = transfer::run_download_phase(
            &self.http,
            &download_url,
            self.config.streams_per_phase,
            self.config.transfer_window,
            cancel,
        )
        .await?;
        debug!(
            bytes = download.bytes,
            elapsed_ms = download.elapsed.as_millis(),
            "download phase complete"
        );

        let upload = transfer::run_upload_phase(
            &self.http,
            &upload_url,
            self.config.streams_per_phase,
            self.config.transfer_window,
            self.config.upload_chunk_bytes,
            cancel,
        )
        .await?;
        debug!(
            bytes = upload.bytes,
            elapsed_ms = upload.elapsed.as_millis(),
            "upload phase complete"
        );

        let result = BandwidthResult {
            download_mbps: to_mbps(download.bytes, download.elapsed),
            upload_mbps: to_mbps(upload.bytes, upload.elapsed),
            ping_ms: selected.latency.as_secs_f64() * 1000.0,
            server_id: selected.candidate.id,
        };
        info!(
            download_mbps = result.download_mbps,
            upload_mbps = result.upload_mbps,
            ping_ms = result.ping_ms,
            server = %result.server_id,
            "probe complete"
        );
        Ok(result)
    }

    /// Resolve the directory and pick the lowest-latency candidate.
    async fn select_server(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SelectedServer, ProbeError> {
        let candidates = ServerDirectory::new(self.config.directory.clone())
            .candidates(&self.http)
            .await?;
        directory::select_lowest_latency(
            &self.http,
            &candidates,
            self.config.latency_timeout,
            cancel,
        )
        .await
    }
}

/// Convert a byte count over a wall-clock window into decimal megabits per
/// second (10^6 divisor, never 2^20), rounded to two decimals. The decimal
/// convention matches common speed-test reporting.
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub(crate) fn to_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    let mbps = (bytes as f64 * 8.0) / secs / 1_000_000.0;
    (mbps * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn mbps_uses_decimal_megabit_convention() {
        // 125,000,000 bytes over 10 s is exactly 100 Mbps decimal.
        let rate = to_mbps(125_000_000, Duration::from_secs(10));
        assert_eq!(rate, 100.00);
    }

    #[test]
    fn mbps_rounds_to_two_decimals() {
        // 1,000,000 bytes over 3 s = 2.666... Mbps -> 2.67.
        let rate = to_mbps(1_000_000, Duration::from_secs(3));
        assert_eq!(rate, 2.67);
    }

    #[test]
    fn mbps_zero_window_is_zero() {
        assert_eq!(to_mbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn config_defaults_are_bounded() {
        let cfg = ProbeConfig::default();
        assert!(cfg.streams_per_phase >= 1);
        assert!(!cfg.transfer_window.is_zero());
        assert!(!cfg.latency_timeout.is_zero());
    }
}
