// ── Parallel transfer phase engines ──
//
// Each phase drives a bounded set of worker streams against the selected
// server until a shared deadline. The workers share exactly two pieces of
// mutable state: an atomic byte accumulator and the deadline itself.
// Individual stream failures are absorbed — that stream just stops
// contributing — and the phase fails only when no stream at all could be
// established.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{ProbeError, TransferPhase};

/// Aggregate outcome of one transfer phase.
pub(crate) struct PhaseOutcome {
    /// Total bytes moved across all streams.
    pub bytes: u64,
    /// Wall-clock time the phase actually ran.
    pub elapsed: Duration,
}

/// Shared per-phase accounting handed to every worker.
struct PhaseShared {
    counter: AtomicU64,
    established: AtomicUsize,
}

/// Run the download phase: `streams` concurrent GET pullers until `window`
/// expires. Returns the byte/time aggregate, or a phase error when zero
/// streams could be established.
pub(crate) async fn run_download_phase(
    http: &reqwest::Client,
    url: &Url,
    streams: usize,
    window: Duration,
    cancel: &CancellationToken,
) -> Result<PhaseOutcome, ProbeError> {
    let shared = Arc::new(PhaseShared {
        counter: AtomicU64::new(0),
        established: AtomicUsize::new(0),
    });
    let started = Instant::now();
    let deadline = started + window;

    let workers: Vec<_> = (0..streams)
        .map(|stream_no| {
            let http = http.clone();
            let url = url.clone();
            let shared = Arc::clone(&shared);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                download_stream(&http, &url, deadline, &shared, &cancel, stream_no).await;
            })
        })
        .collect();

    futures_util::future::join_all(workers).await;

    finish_phase(TransferPhase::Download, &shared, started, cancel)
}

/// Run the upload phase: `streams` concurrent POST pushers of generated
/// payload chunks until `window` expires.
pub(crate) async fn run_upload_phase(
    http: &reqwest::Client,
    url: &Url,
    streams: usize,
    window: Duration,
    chunk_bytes: usize,
    cancel: &CancellationToken,
) -> Result<PhaseOutcome, ProbeError> {
    let shared = Arc::new(PhaseShared {
        counter: AtomicU64::new(0),
        established: AtomicUsize::new(0),
    });
    let payload = upload_payload(chunk_bytes);
    let started = Instant::now();
    let deadline = started + window;

    let workers: Vec<_> = (0..streams)
        .map(|stream_no| {
            let http = http.clone();
            let url = url.clone();
            let shared = Arc::clone(&shared);
            let cancel = cancel.clone();
            let payload = payload.clone();
            tokio::spawn(async move {
                upload_stream(&http, &url, deadline, &shared, &cancel, &payload, stream_no).await;
            })
        })
        .collect();

    futures_util::future::join_all(workers).await;

    finish_phase(TransferPhase::Upload, &shared, started, cancel)
}

/// Common phase epilogue: cancellation discards partial counts, zero
/// established streams escalates, otherwise report the aggregate.
fn finish_phase(
    phase: TransferPhase,
    shared: &PhaseShared,
    started: Instant,
    cancel: &CancellationToken,
) -> Result<PhaseOutcome, ProbeError> {
    if cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }
    if shared.established.load(Ordering::Acquire) == 0 {
        return Err(ProbeError::Phase { phase });
    }
    Ok(PhaseOutcome {
        bytes: shared.counter.load(Ordering::Acquire),
        elapsed: started.elapsed(),
    })
}

/// One download worker: request, pull body chunks, re-request on body end,
/// stop at the deadline or on cancellation. Errors end this worker only.
#[allow(clippy::as_conversions)]
async fn download_stream(
    http: &reqwest::Client,
    url: &Url,
    deadline: Instant,
    shared: &PhaseShared,
    cancel: &CancellationToken,
    stream_no: usize,
) {
    let mut marked_established = false;

    while Instant::now() < deadline && !cancel.is_cancelled() {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = sleep_until(deadline) => return,
            r = http.get(url.clone()).send() => r,
        };

        let resp = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(stream = stream_no, status = %resp.status(), "download stream rejected");
                return;
            }
            Err(e) => {
                debug!(stream = stream_no, error = %e, "download stream failed");
                return;
            }
        };

        if !marked_established {
            shared.established.fetch_add(1, Ordering::AcqRel);
            marked_established = true;
        }

        let mut body = resp.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = sleep_until(deadline) => return,
                c = body.next() => c,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    shared
                        .counter
                        .fetch_add(bytes.len() as u64, Ordering::AcqRel);
                }
                Some(Err(e)) => {
                    debug!(stream = stream_no, error = %e, "download stream stalled");
                    return;
                }
                // Body exhausted — loop around and request again.
                None => break,
            }
        }
    }
}

/// One upload worker: POST payload chunks until the deadline. A chunk
/// counts only once the server has accepted the whole request.
#[allow(clippy::as_conversions)]
async fn upload_stream(
    http: &reqwest::Client,
    url: &Url,
    deadline: Instant,
    shared: &PhaseShared,
    cancel: &CancellationToken,
    payload: &Bytes,
    stream_no: usize,
) {
    let mut marked_established = false;

    while Instant::now() < deadline && !cancel.is_cancelled() {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = sleep_until(deadline) => return,
            r = http.post(url.clone()).body(payload.clone()).send() => r,
        };

        match response {
            Ok(resp) if resp.status().is_success() => {
                if !marked_established {
                    shared.established.fetch_add(1, Ordering::AcqRel);
                    marked_established = true;
                }
                shared
                    .counter
                    .fetch_add(payload.len() as u64, Ordering::AcqRel);
            }
            Ok(resp) => {
                debug!(stream = stream_no, status = %resp.status(), "upload stream rejected");
                return;
            }
            Err(e) => {
                debug!(stream = stream_no, error = %e, "upload stream failed");
                return;
            }
        }
    }
}

/// Generate a payload chunk. A cycling byte pattern rather than zeroes so
/// transparent compression anywhere on the path cannot shrink it.
fn upload_payload(len: usize) -> Bytes {
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    let buf: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    Bytes::from(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upload_payload_has_requested_length() {
        assert_eq!(upload_payload(4096).len(), 4096);
        assert!(upload_payload(0).is_empty());
    }

    #[test]
    fn upload_payload_is_not_constant() {
        let payload = upload_payload(512);
        assert!(payload.iter().any(|&b| b != payload[0]));
    }
}
