// ── Reference server directory and selection ──
//
// A directory is either a static candidate list or a remote JSON document.
// Selection measures each candidate's round-trip latency with a lightweight
// handshake and keeps the lowest; ties go to the earlier list position so
// repeated runs over the same directory stay deterministic.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::error::ProbeError;

/// One measurement server candidate: base endpoint plus an opaque identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCandidate {
    /// Opaque identifier, reported back in `BandwidthResult::server_id`.
    pub id: String,
    /// Base URL; the probe appends `/ping`, `/download`, `/upload`.
    pub url: Url,
    /// Human-readable name (optional, presentation only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Where the candidate list comes from.
#[derive(Debug, Clone)]
pub enum DirectorySource {
    /// Caller-supplied list, used as-is.
    Static(Vec<ServerCandidate>),
    /// Remote JSON document: an array of [`ServerCandidate`] objects.
    Remote(Url),
}

/// Candidate directory facade.
#[derive(Debug, Clone)]
pub struct ServerDirectory {
    source: DirectorySource,
}

impl ServerDirectory {
    pub fn new(source: DirectorySource) -> Self {
        Self { source }
    }

    /// Resolve the candidate list, fetching it if the source is remote.
    ///
    /// An empty list is not an error here — selection reports
    /// [`ProbeError::NoServerReachable`] with a zero candidate count.
    pub async fn candidates(
        &self,
        http: &reqwest::Client,
    ) -> Result<Vec<ServerCandidate>, ProbeError> {
        match &self.source {
            DirectorySource::Static(list) => Ok(list.clone()),
            DirectorySource::Remote(url) => {
                debug!(url = %url, "fetching server directory");
                let resp = http.get(url.clone()).send().await.map_err(|e| {
                    ProbeError::Directory {
                        message: format!("fetch failed: {e}"),
                    }
                })?;
                if !resp.status().is_success() {
                    return Err(ProbeError::Directory {
                        message: format!("directory returned HTTP {}", resp.status()),
                    });
                }
                resp.json::<Vec<ServerCandidate>>()
                    .await
                    .map_err(|e| ProbeError::Directory {
                        message: format!("invalid directory document: {e}"),
                    })
            }
        }
    }
}

/// A candidate that won selection, with the latency measured at that time.
///
/// The latency is reported as the probe's ping — it is not re-measured,
/// keeping the reported value consistent with the server actually used.
#[derive(Debug, Clone)]
pub struct SelectedServer {
    pub candidate: ServerCandidate,
    pub latency: Duration,
}

/// Build a leaf endpoint under a candidate base URL.
pub(crate) fn endpoint(base: &Url, leaf: &str) -> Result<Url, ProbeError> {
    let joined = format!("{}/{leaf}", base.as_str().trim_end_matches('/'));
    Ok(Url::parse(&joined)?)
}

/// Measure one candidate's handshake latency. Unreachable candidates
/// (connect failure, error status, timeout) yield `None` and are skipped.
async fn measure_latency(
    http: &reqwest::Client,
    candidate: &ServerCandidate,
    timeout: Duration,
) -> Option<Duration> {
    let url = match endpoint(&candidate.url, "ping") {
        Ok(u) => u,
        Err(e) => {
            debug!(server = %candidate.id, error = %e, "bad candidate URL, skipping");
            return None;
        }
    };

    let started = Instant::now();
    match tokio::time::timeout(timeout, http.get(url).send()).await {
        Ok(Ok(resp)) if resp.status().is_success() => Some(started.elapsed()),
        Ok(Ok(resp)) => {
            debug!(server = %candidate.id, status = %resp.status(), "handshake rejected");
            None
        }
        Ok(Err(e)) => {
            debug!(server = %candidate.id, error = %e, "handshake failed");
            None
        }
        Err(_) => {
            debug!(server = %candidate.id, timeout_ms = timeout.as_millis(), "handshake timed out");
            None
        }
    }
}

/// Probe every candidate and return the lowest-latency reachable one.
///
/// Candidates are measured in list order; a later candidate replaces the
/// current best only on strictly lower latency (first-seen wins ties).
pub(crate) async fn select_lowest_latency(
    http: &reqwest::Client,
    candidates: &[ServerCandidate],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SelectedServer, ProbeError> {
    let mut best: Option<SelectedServer> = None;

    for candidate in candidates {
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }
        let Some(latency) = measure_latency(http, candidate, timeout).await else {
            continue;
        };
        debug!(server = %candidate.id, latency_ms = latency.as_millis(), "candidate reachable");
        let lower = best.as_ref().is_none_or(|b| latency < b.latency);
        if lower {
            best = Some(SelectedServer {
                candidate: candidate.clone(),
                latency,
            });
        }
    }

    match best {
        Some(selected) => {
            info!(
                server = %selected.candidate.id,
                latency_ms = selected.latency.as_millis(),
                "selected reference server"
            );
            Ok(selected)
        }
        None => Err(ProbeError::NoServerReachable {
            candidates: candidates.len(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_trailing_slash() {
        let base: Url = "http://example.com:8080/".parse().unwrap();
        let url = endpoint(&base, "ping").unwrap();
        assert_eq!(url.as_str(), "http://example.com:8080/ping");
    }

    #[test]
    fn endpoint_handles_missing_slash() {
        let base: Url = "http://example.com:8080".parse().unwrap();
        let url = endpoint(&base, "download").unwrap();
        assert_eq!(url.as_str(), "http://example.com:8080/download");
    }

    #[test]
    fn candidate_json_round_trip() {
        let raw = r#"{"id":"fra-1","url":"http://fra.example.net/","name":"Frankfurt"}"#;
        let candidate: ServerCandidate = serde_json::from_str(raw).unwrap();
        assert_eq!(candidate.id, "fra-1");
        assert_eq!(candidate.name.as_deref(), Some("Frankfurt"));
    }

    #[test]
    fn candidate_name_is_optional() {
        let raw = r#"{"id":"lon-2","url":"http://lon.example.net/"}"#;
        let candidate: ServerCandidate = serde_json::from_str(raw).unwrap();
        assert!(candidate.name.is_none());
    }
}
