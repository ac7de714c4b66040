// ── NeighborDiscoverer ──
//
// Peer records from the platform's address-resolution table dump. The
// cache format is not specified by any contract, so the parser is a shape
// match per line: an IPv4 dotted-quad token followed (not necessarily
// adjacently) by a hex-octet hardware address token. Everything else —
// headers, interface banners, incomplete entries — is silently skipped.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use tracing::warn;

use crate::model::{MacAddress, PeerRecord};
use crate::platform::{self, CommandRunner};

/// Outcome of one discovery pass.
///
/// Subprocess failure is absorbed: the peers come back empty and the
/// advisory says why, leaving partial diagnostics usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Unique peers in discovery order, first-seen hardware address kept.
    pub peers: Vec<PeerRecord>,
    /// Present when discovery degraded instead of running.
    pub advisory: Option<String>,
}

impl DiscoveryReport {
    fn degraded(advisory: String) -> Self {
        Self {
            peers: Vec::new(),
            advisory: Some(advisory),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.advisory.is_some()
    }
}

/// Read-only provider for the local subnet's peer set.
pub struct NeighborDiscoverer<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> NeighborDiscoverer<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Dump and parse the address-resolution table.
    pub async fn discover_peers(&self) -> DiscoveryReport {
        let (program, args) = platform::NEIGHBOR_TABLE;
        match self.runner.run(program, args).await {
            Ok(output) if output.success() => DiscoveryReport {
                peers: parse_neighbor_table(&output.stdout),
                advisory: None,
            },
            Ok(output) => {
                warn!(exit_code = output.exit_code, "neighbor table query failed");
                DiscoveryReport::degraded(format!(
                    "neighbor table query exited with status {}",
                    output.exit_code
                ))
            }
            Err(e) => {
                warn!(error = %e, "neighbor discovery unavailable");
                DiscoveryReport::degraded(format!("neighbor discovery unavailable: {e}"))
            }
        }
    }
}

/// Extract peer records from a neighbor-table dump, one line at a time.
/// Duplicate addresses keep the first-seen hardware address.
fn parse_neighbor_table(stdout: &str) -> Vec<PeerRecord> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut peers = Vec::new();

    for line in stdout.lines() {
        let Some(peer) = parse_neighbor_line(line) else {
            continue;
        };
        if seen.insert(peer.address) {
            peers.push(peer);
        }
    }

    peers
}

/// Match one line: the first token parsing as an IPv4 address (parentheses
/// tolerated, some platforms wrap the address), then the first hardware
/// address token after it.
fn parse_neighbor_line(line: &str) -> Option<PeerRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (position, address) = tokens.iter().enumerate().find_map(|(i, token)| {
        token
            .trim_matches(['(', ')'])
            .parse::<Ipv4Addr>()
            .ok()
            .map(|addr| (i, addr))
    })?;
    let hardware_address = tokens
        .get(position + 1..)?
        .iter()
        .find_map(|token| MacAddress::parse(token))?;

    Some(PeerRecord {
        address,
        hardware_address,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn peer(address: &str, mac: &str) -> PeerRecord {
        PeerRecord {
            address: address.parse().unwrap(),
            hardware_address: MacAddress::new(mac),
        }
    }

    const WINDOWS_DUMP: &str = "\

Interface: 192.168.1.2 --- 0x3
  Internet Address      Physical Address      Type
  192.168.1.1           a0-b1-c2-d3-e4-f5     dynamic
  192.168.1.5           aa-bb-cc-dd-ee-ff     dynamic
  192.168.1.255         ff-ff-ff-ff-ff-ff     static
  224.0.0.22            01-00-5e-00-00-16     static
";

    #[test]
    fn parses_windows_style_dump() {
        let peers = parse_neighbor_table(WINDOWS_DUMP);
        assert_eq!(peers.len(), 4);
        assert_eq!(peers[0], peer("192.168.1.1", "a0-b1-c2-d3-e4-f5"));
        assert_eq!(peers[1], peer("192.168.1.5", "aa-bb-cc-dd-ee-ff"));
    }

    #[test]
    fn parses_unix_style_dump() {
        let dump = "\
gateway (192.168.1.1) at a0:b1:c2:d3:e4:f5 [ether] on wlan0
? (192.168.1.7) at 11:22:33:44:55:66 [ether] on wlan0
";
        let peers = parse_neighbor_table(dump);
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[1], peer("192.168.1.7", "11:22:33:44:55:66"));
    }

    #[test]
    fn malformed_lines_are_skipped_silently() {
        let dump = "\
  192.168.1.5  aa-bb-cc-dd-ee-ff
Interface: 0x3
";
        let peers = parse_neighbor_table(dump);
        assert_eq!(peers, vec![peer("192.168.1.5", "aa-bb-cc-dd-ee-ff")]);
    }

    #[test]
    fn interface_banner_without_mac_is_skipped() {
        // Carries a valid IPv4 address but no hardware address after it.
        let dump = "Interface: 192.168.1.2 --- 0x3\n";
        assert!(parse_neighbor_table(dump).is_empty());
    }

    #[test]
    fn duplicate_addresses_keep_first_seen_hardware_address() {
        let dump = "\
  192.168.1.5  aa-bb-cc-dd-ee-ff
  192.168.1.5  00-11-22-33-44-55
  192.168.1.6  66-77-88-99-aa-bb
";
        let peers = parse_neighbor_table(dump);
        assert_eq!(
            peers,
            vec![
                peer("192.168.1.5", "aa-bb-cc-dd-ee-ff"),
                peer("192.168.1.6", "66-77-88-99-aa-bb"),
            ]
        );
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let dump = "? (192.168.1.9) at <incomplete> on wlan0\n";
        assert!(parse_neighbor_table(dump).is_empty());
    }

    #[test]
    fn empty_dump_yields_no_peers() {
        assert!(parse_neighbor_table("").is_empty());
    }
}
