// ── LinkInfoProvider ──
//
// Wireless association state from the platform's interface status query,
// interface-wide traffic counters from the statistics query, plus the
// host's own address. Every failure path degrades to absent fields; this
// provider never returns an error.

use tokio::net::UdpSocket;
use tracing::debug;

use crate::model::{InterfaceCounters, LinkInfo, UNKNOWN_ADDRESS};
use crate::platform::{self, CommandRunner};

/// Read-only provider for the current wireless link state.
pub struct LinkInfoProvider<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> LinkInfoProvider<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Query the OS for the current association and traffic counters.
    /// Subprocess failure, non-zero exit, and missing fields all yield
    /// absent values.
    pub async fn current_link_info(&self) -> LinkInfo {
        let (wireless, counters, local_address) = tokio::join!(
            self.wireless_status(),
            self.interface_counters(),
            local_address(),
        );
        let (network_name, signal_quality) = wireless;

        LinkInfo {
            network_name,
            signal_quality,
            local_address: local_address.unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
            counters,
        }
    }

    async fn wireless_status(&self) -> (Option<String>, Option<u8>) {
        let (program, args) = platform::WIRELESS_STATUS;
        match self.runner.run(program, args).await {
            Ok(output) if output.success() => parse_wireless_status(&output.stdout),
            Ok(output) => {
                debug!(exit_code = output.exit_code, "wireless status query failed");
                (None, None)
            }
            Err(e) => {
                debug!(error = %e, "wireless status unavailable");
                (None, None)
            }
        }
    }

    async fn interface_counters(&self) -> Option<InterfaceCounters> {
        let (program, args) = platform::INTERFACE_COUNTERS;
        match self.runner.run(program, args).await {
            Ok(output) if output.success() => parse_interface_counters(&output.stdout),
            Ok(output) => {
                debug!(exit_code = output.exit_code, "interface statistics query failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "interface statistics unavailable");
                None
            }
        }
    }
}

/// Scan wireless status output for the network name and signal quality.
///
/// The name comes from the first line mentioning the network-name field
/// that is *not* the station identifier line (a "BSSID" line would
/// otherwise match and yield a hardware address as the name). The signal
/// line carries a percentage with a trailing `%`. First occurrence wins
/// for both; anything missing or malformed stays `None`.
fn parse_wireless_status(stdout: &str) -> (Option<String>, Option<u8>) {
    let mut network_name = None;
    let mut signal_quality = None;

    for line in stdout.lines() {
        if network_name.is_none() && line.contains("SSID") && !line.contains("BSSID") {
            network_name = field_value(line)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned);
        }
        if signal_quality.is_none() && line.trim_start().starts_with("Signal") {
            signal_quality = field_value(line)
                .and_then(|v| v.trim_end_matches('%').trim().parse::<u8>().ok())
                .filter(|pct| *pct <= 100);
        }
    }

    (network_name, signal_quality)
}

fn field_value(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value.trim())
}

/// Scan interface statistics output for the cumulative byte counters: the
/// first line whose leading token is `Bytes`, followed by the received and
/// sent totals. Anything malformed stays absent.
fn parse_interface_counters(stdout: &str) -> Option<InterfaceCounters> {
    for line in stdout.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("Bytes") {
            continue;
        }
        let bytes_received = tokens.next()?.parse().ok()?;
        let bytes_sent = tokens.next()?.parse().ok()?;
        return Some(InterfaceCounters {
            bytes_received,
            bytes_sent,
        });
    }
    None
}

/// The host's own address, via a routing-probe UDP socket: bind, connect
/// to a public address (no datagram is sent), and read back the local
/// endpoint the kernel picked. `None` when the host has no usable route.
async fn local_address() -> Option<String> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await.ok()?;
    socket.connect(("8.8.8.8", 80)).await.ok()?;
    socket.local_addr().ok().map(|addr| addr.ip().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ASSOCIATED: &str = "\
There is 1 interface on the system:

    Name                   : Wi-Fi
    Description            : Intel(R) Wi-Fi 6 AX201 160MHz
    GUID                   : 0b0b0b0b-1234-5678-9abc-def012345678
    Physical address       : 11:22:33:44:55:66
    State                  : connected
    SSID                   : HomeLab-5G
    BSSID                  : aa:bb:cc:dd:ee:01
    Network type           : Infrastructure
    Radio type             : 802.11ax
    Signal                 : 87%
    Channel                : 36
";

    #[test]
    fn parses_network_name_and_signal() {
        let (name, signal) = parse_wireless_status(ASSOCIATED);
        assert_eq!(name.as_deref(), Some("HomeLab-5G"));
        assert_eq!(signal, Some(87));
    }

    #[test]
    fn bssid_line_never_becomes_the_network_name() {
        // The BSSID line precedes the SSID line here; it must be skipped.
        let out = "\
    BSSID                  : aa:bb:cc:dd:ee:01
    SSID                   : CoffeeShop
    Signal                 : 42%
";
        let (name, _) = parse_wireless_status(out);
        assert_eq!(name.as_deref(), Some("CoffeeShop"));
    }

    #[test]
    fn missing_signal_line_yields_absent() {
        let out = "    SSID                   : Somewhere\n    State  : connected\n";
        let (name, signal) = parse_wireless_status(out);
        assert_eq!(name.as_deref(), Some("Somewhere"));
        assert_eq!(signal, None);
    }

    #[test]
    fn malformed_signal_yields_absent() {
        let out = "    Signal                 : strong\n";
        assert_eq!(parse_wireless_status(out).1, None);
        let out = "    Signal                 : 250%\n";
        assert_eq!(parse_wireless_status(out).1, None);
    }

    #[test]
    fn disassociated_output_yields_all_absent() {
        let out = "\
    Name                   : Wi-Fi
    State                  : disconnected
";
        let (name, signal) = parse_wireless_status(out);
        assert_eq!(name, None);
        assert_eq!(signal, None);
    }

    #[test]
    fn empty_ssid_value_yields_absent() {
        let out = "    SSID                   : \n";
        assert_eq!(parse_wireless_status(out).0, None);
    }

    #[test]
    fn parses_interface_byte_counters() {
        let out = "\
Interface Statistics

                           Received            Sent

Bytes                    133452575       43105765
Unicast packets             325489         188345
";
        let counters = parse_interface_counters(out).unwrap();
        assert_eq!(counters.bytes_received, 133_452_575);
        assert_eq!(counters.bytes_sent, 43_105_765);
    }

    #[test]
    fn malformed_counter_line_yields_absent() {
        assert_eq!(parse_interface_counters("Bytes  lots  more\n"), None);
        assert_eq!(parse_interface_counters("Bytes  1234\n"), None);
        assert_eq!(parse_interface_counters("Unicast packets  1  2\n"), None);
        assert_eq!(parse_interface_counters(""), None);
    }

    #[tokio::test]
    async fn local_address_resolves_or_degrades() {
        // Depends on the host's routing table; either outcome is valid,
        // but a resolved address must be a real IP.
        if let Some(addr) = local_address().await {
            assert!(addr.parse::<std::net::IpAddr>().is_ok());
        }
    }
}
