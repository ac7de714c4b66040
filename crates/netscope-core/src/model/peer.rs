// ── Peer identity types ──

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Hardware address, normalized to lowercase colon-separated form
/// (`aa:bb:cc:dd:ee:ff`). Accepts colon- or dash-separated input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Normalize a raw hardware address without validating its shape.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_lowercase().replace('-', ":"))
    }

    /// Parse a token that must look like a hardware address: six hex
    /// octets separated by colons or dashes. Anything else is rejected —
    /// this is the shape check the neighbor-table parser relies on to
    /// skip header and garbage lines.
    pub fn parse(token: &str) -> Option<Self> {
        let groups: Vec<&str> = token.split(['-', ':']).collect();
        let well_formed = groups.len() == 6
            && groups
                .iter()
                .all(|g| g.len() == 2 && g.bytes().all(|b| b.is_ascii_hexdigit()));
        well_formed.then(|| Self::new(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One discovered peer on the local subnet. The address is the natural key
/// within a single discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerRecord {
    pub address: Ipv4Addr,
    pub hardware_address: MacAddress,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_normalizes_dashes() {
        let mac = MacAddress::new("AA-BB-CC-DD-EE-FF");
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_address_normalizes_case() {
        let mac = MacAddress::new("AA:BB:CC:DD:EE:FF");
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn parse_accepts_both_separators() {
        assert!(MacAddress::parse("aa-bb-cc-dd-ee-ff").is_some());
        assert!(MacAddress::parse("AA:BB:CC:DD:EE:FF").is_some());
    }

    #[test]
    fn parse_rejects_non_mac_tokens() {
        assert!(MacAddress::parse("0x3").is_none());
        assert!(MacAddress::parse("dynamic").is_none());
        assert!(MacAddress::parse("aa-bb-cc-dd-ee").is_none());
        assert!(MacAddress::parse("aa-bb-cc-dd-ee-fff").is_none());
        assert!(MacAddress::parse("gg-bb-cc-dd-ee-ff").is_none());
    }

    #[test]
    fn peer_record_serializes_as_strings() {
        let peer = PeerRecord {
            address: "192.168.1.5".parse().unwrap(),
            hardware_address: MacAddress::new("aa-bb-cc-dd-ee-ff"),
        };
        let json = serde_json::to_value(&peer).unwrap();
        assert_eq!(json["address"], "192.168.1.5");
        assert_eq!(json["hardware_address"], "aa:bb:cc:dd:ee:ff");
    }
}
