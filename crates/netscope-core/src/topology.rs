// ── TopologyBuilder ──
//
// Pure transformation from an ordered peer set to a star graph: one hub,
// one leaf per peer, one edge per leaf. The data source only reveals
// hub-relative adjacency, so no peer-to-peer edges exist by construction.
// Rendering/export of the graph belongs to external consumers.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::model::{MacAddress, PeerRecord};

/// Deterministic node identifier.
///
/// Peer ids pair the 1-based discovery index with the peer's address, so
/// labels stay unique even when two peers share a hardware address
/// (virtualized adapters) and stay stable across rebuilds over the same
/// ordered peer sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    fn hub(label: &str) -> Self {
        Self(format!("hub:{label}"))
    }

    fn peer(index: usize, address: Ipv4Addr) -> Self {
        Self(format!("device-{index}:{address}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One graph node with its presentation label and, for peers, the record
/// fields a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: NodeId,
    pub label: String,
    pub address: Option<Ipv4Addr>,
    pub hardware_address: Option<MacAddress>,
}

/// Star topology over the discovered peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub hub: NodeId,
    /// Hub first, then peers in discovery order.
    pub nodes: Vec<TopologyNode>,
    /// Hub-to-leaf edges only.
    pub edges: Vec<(NodeId, NodeId)>,
}

impl TopologyGraph {
    pub fn peer_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Structural invariant: one edge per non-hub node, all anchored at
    /// the hub, each leaf appearing exactly once.
    pub fn is_star(&self) -> bool {
        if self.edges.len() != self.peer_count() {
            return false;
        }
        let mut leaves: Vec<&NodeId> = self
            .edges
            .iter()
            .filter(|(from, _)| *from == self.hub)
            .map(|(_, to)| to)
            .collect();
        if leaves.len() != self.edges.len() {
            return false;
        }
        leaves.sort();
        leaves.dedup();
        leaves.len() == self.peer_count()
    }
}

/// Builds star graphs from ordered peer sequences.
pub struct TopologyBuilder;

impl TopologyBuilder {
    /// Deterministic: identical ordered input yields identical labels and
    /// edge sets. The hub is whatever label the caller supplies — no
    /// subnet semantics are attached to it.
    pub fn build_graph(peers: &[PeerRecord], hub_label: &str) -> TopologyGraph {
        let hub = NodeId::hub(hub_label);
        let mut nodes = Vec::with_capacity(peers.len() + 1);
        nodes.push(TopologyNode {
            id: hub.clone(),
            label: hub_label.to_owned(),
            address: None,
            hardware_address: None,
        });

        let mut edges = Vec::with_capacity(peers.len());
        for (i, peer) in peers.iter().enumerate() {
            let index = i + 1;
            let id = NodeId::peer(index, peer.address);
            nodes.push(TopologyNode {
                id: id.clone(),
                label: format!("Device {index} ({})", peer.address),
                address: Some(peer.address),
                hardware_address: Some(peer.hardware_address.clone()),
            });
            edges.push((hub.clone(), id));
        }

        TopologyGraph { hub, nodes, edges }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn peers(n: usize) -> Vec<PeerRecord> {
        (0..n)
            .map(|i| PeerRecord {
                address: format!("192.168.1.{}", i + 10).parse().unwrap(),
                hardware_address: MacAddress::new(format!("aa-bb-cc-dd-ee-{:02x}", i)),
            })
            .collect()
    }

    #[test]
    fn build_is_deterministic() {
        let input = peers(5);
        let a = TopologyBuilder::build_graph(&input, "Host");
        let b = TopologyBuilder::build_graph(&input, "Host");
        assert_eq!(a, b);
    }

    #[test]
    fn star_invariant_holds_for_all_sizes() {
        for n in 0..=8 {
            let graph = TopologyBuilder::build_graph(&peers(n), "Host");
            assert_eq!(graph.edges.len(), n, "edges must equal non-hub nodes");
            assert!(graph.is_star(), "graph of {n} peers must be a star");
        }
    }

    #[test]
    fn empty_peer_set_is_a_lone_hub() {
        let graph = TopologyBuilder::build_graph(&[], "Host");
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes[0].id, graph.hub);
    }

    #[test]
    fn labels_embed_discovery_index_and_address() {
        let graph = TopologyBuilder::build_graph(&peers(2), "Host");
        assert_eq!(graph.nodes[1].label, "Device 1 (192.168.1.10)");
        assert_eq!(graph.nodes[2].label, "Device 2 (192.168.1.11)");
    }

    #[test]
    fn shared_hardware_addresses_still_get_unique_nodes() {
        let mac = MacAddress::new("aa-bb-cc-dd-ee-ff");
        let input = vec![
            PeerRecord {
                address: "10.0.0.1".parse().unwrap(),
                hardware_address: mac.clone(),
            },
            PeerRecord {
                address: "10.0.0.2".parse().unwrap(),
                hardware_address: mac,
            },
        ];
        let graph = TopologyBuilder::build_graph(&input, "Host");
        assert_ne!(graph.nodes[1].id, graph.nodes[2].id);
        assert!(graph.is_star());
    }

    #[test]
    fn hub_label_carries_no_subnet_semantics() {
        // Any label works; nothing validates it against the peers.
        let graph = TopologyBuilder::build_graph(&peers(1), "Hotspot \u{1F4E1}");
        assert_eq!(graph.nodes[0].label, "Hotspot \u{1F4E1}");
        assert!(graph.is_star());
    }
}
