use std::collections::BTreeMap;

use bimap::BiMap;
use serde::Serialize;

use crate::domain::substrate::path::SubstratePath;
use crate::domain::substrate::resource_error::ResourceError;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId, VirtualLinkId, VirtualNodeId, VnrId};
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

/// Substrate path carrying one virtual link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMapping {
    pub virtual_link: VirtualLinkId,
    pub path: SubstratePath,
    pub bandwidth: i64,
}

/// A mapping of one VNR onto the substrate.
///
/// Produced by an embedding algorithm as a proposal; it only holds resources once
/// `SubstrateNetwork::commit` accepted it and turned it into a `CommittedEmbedding`.
/// The node mapping is a bijection, so no two virtual nodes share a substrate node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embedding {
    pub vnr_id: VnrId,
    node_mapping: BiMap<VirtualNodeId, SubstrateNodeId>,
    node_demands: BTreeMap<VirtualNodeId, i64>,
    link_mappings: Vec<LinkMapping>,
}

impl Embedding {
    pub fn new(vnr_id: VnrId) -> Self {
        Self { vnr_id, node_mapping: BiMap::new(), node_demands: BTreeMap::new(), link_mappings: Vec::new() }
    }

    /// Maps `virtual_node` onto `substrate_node`. Returns false, without changing
    /// anything, if either side is already mapped.
    pub fn map_node(&mut self, virtual_node: VirtualNodeId, substrate_node: SubstrateNodeId, cpu_demand: i64) -> bool {
        if self.node_mapping.insert_no_overwrite(virtual_node, substrate_node).is_err() {
            return false;
        }
        self.node_demands.insert(virtual_node, cpu_demand);
        true
    }

    pub fn map_link(&mut self, virtual_link: VirtualLinkId, path: SubstratePath, bandwidth: i64) {
        self.link_mappings.push(LinkMapping { virtual_link, path, bandwidth });
    }

    pub fn substrate_node_of(&self, virtual_node: VirtualNodeId) -> Option<SubstrateNodeId> {
        self.node_mapping.get_by_left(&virtual_node).copied()
    }

    pub fn is_substrate_node_used(&self, substrate_node: SubstrateNodeId) -> bool {
        self.node_mapping.contains_right(&substrate_node)
    }

    /// `(virtual, substrate)` pairs in ascending virtual id order.
    pub fn node_mapping(&self) -> Vec<(VirtualNodeId, SubstrateNodeId)> {
        let mut pairs: Vec<(VirtualNodeId, SubstrateNodeId)> = self.node_mapping.iter().map(|(v, s)| (*v, *s)).collect();
        pairs.sort();
        pairs
    }

    pub fn link_mappings(&self) -> &[LinkMapping] {
        &self.link_mappings
    }

    /// Cpu held per substrate node.
    pub fn cpu_reservations(&self) -> impl Iterator<Item = (SubstrateNodeId, i64)> + '_ {
        self.node_demands.iter().filter_map(|(virtual_node, demand)| self.node_mapping.get_by_left(virtual_node).map(|s| (*s, *demand)))
    }

    /// Bandwidth held per traversed substrate link (a link may appear once per virtual link using it).
    pub fn bandwidth_reservations(&self) -> impl Iterator<Item = (SubstrateLinkId, i64)> + '_ {
        self.link_mappings.iter().flat_map(|mapping| mapping.path.links.iter().map(move |link_id| (*link_id, mapping.bandwidth)))
    }

    pub fn total_cpu(&self) -> i64 {
        self.node_demands.values().sum()
    }

    /// Bandwidth summed over every traversed substrate link.
    pub fn total_bandwidth(&self) -> i64 {
        self.bandwidth_reservations().map(|(_, amount)| amount).sum()
    }

    /// Substrate resources consumed: all reserved cpu plus bandwidth times hops of each path.
    pub fn cost(&self) -> i64 {
        self.total_cpu() + self.total_bandwidth()
    }

    /// Checks that the proposal covers `vnr` exactly with the demands it declares.
    pub fn validate_against(&self, vnr: &VirtualNetworkRequest) -> Result<(), ResourceError> {
        let invalid = |reason: String| ResourceError::InvalidEmbedding(self.vnr_id, reason);

        if self.vnr_id != vnr.id {
            return Err(invalid(format!("proposal belongs to VNR {}", vnr.id)));
        }
        if self.node_mapping.len() != vnr.node_count() {
            return Err(invalid(format!("{} of {} virtual nodes mapped", self.node_mapping.len(), vnr.node_count())));
        }
        for node in vnr.nodes() {
            if self.substrate_node_of(node.id).is_none() || self.node_demands.get(&node.id) != Some(&node.cpu_demand) {
                return Err(invalid(format!("virtual node {} is unmapped or has a wrong demand", node.id)));
            }
        }

        if self.link_mappings.len() != vnr.link_count() {
            return Err(invalid(format!("{} of {} virtual links mapped", self.link_mappings.len(), vnr.link_count())));
        }
        for link in vnr.links() {
            let Some(mapping) = self.link_mappings.iter().find(|m| m.virtual_link == link.id) else {
                return Err(invalid(format!("virtual link {} is unmapped", link.id)));
            };
            if mapping.bandwidth != link.bandwidth_demand {
                return Err(invalid(format!("virtual link {} reserves {} instead of {}", link.id, mapping.bandwidth, link.bandwidth_demand)));
            }
            let ends = (mapping.path.source(), mapping.path.target());
            let expected_a = (self.substrate_node_of(link.source), self.substrate_node_of(link.target));
            let expected_b = (expected_a.1, expected_a.0);
            if ends != expected_a && ends != expected_b {
                return Err(invalid(format!("path of virtual link {} does not join its mapped endpoints", link.id)));
            }
        }
        Ok(())
    }
}

/// An embedding whose resources are held on the substrate.
///
/// Tracks whether its resources were returned, so a second release is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEmbedding {
    embedding: Embedding,
    released: bool,
}

impl CommittedEmbedding {
    pub(crate) fn new(embedding: Embedding) -> Self {
        Self { embedding, released: false }
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn mark_released(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_mapping_is_one_to_one() {
        let mut embedding = Embedding::new(VnrId::new(1));
        assert!(embedding.map_node(VirtualNodeId::new(1), SubstrateNodeId::new(4), 10));
        assert!(!embedding.map_node(VirtualNodeId::new(2), SubstrateNodeId::new(4), 10));
        assert!(!embedding.map_node(VirtualNodeId::new(1), SubstrateNodeId::new(5), 10));
        assert_eq!(embedding.node_mapping(), vec![(VirtualNodeId::new(1), SubstrateNodeId::new(4))]);
    }

    #[test]
    fn test_cost_counts_bandwidth_per_hop() {
        let mut embedding = Embedding::new(VnrId::new(1));
        embedding.map_node(VirtualNodeId::new(1), SubstrateNodeId::new(1), 10);
        embedding.map_node(VirtualNodeId::new(2), SubstrateNodeId::new(3), 20);
        let path = SubstratePath::new(
            vec![SubstrateNodeId::new(1), SubstrateNodeId::new(2), SubstrateNodeId::new(3)],
            vec![SubstrateLinkId::new(0), SubstrateLinkId::new(1)],
        );
        embedding.map_link(VirtualLinkId::new(0), path, 5);

        assert_eq!(embedding.total_cpu(), 30);
        assert_eq!(embedding.total_bandwidth(), 10);
        assert_eq!(embedding.cost(), 40);
    }

    #[test]
    fn test_validate_against_detects_missing_link() {
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 10).with_node(2, 20).with_link(1, 2, 5);
        let mut embedding = Embedding::new(VnrId::new(1));
        embedding.map_node(VirtualNodeId::new(1), SubstrateNodeId::new(1), 10);
        embedding.map_node(VirtualNodeId::new(2), SubstrateNodeId::new(2), 20);

        assert!(matches!(embedding.validate_against(&vnr), Err(ResourceError::InvalidEmbedding(_, _))));

        embedding.map_link(VirtualLinkId::new(0), SubstratePath::new(vec![SubstrateNodeId::new(2), SubstrateNodeId::new(1)], vec![SubstrateLinkId::new(0)]), 5);
        assert!(embedding.validate_against(&vnr).is_ok());
    }
}
