use std::collections::BTreeMap;

use crate::domain::embedding::embedding::Embedding;
use crate::domain::substrate::path::SubstratePath;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId, VirtualLinkId, VirtualNodeId, VnrId};

/// Read-only substrate plus the tentative reservations of one `embed` call.
///
/// Algorithms place nodes and route links against this overlay. Dropping it is the
/// rollback: the underlying substrate is never touched, and only the finished
/// proposal (`into_embedding`) reaches the engine.
#[derive(Debug)]
pub struct ResidualView<'a> {
    substrate: &'a SubstrateNetwork,
    cpu_held: BTreeMap<SubstrateNodeId, i64>,
    bandwidth_held: BTreeMap<SubstrateLinkId, i64>,
    embedding: Embedding,
}

impl<'a> ResidualView<'a> {
    pub fn new(substrate: &'a SubstrateNetwork, vnr_id: VnrId) -> Self {
        Self { substrate, cpu_held: BTreeMap::new(), bandwidth_held: BTreeMap::new(), embedding: Embedding::new(vnr_id) }
    }

    pub fn substrate(&self) -> &'a SubstrateNetwork {
        self.substrate
    }

    pub fn residual_cpu(&self, node: SubstrateNodeId) -> i64 {
        let available = self.substrate.available_cpu(node).unwrap_or(0);
        available - self.cpu_held.get(&node).copied().unwrap_or(0)
    }

    pub fn residual_bandwidth(&self, link: SubstrateLinkId) -> i64 {
        let available = self.substrate.available_bandwidth(link).unwrap_or(0);
        available - self.bandwidth_held.get(&link).copied().unwrap_or(0)
    }

    pub fn is_used(&self, node: SubstrateNodeId) -> bool {
        self.embedding.is_substrate_node_used(node)
    }

    pub fn mapped(&self, virtual_node: VirtualNodeId) -> Option<SubstrateNodeId> {
        self.embedding.substrate_node_of(virtual_node)
    }

    /// True if `node` is unused by this request and still has `demand` cpu left.
    pub fn can_host(&self, node: SubstrateNodeId, demand: i64) -> bool {
        self.substrate.contains_node(node) && !self.is_used(node) && self.residual_cpu(node) >= demand
    }

    /// Tentatively places `virtual_node` on `node`. Returns false if the node cannot host it.
    pub fn place_node(&mut self, virtual_node: VirtualNodeId, node: SubstrateNodeId, demand: i64) -> bool {
        if !self.can_host(node, demand) || !self.embedding.map_node(virtual_node, node, demand) {
            return false;
        }
        *self.cpu_held.entry(node).or_insert(0) += demand;
        true
    }

    /// Smallest residual bandwidth along `path`.
    pub fn bottleneck(&self, path: &SubstratePath) -> i64 {
        path.links.iter().map(|link| self.residual_bandwidth(*link)).min().unwrap_or(i64::MAX)
    }

    pub fn path_fits(&self, path: &SubstratePath, demand: i64) -> bool {
        self.bottleneck(path) >= demand
    }

    /// Tentatively reserves `demand` along `path` for `virtual_link`. Returns false if any link is too thin.
    pub fn route_link(&mut self, virtual_link: VirtualLinkId, path: SubstratePath, demand: i64) -> bool {
        if !self.path_fits(&path, demand) {
            return false;
        }
        for link in &path.links {
            *self.bandwidth_held.entry(*link).or_insert(0) += demand;
        }
        self.embedding.map_link(virtual_link, path, demand);
        true
    }

    /// Shortest path between two substrate nodes over links accepted by `allow`,
    /// tie-broken by this overlay's residual bandwidth.
    pub fn shortest_path<A>(&self, source: SubstrateNodeId, target: SubstrateNodeId, allow: A) -> Option<SubstratePath>
    where
        A: Fn(SubstrateLinkId) -> bool,
    {
        self.substrate.shortest_path_with(source, target, allow, |link| self.residual_bandwidth(link))
    }

    pub fn into_embedding(self) -> Embedding {
        self.embedding
    }
}
