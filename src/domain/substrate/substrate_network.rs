use std::collections::{BTreeMap, BTreeSet, HashMap};

use union_find::{QuickUnionUf, UnionBySize, UnionFind};

use crate::api::substrate_dto::SubstrateDto;
use crate::domain::embedding::embedding::{CommittedEmbedding, Embedding};
use crate::domain::metrics::utilization::UtilizationSnapshot;
use crate::domain::substrate::path::SubstratePath;
use crate::domain::substrate::resource_error::ResourceError;
use crate::domain::substrate::resource_trait::Resource;
use crate::domain::substrate::substrate_link::SubstrateLink;
use crate::domain::substrate::substrate_node::SubstrateNode;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};
use crate::error::{Error, Result};

/// The physical network onto which virtual network requests are embedded.
///
/// The graph is undirected and holds at most one link per node pair. Nodes and links
/// are kept in ordered maps so every traversal visits them in ascending id order,
/// which makes all algorithms built on top of it deterministic.
///
/// Availability only changes through `reserve_*`, `release_*`, `commit` and `release`;
/// each of them either succeeds completely or leaves the network untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateNetwork {
    name: String,
    nodes: BTreeMap<SubstrateNodeId, SubstrateNode>,
    links: BTreeMap<SubstrateLinkId, SubstrateLink>,

    /// Maps a node to the set of its incident links.
    adjacency: BTreeMap<SubstrateNodeId, BTreeSet<SubstrateLinkId>>,
}

impl SubstrateNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), nodes: BTreeMap::new(), links: BTreeMap::new(), adjacency: BTreeMap::new() }
    }

    /// Builds and validates a substrate from its file representation.
    pub fn from_dto(dto: SubstrateDto) -> Result<Self> {
        let mut substrate = SubstrateNetwork::new(dto.name);
        for node in dto.nodes {
            substrate.add_node(SubstrateNodeId::new(node.id), node.cpu_capacity)?;
        }
        for link in dto.links {
            let (source, target) = (SubstrateNodeId::new(link.source), SubstrateNodeId::new(link.target));
            match link.id {
                Some(id) => substrate.add_link(SubstrateLinkId::new(id), source, target, link.bandwidth_capacity)?,
                None => {
                    substrate.connect(source, target, link.bandwidth_capacity)?;
                }
            }
        }
        substrate.validate()?;
        Ok(substrate)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, id: SubstrateNodeId, cpu_capacity: i64) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(Error::InvalidTopologyInput(format!("duplicate substrate node {}", id)));
        }
        if cpu_capacity < 0 {
            return Err(Error::InvalidTopologyInput(format!("node {} has negative cpu capacity {}", id, cpu_capacity)));
        }

        self.nodes.insert(id, SubstrateNode::new(id, cpu_capacity));
        self.adjacency.insert(id, BTreeSet::new());
        Ok(())
    }

    pub fn add_link(&mut self, id: SubstrateLinkId, source: SubstrateNodeId, target: SubstrateNodeId, bandwidth_capacity: i64) -> Result<()> {
        if self.links.contains_key(&id) {
            return Err(Error::InvalidTopologyInput(format!("duplicate substrate link {}", id)));
        }
        if source == target {
            return Err(Error::InvalidTopologyInput(format!("link {} is a self-loop on node {}", id, source)));
        }
        if !self.nodes.contains_key(&source) || !self.nodes.contains_key(&target) {
            return Err(Error::InvalidTopologyInput(format!("link {} references unknown endpoint ({} <-> {})", id, source, target)));
        }
        if self.link_between(source, target).is_some() {
            return Err(Error::InvalidTopologyInput(format!("parallel link {} between {} and {}", id, source, target)));
        }
        if bandwidth_capacity < 0 {
            return Err(Error::InvalidTopologyInput(format!("link {} has negative bandwidth capacity {}", id, bandwidth_capacity)));
        }

        self.links.insert(id, SubstrateLink::new(id, source, target, bandwidth_capacity));
        self.adjacency.entry(source).or_default().insert(id);
        self.adjacency.entry(target).or_default().insert(id);
        Ok(())
    }

    /// Adds a link with the next free link id.
    pub fn connect(&mut self, source: SubstrateNodeId, target: SubstrateNodeId, bandwidth_capacity: i64) -> Result<SubstrateLinkId> {
        let next = self.links.keys().next_back().map(|id| id.id + 1).unwrap_or(0);
        let id = SubstrateLinkId::new(next);
        self.add_link(id, source, target, bandwidth_capacity)?;
        Ok(id)
    }

    //---------------------
    // --- Queries ---
    //---------------------
    pub fn node(&self, id: SubstrateNodeId) -> Option<&SubstrateNode> {
        self.nodes.get(&id)
    }

    pub fn link(&self, id: SubstrateLinkId) -> Option<&SubstrateLink> {
        self.links.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SubstrateNode> {
        self.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &SubstrateLink> {
        self.links.values()
    }

    pub fn node_ids(&self) -> Vec<SubstrateNodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn contains_node(&self, id: SubstrateNodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Neighbors of `node` with the connecting link, in ascending neighbor id order.
    pub fn neighbors(&self, node: SubstrateNodeId) -> Vec<(SubstrateNodeId, SubstrateLinkId)> {
        let mut result: Vec<(SubstrateNodeId, SubstrateLinkId)> = self
            .adjacency
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|link_id| self.links.get(link_id).and_then(|link| link.other_end(node)).map(|other| (other, *link_id)))
            .collect();
        result.sort();
        result
    }

    pub fn link_between(&self, a: SubstrateNodeId, b: SubstrateNodeId) -> Option<SubstrateLinkId> {
        self.adjacency.get(&a)?.iter().copied().find(|link_id| self.links.get(link_id).is_some_and(|link| link.connects(a, b)))
    }

    pub fn available_cpu(&self, node: SubstrateNodeId) -> std::result::Result<i64, ResourceError> {
        self.nodes.get(&node).map(|n| n.get_available()).ok_or(ResourceError::UnknownNode(node))
    }

    pub fn available_bandwidth(&self, link: SubstrateLinkId) -> std::result::Result<i64, ResourceError> {
        self.links.get(&link).map(|l| l.get_available()).ok_or(ResourceError::UnknownLink(link))
    }

    /// Sum of the available bandwidth on all links incident to `node`.
    pub fn incident_bandwidth(&self, node: SubstrateNodeId) -> i64 {
        self.adjacency.get(&node).into_iter().flatten().filter_map(|link_id| self.links.get(link_id)).map(|link| link.get_available()).sum()
    }

    pub fn get_total_cpu_capacity(&self) -> i64 {
        self.nodes.values().map(|node| node.get_capacity()).sum()
    }

    pub fn get_total_bandwidth_capacity(&self) -> i64 {
        self.links.values().map(|link| link.get_capacity()).sum()
    }

    pub fn get_total_cpu_available(&self) -> i64 {
        self.nodes.values().map(|node| node.get_available()).sum()
    }

    pub fn get_total_bandwidth_available(&self) -> i64 {
        self.links.values().map(|link| link.get_available()).sum()
    }

    //---------------------
    // --- Reservations ---
    //---------------------
    pub fn reserve_cpu(&mut self, node: SubstrateNodeId, amount: i64) -> std::result::Result<(), ResourceError> {
        self.nodes.get_mut(&node).ok_or(ResourceError::UnknownNode(node))?.reserve(amount)
    }

    pub fn release_cpu(&mut self, node: SubstrateNodeId, amount: i64) -> std::result::Result<(), ResourceError> {
        self.nodes.get_mut(&node).ok_or(ResourceError::UnknownNode(node))?.release_amount(amount)
    }

    /// Reserves `amount` on every link of `path`, all or nothing.
    pub fn reserve_path(&mut self, path: &SubstratePath, amount: i64) -> std::result::Result<(), ResourceError> {
        self.check_path(path)?;
        for (link_id, demand) in Self::aggregate_links(path.links.iter().map(|link_id| (*link_id, amount))) {
            let link = self.links.get(&link_id).ok_or(ResourceError::UnknownLink(link_id))?;
            if demand < 0 {
                return Err(ResourceError::NegativeAmount(demand));
            }
            if !link.can_handle(demand) {
                return Err(ResourceError::InsufficientBandwidth { link: link_id, requested: demand, available: link.get_available() });
            }
        }
        for link_id in &path.links {
            if let Some(link) = self.links.get_mut(link_id) {
                link.reserve(amount)?;
            }
        }
        Ok(())
    }

    /// Returns `amount` to every link of `path`, all or nothing.
    pub fn release_path(&mut self, path: &SubstratePath, amount: i64) -> std::result::Result<(), ResourceError> {
        self.check_path(path)?;
        for (link_id, returned) in Self::aggregate_links(path.links.iter().map(|link_id| (*link_id, amount))) {
            let link = self.links.get(&link_id).ok_or(ResourceError::UnknownLink(link_id))?;
            if returned < 0 {
                return Err(ResourceError::NegativeAmount(returned));
            }
            if link.get_available() + returned > link.get_capacity() {
                return Err(ResourceError::OverRelease { resource: link.get_label(), amount: returned, capacity: link.get_capacity() });
            }
        }
        for link_id in &path.links {
            if let Some(link) = self.links.get_mut(link_id) {
                link.release_amount(amount)?;
            }
        }
        Ok(())
    }

    /// Applies every reservation of a proposed embedding.
    ///
    /// All demands are checked against the current availability before anything is
    /// mutated, so a failed commit leaves the network exactly as it was.
    pub fn commit(&mut self, embedding: Embedding) -> std::result::Result<CommittedEmbedding, ResourceError> {
        for mapping in embedding.link_mappings() {
            self.check_path(&mapping.path)?;
        }

        let cpu_demand = Self::aggregate_nodes(embedding.cpu_reservations());
        let bandwidth_demand = Self::aggregate_links(embedding.bandwidth_reservations());

        for (node_id, demand) in &cpu_demand {
            let node = self.nodes.get(node_id).ok_or(ResourceError::UnknownNode(*node_id))?;
            if !node.can_handle(*demand) {
                return Err(ResourceError::InsufficientCpu { node: *node_id, requested: *demand, available: node.get_available() });
            }
        }
        for (link_id, demand) in &bandwidth_demand {
            let link = self.links.get(link_id).ok_or(ResourceError::UnknownLink(*link_id))?;
            if !link.can_handle(*demand) {
                return Err(ResourceError::InsufficientBandwidth { link: *link_id, requested: *demand, available: link.get_available() });
            }
        }

        for (node_id, demand) in cpu_demand {
            self.reserve_cpu(node_id, demand)?;
        }
        for (link_id, demand) in bandwidth_demand {
            if let Some(link) = self.links.get_mut(&link_id) {
                link.reserve(demand)?;
            }
        }

        log::debug!("Committed embedding of VNR {} (cost {}).", embedding.vnr_id, embedding.cost());
        Ok(CommittedEmbedding::new(embedding))
    }

    /// Returns every resource held by `committed`. A second call fails with `AlreadyReleased`.
    pub fn release(&mut self, committed: &mut CommittedEmbedding) -> std::result::Result<(), ResourceError> {
        let vnr_id = committed.embedding().vnr_id;
        if committed.is_released() {
            return Err(ResourceError::AlreadyReleased(vnr_id));
        }

        let cpu_returned = Self::aggregate_nodes(committed.embedding().cpu_reservations());
        let bandwidth_returned = Self::aggregate_links(committed.embedding().bandwidth_reservations());

        for (node_id, amount) in &cpu_returned {
            let node = self.nodes.get(node_id).ok_or(ResourceError::UnknownNode(*node_id))?;
            if node.get_available() + amount > node.get_capacity() {
                return Err(ResourceError::OverRelease { resource: node.get_label(), amount: *amount, capacity: node.get_capacity() });
            }
        }
        for (link_id, amount) in &bandwidth_returned {
            let link = self.links.get(link_id).ok_or(ResourceError::UnknownLink(*link_id))?;
            if link.get_available() + amount > link.get_capacity() {
                return Err(ResourceError::OverRelease { resource: link.get_label(), amount: *amount, capacity: link.get_capacity() });
            }
        }

        for (node_id, amount) in cpu_returned {
            self.release_cpu(node_id, amount)?;
        }
        for (link_id, amount) in bandwidth_returned {
            if let Some(link) = self.links.get_mut(&link_id) {
                link.release_amount(amount)?;
            }
        }

        committed.mark_released();
        log::debug!("Released embedding of VNR {}.", vnr_id);
        Ok(())
    }

    fn aggregate_nodes(reservations: impl Iterator<Item = (SubstrateNodeId, i64)>) -> BTreeMap<SubstrateNodeId, i64> {
        let mut total = BTreeMap::new();
        for (node_id, amount) in reservations {
            *total.entry(node_id).or_insert(0) += amount;
        }
        total
    }

    fn aggregate_links(reservations: impl Iterator<Item = (SubstrateLinkId, i64)>) -> BTreeMap<SubstrateLinkId, i64> {
        let mut total = BTreeMap::new();
        for (link_id, amount) in reservations {
            *total.entry(link_id).or_insert(0) += amount;
        }
        total
    }

    /// Checks that consecutive nodes of `path` are joined by the listed links.
    fn check_path(&self, path: &SubstratePath) -> std::result::Result<(), ResourceError> {
        if path.nodes.len() != path.links.len() + 1 {
            return Err(ResourceError::MalformedPath { nodes: path.nodes.len(), links: path.links.len() });
        }
        for (index, link_id) in path.links.iter().enumerate() {
            let link = self.links.get(link_id).ok_or(ResourceError::UnknownLink(*link_id))?;
            let (a, b) = (path.nodes[index], path.nodes[index + 1]);
            if !link.connects(a, b) {
                return Err(ResourceError::NotAdjacent(a, b));
            }
        }
        Ok(())
    }

    //---------------------
    // --- Validation ---
    //---------------------

    /// Returns true if every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        if self.nodes.len() <= 1 {
            return true;
        }

        let index: HashMap<SubstrateNodeId, usize> = self.nodes.keys().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut dsu = QuickUnionUf::<UnionBySize>::new(index.len());

        for link in self.links.values() {
            if let (Some(a), Some(b)) = (index.get(&link.source), index.get(&link.target)) {
                dsu.union(*a, *b);
            }
        }

        let root = dsu.find(0);
        (1..index.len()).all(|i| dsu.find(i) == root)
    }

    /// Rejects substrates the engine cannot simulate on: empty, inconsistent or disconnected.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::InvalidTopologyInput(format!("substrate '{}' has no nodes", self.name)));
        }

        for node in self.nodes.values() {
            if node.get_available() < 0 || node.get_available() > node.get_capacity() {
                return Err(Error::InvalidTopologyInput(format!("node {} has availability outside [0, capacity]", node.id)));
            }
        }
        for link in self.links.values() {
            if link.get_available() < 0 || link.get_available() > link.get_capacity() {
                return Err(Error::InvalidTopologyInput(format!("link {} has availability outside [0, capacity]", link.id)));
            }
        }

        if !self.is_connected() {
            return Err(Error::InvalidTopologyInput(format!("substrate '{}' is not connected", self.name)));
        }

        Ok(())
    }

    /// Utilization (`1 - available / capacity`) of every node and link at `time`.
    pub fn utilization_snapshot(&self, time: i64, active_vnrs: usize) -> UtilizationSnapshot {
        UtilizationSnapshot {
            time,
            active_vnrs,
            node_utilization: self.nodes.iter().map(|(id, node)| (*id, node.get_utilization())).collect(),
            link_utilization: self.links.iter().map(|(id, link)| (*id, link.get_utilization())).collect(),
        }
    }
}
