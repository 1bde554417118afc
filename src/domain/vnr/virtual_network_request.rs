use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::api::vnr_dto::VnrDto;
use crate::domain::utils::id::{VirtualLinkId, VirtualNodeId, VnrId};
use crate::error::{Error, Result};

/// Shape of a request's virtual topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VnrShape {
    Path,
    Star,
    Cycle,
    Tree,
    Random,
    Custom,
}

/// Lifecycle of a request inside one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VnrState {
    /// Not yet handed to the embedding algorithm.
    Pending,

    /// Resources are reserved on the substrate.
    Embedded,

    /// The algorithm found no feasible mapping; nothing was reserved.
    Rejected,

    /// The holding time elapsed and every reservation was returned.
    Departed,
}

impl VnrState {
    /// Returns true if `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: VnrState) -> bool {
        matches!(
            (self, next),
            (VnrState::Pending, VnrState::Embedded) | (VnrState::Pending, VnrState::Rejected) | (VnrState::Embedded, VnrState::Departed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualNode {
    pub id: VirtualNodeId,
    pub cpu_demand: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualLink {
    pub id: VirtualLinkId,
    pub source: VirtualNodeId,
    pub target: VirtualNodeId,
    pub bandwidth_demand: i64,
}

impl VirtualLink {
    pub fn other_end(&self, node: VirtualNodeId) -> Option<VirtualNodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// A virtual network request: a small virtual topology with cpu and bandwidth
/// demands that occupies the substrate from `arrival_time` for `holding_duration`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualNetworkRequest {
    pub id: VnrId,
    pub shape: VnrShape,
    pub arrival_time: i64,
    pub holding_duration: i64,
    nodes: BTreeMap<VirtualNodeId, VirtualNode>,
    links: Vec<VirtualLink>,
}

impl VirtualNetworkRequest {
    pub fn new(id: VnrId, arrival_time: i64, holding_duration: i64) -> Self {
        Self { id, shape: VnrShape::Custom, arrival_time, holding_duration, nodes: BTreeMap::new(), links: Vec::new() }
    }

    pub fn from_dto(dto: VnrDto) -> Result<Self> {
        let mut vnr = VirtualNetworkRequest::new(VnrId::new(dto.id), dto.arrival_time, dto.holding_duration).with_shape(dto.shape.unwrap_or(VnrShape::Custom));
        for node in dto.nodes {
            if vnr.node(VirtualNodeId::new(node.id)).is_some() {
                return Err(Error::InvalidTopologyInput(format!("VNR {} repeats virtual node {}", dto.id, node.id)));
            }
            vnr.add_node(VirtualNodeId::new(node.id), node.cpu_demand);
        }
        for link in dto.links {
            vnr.add_link(VirtualNodeId::new(link.source), VirtualNodeId::new(link.target), link.bandwidth_demand);
        }
        vnr.validate()?;
        Ok(vnr)
    }

    pub fn with_shape(mut self, shape: VnrShape) -> Self {
        self.shape = shape;
        self
    }

    /// Adds a virtual node. A repeated id overwrites the demand; `validate` does not see duplicates.
    pub fn with_node(mut self, id: u32, cpu_demand: i64) -> Self {
        self.add_node(VirtualNodeId::new(id), cpu_demand);
        self
    }

    /// Adds a virtual link with the next free link id.
    pub fn with_link(mut self, source: u32, target: u32, bandwidth_demand: i64) -> Self {
        self.add_link(VirtualNodeId::new(source), VirtualNodeId::new(target), bandwidth_demand);
        self
    }

    pub fn add_node(&mut self, id: VirtualNodeId, cpu_demand: i64) {
        self.nodes.insert(id, VirtualNode { id, cpu_demand });
    }

    pub fn add_link(&mut self, source: VirtualNodeId, target: VirtualNodeId, bandwidth_demand: i64) -> VirtualLinkId {
        let id = VirtualLinkId::new(self.links.len() as u32);
        self.links.push(VirtualLink { id, source, target, bandwidth_demand });
        id
    }

    /// Time the request leaves when it was embedded at `embedded_at`.
    pub fn departure_time(&self, embedded_at: i64) -> i64 {
        embedded_at + self.holding_duration
    }

    /// Virtual nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &VirtualNode> {
        self.nodes.values()
    }

    /// Virtual links in ascending id order.
    pub fn links(&self) -> &[VirtualLink] {
        &self.links
    }

    pub fn node(&self, id: VirtualNodeId) -> Option<&VirtualNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn cpu_demand(&self, id: VirtualNodeId) -> i64 {
        self.nodes.get(&id).map(|node| node.cpu_demand).unwrap_or(0)
    }

    /// Neighbors of `node` in ascending id order.
    pub fn neighbors(&self, node: VirtualNodeId) -> Vec<VirtualNodeId> {
        let neighbors: BTreeSet<VirtualNodeId> = self.links.iter().filter_map(|link| link.other_end(node)).collect();
        neighbors.into_iter().collect()
    }

    /// Sum of the bandwidth demands of all links incident to `node`.
    pub fn incident_bandwidth(&self, node: VirtualNodeId) -> i64 {
        self.links.iter().filter(|link| link.other_end(node).is_some()).map(|link| link.bandwidth_demand).sum()
    }

    pub fn total_cpu_demand(&self) -> i64 {
        self.nodes.values().map(|node| node.cpu_demand).sum()
    }

    pub fn total_bandwidth_demand(&self) -> i64 {
        self.links.iter().map(|link| link.bandwidth_demand).sum()
    }

    pub fn max_cpu_demand(&self) -> i64 {
        self.nodes.values().map(|node| node.cpu_demand).max().unwrap_or(0)
    }

    /// Revenue of the request: its aggregate cpu plus aggregate bandwidth demand.
    pub fn revenue(&self) -> i64 {
        self.total_cpu_demand() + self.total_bandwidth_demand()
    }

    /// Virtual nodes by descending cpu demand, ties by ascending id.
    pub fn nodes_by_demand(&self) -> Vec<VirtualNodeId> {
        let mut order: Vec<&VirtualNode> = self.nodes.values().collect();
        order.sort_by(|a, b| b.cpu_demand.cmp(&a.cpu_demand).then(a.id.cmp(&b.id)));
        order.into_iter().map(|node| node.id).collect()
    }

    /// Level-by-level breadth-first order over the virtual topology.
    ///
    /// The root is the first node of `priority` and every level is sorted by position
    /// in `priority` (nodes missing from it last, by id). Nodes unreachable from the
    /// root start a new traversal from the best remaining node.
    pub fn bfs_order(&self, priority: &[VirtualNodeId]) -> Vec<VirtualNodeId> {
        let position: BTreeMap<VirtualNodeId, usize> = priority.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let key = |node: &VirtualNodeId| (position.get(node).copied().unwrap_or(usize::MAX), *node);

        let mut roots: Vec<VirtualNodeId> = self.nodes.keys().copied().collect();
        roots.sort_by_key(key);

        let mut visited: BTreeSet<VirtualNodeId> = BTreeSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for root in roots {
            if !visited.insert(root) {
                continue;
            }
            let mut level = vec![root];
            while !level.is_empty() {
                level.sort_by_key(key);
                order.extend(level.iter().copied());

                let mut next = Vec::new();
                for node in &level {
                    for neighbor in self.neighbors(*node) {
                        if visited.insert(neighbor) {
                            next.push(neighbor);
                        }
                    }
                }
                level = next;
            }
        }
        order
    }

    /// Structural checks performed before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::InvalidTopologyInput(format!("VNR {} has no virtual nodes", self.id)));
        }
        if self.arrival_time < 0 || self.holding_duration < 0 {
            return Err(Error::InvalidTopologyInput(format!("VNR {} has negative arrival or holding time", self.id)));
        }
        if let Some(node) = self.nodes.values().find(|node| node.cpu_demand < 0) {
            return Err(Error::InvalidTopologyInput(format!("VNR {} node {} has negative cpu demand", self.id, node.id)));
        }

        let mut pairs: BTreeSet<(VirtualNodeId, VirtualNodeId)> = BTreeSet::new();
        for link in &self.links {
            if link.bandwidth_demand < 0 {
                return Err(Error::InvalidTopologyInput(format!("VNR {} link {} has negative bandwidth demand", self.id, link.id)));
            }
            if link.source == link.target {
                return Err(Error::InvalidTopologyInput(format!("VNR {} link {} is a self-loop", self.id, link.id)));
            }
            if !self.nodes.contains_key(&link.source) || !self.nodes.contains_key(&link.target) {
                return Err(Error::InvalidTopologyInput(format!("VNR {} link {} references an unknown virtual node", self.id, link.id)));
            }
            let pair = (link.source.min(link.target), link.source.max(link.target));
            if !pairs.insert(pair) {
                return Err(Error::InvalidTopologyInput(format!("VNR {} has parallel links between {} and {}", self.id, pair.0, pair.1)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> VirtualNetworkRequest {
        VirtualNetworkRequest::new(VnrId::new(4), 20, 35)
            .with_shape(VnrShape::Star)
            .with_node(1, 30)
            .with_node(2, 12)
            .with_node(3, 18)
            .with_node(4, 14)
            .with_link(1, 2, 16)
            .with_link(1, 3, 11)
            .with_link(1, 4, 13)
    }

    #[test]
    fn test_revenue_and_departure() {
        let vnr = star();
        assert_eq!(vnr.total_cpu_demand(), 74);
        assert_eq!(vnr.total_bandwidth_demand(), 40);
        assert_eq!(vnr.revenue(), 114);
        assert_eq!(vnr.departure_time(vnr.arrival_time), 55);
        assert_eq!(vnr.departure_time(vnr.arrival_time + 5), 60);
    }

    #[test]
    fn test_nodes_by_demand_breaks_ties_by_id() {
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 1).with_node(3, 10).with_node(1, 10).with_node(2, 20);
        assert_eq!(vnr.nodes_by_demand(), vec![VirtualNodeId::new(2), VirtualNodeId::new(1), VirtualNodeId::new(3)]);
    }

    #[test]
    fn test_bfs_order_from_highest_demand() {
        // path 1 - 2 - 3 with node 3 the largest
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 1).with_node(1, 5).with_node(2, 10).with_node(3, 20).with_link(1, 2, 1).with_link(2, 3, 1);
        assert_eq!(vnr.bfs_order(&vnr.nodes_by_demand()), vec![VirtualNodeId::new(3), VirtualNodeId::new(2), VirtualNodeId::new(1)]);
    }

    #[test]
    fn test_bfs_levels_follow_priority() {
        // star around 1; the priority puts leaf 4 before leaf 2
        let vnr = star();
        let priority = [VirtualNodeId::new(1), VirtualNodeId::new(4)];
        assert_eq!(vnr.bfs_order(&priority), vec![VirtualNodeId::new(1), VirtualNodeId::new(4), VirtualNodeId::new(2), VirtualNodeId::new(3)]);
    }

    #[test]
    fn test_validate_rejects_malformed_requests() {
        assert!(star().validate().is_ok());
        assert!(VirtualNetworkRequest::new(VnrId::new(1), 0, 1).validate().is_err());
        assert!(VirtualNetworkRequest::new(VnrId::new(1), 0, 1).with_node(1, 5).with_link(1, 1, 2).validate().is_err());
        assert!(VirtualNetworkRequest::new(VnrId::new(1), 0, 1).with_node(1, 5).with_link(1, 2, 2).validate().is_err());
        assert!(star().with_link(2, 1, 3).validate().is_err());
    }

    #[test]
    fn test_state_transitions() {
        assert!(VnrState::Pending.can_transition_to(VnrState::Embedded));
        assert!(VnrState::Embedded.can_transition_to(VnrState::Departed));
        assert!(!VnrState::Rejected.can_transition_to(VnrState::Departed));
        assert!(!VnrState::Departed.can_transition_to(VnrState::Departed));
    }
}
