use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::domain::algorithm::algorithm_trait::{EmbedResult, EmbeddingAlgorithm};
use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::node_rank::{substrate_priority, virtual_priority};
use crate::domain::algorithm::placement::{place_nodes_in_order, route_links_shortest};
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::residual_view::ResidualView;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

/// Nodes and links discovered by one bounded random walk.
#[derive(Debug, Default)]
struct WalkRegion {
    visited: Vec<SubstrateNodeId>,
    depth: BTreeMap<SubstrateNodeId, usize>,
    links: HashSet<SubstrateLinkId>,
}

impl WalkRegion {
    /// Visited nodes by hop distance from the seed; nodes at the same distance by
    /// their position in `priority`.
    fn candidates(&self, priority: &[SubstrateNodeId]) -> Vec<SubstrateNodeId> {
        let position: BTreeMap<SubstrateNodeId, usize> = priority.iter().enumerate().map(|(i, node)| (*node, i)).collect();
        let mut candidates = self.visited.clone();
        candidates.sort_by_key(|node| (self.depth.get(node).copied().unwrap_or(usize::MAX), position.get(node).copied().unwrap_or(usize::MAX)));
        candidates
    }
}

/// Random-walk region discovery followed by BFS-ordered node mapping.
///
/// A randomized breadth-first walk of at most `max_hops` around a feasible seed node
/// defines the region. Virtual nodes are taken in NodeRank-ordered BFS order and land
/// on region nodes closest to the seed first, higher NodeRank first among equals.
/// Links prefer the links the walk touched.
#[derive(Debug)]
pub struct RwBfs {
    rng: StdRng,
    max_hops: usize,
    walk_attempts: usize,
}

impl RwBfs {
    pub fn new(seed: u64, max_hops: usize, walk_attempts: usize) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), max_hops, walk_attempts: walk_attempts.max(1) }
    }

    fn walk(&mut self, substrate: &SubstrateNetwork, seed: SubstrateNodeId) -> WalkRegion {
        let mut region = WalkRegion::default();
        let mut seen: BTreeSet<SubstrateNodeId> = BTreeSet::from([seed]);
        let mut queue: VecDeque<(SubstrateNodeId, usize)> = VecDeque::from([(seed, 0)]);

        while let Some((node, depth)) = queue.pop_front() {
            region.visited.push(node);
            region.depth.insert(node, depth);
            if depth >= self.max_hops {
                continue;
            }

            let mut neighbors = substrate.neighbors(node);
            neighbors.shuffle(&mut self.rng);
            for (neighbor, link_id) in neighbors {
                if seen.insert(neighbor) {
                    queue.push_back((neighbor, depth + 1));
                    region.links.insert(link_id);
                } else if region.visited.contains(&neighbor) || queue.iter().any(|(queued, _)| *queued == neighbor) {
                    region.links.insert(link_id);
                }
            }
        }
        region
    }
}

impl EmbeddingAlgorithm for RwBfs {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::RwBfs
    }

    fn embed(&mut self, substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult {
        let largest = vnr.max_cpu_demand();
        let seeds: Vec<SubstrateNodeId> = substrate.nodes().filter(|node| substrate.available_cpu(node.id).unwrap_or(0) >= largest).map(|node| node.id).collect();
        if seeds.is_empty() {
            return Err(RejectionReason::InsufficientNodeCapacity);
        }

        let virtual_order = vnr.bfs_order(&virtual_priority(vnr));
        let priority = substrate_priority(substrate);

        let mut last_reason = RejectionReason::InsufficientNodeCapacity;
        for attempt in 0..self.walk_attempts {
            let Some(seed) = seeds.choose(&mut self.rng).copied() else { break };
            let region = self.walk(substrate, seed);
            let candidates = region.candidates(&priority);

            let mut view = ResidualView::new(substrate, vnr.id);
            let outcome = place_nodes_in_order(&mut view, vnr, &virtual_order, &candidates).and_then(|_| route_links_shortest(&mut view, vnr, Some(&region.links)));
            match outcome {
                Ok(()) => return Ok(view.into_embedding()),
                Err(reason) => {
                    log::debug!("VNR {}: walk {} from node {} failed with {}.", vnr.id, attempt + 1, seed, reason);
                    last_reason = reason;
                }
            }
        }
        Err(last_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::substrate::topology::german_network;
    use crate::domain::utils::id::VnrId;

    fn star_vnr() -> VirtualNetworkRequest {
        VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 20).with_node(2, 10).with_node(3, 10).with_link(1, 2, 5).with_link(1, 3, 5)
    }

    #[test]
    fn test_walk_respects_hop_bound() {
        let substrate = german_network().unwrap();
        let mut algorithm = RwBfs::new(7, 1, 3);
        let region = algorithm.walk(&substrate, SubstrateNodeId::new(7));

        // node 7 only reaches 4 and 5 in one hop
        let mut visited = region.visited.clone();
        visited.sort();
        assert_eq!(visited, vec![SubstrateNodeId::new(4), SubstrateNodeId::new(5), SubstrateNodeId::new(7)]);
        assert_eq!(region.visited[0], SubstrateNodeId::new(7));
    }

    #[test]
    fn test_candidates_prefer_near_then_ranked_nodes() {
        let substrate = german_network().unwrap();
        let region = RwBfs::new(7, 1, 3).walk(&substrate, SubstrateNodeId::new(7));
        let priority = substrate_priority(&substrate);

        let candidates = region.candidates(&priority);
        assert_eq!(candidates[0], SubstrateNodeId::new(7));
        let position = |node: SubstrateNodeId| priority.iter().position(|p| *p == node).unwrap();
        assert!(position(candidates[1]) < position(candidates[2]));
    }

    #[test]
    fn test_same_seed_same_embedding() {
        let substrate = german_network().unwrap();
        let first = RwBfs::new(11, 3, 3).embed(&substrate, &star_vnr()).unwrap();
        let second = RwBfs::new(11, 3, 3).embed(&substrate, &star_vnr()).unwrap();
        assert_eq!(first, second);
        assert!(first.validate_against(&star_vnr()).is_ok());
    }

    #[test]
    fn test_no_seed_node_is_rejected() {
        let substrate = german_network().unwrap();
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 1000);
        assert_eq!(RwBfs::new(1, 3, 3).embed(&substrate, &vnr), Err(RejectionReason::InsufficientNodeCapacity));
    }
}
