use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::domain::algorithm::algorithm_trait::{EmbedResult, EmbeddingAlgorithm};
use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::node_rank::{substrate_priority, virtual_priority};
use crate::domain::algorithm::placement::route_links_k_shortest;
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::residual_view::ResidualView;
use crate::domain::substrate::path_search::MAX_K_PATHS;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateNodeId, VirtualNodeId};
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;
use crate::error::{Error, Result};

/// Probability of jumping back to the start node on every step of the walk.
pub const RESTART_PROBABILITY: f64 = 0.15;

/// Steps walked per substrate node.
const STEPS_PER_NODE: usize = 8;

/// Random walk with restart for candidate discovery, maximum bipartite matching for
/// node mapping and bounded k-shortest paths for link mapping.
///
/// Both sides of the matching are sorted by NodeRank, so augmenting paths pair
/// highly ranked virtual nodes with highly ranked substrate nodes where they can.
#[derive(Debug)]
pub struct RwMaxMatch {
    rng: StdRng,
    k_paths: usize,
}

impl RwMaxMatch {
    pub fn new(seed: u64, k_paths: usize) -> Result<Self> {
        if k_paths == 0 || k_paths > MAX_K_PATHS {
            return Err(Error::UnboundedPathSearch { requested: k_paths, max: MAX_K_PATHS });
        }
        Ok(Self { rng: StdRng::seed_from_u64(seed), k_paths })
    }

    /// Substrate nodes in first-visit order of a restarting random walk.
    fn discover_candidates(&mut self, substrate: &SubstrateNetwork, start: SubstrateNodeId) -> Vec<SubstrateNodeId> {
        let mut candidates = vec![start];
        let mut current = start;

        for _ in 0..substrate.node_count() * STEPS_PER_NODE {
            if candidates.len() == substrate.node_count() {
                break;
            }
            if self.rng.random_bool(RESTART_PROBABILITY) {
                current = start;
                continue;
            }
            let neighbors = substrate.neighbors(current);
            let Some((next, _)) = neighbors.choose(&mut self.rng).copied() else {
                current = start;
                continue;
            };
            if !candidates.contains(&next) {
                candidates.push(next);
            }
            current = next;
        }
        candidates
    }
}

/// Kuhn's augmenting-path matching. `compatible[v]` lists the right-hand indices left
/// vertex `v` may take; returns the right index matched to each left vertex.
fn maximum_matching(compatible: &[Vec<usize>], right_count: usize) -> Vec<Option<usize>> {
    fn augment(left: usize, compatible: &[Vec<usize>], seen: &mut [bool], owner: &mut [Option<usize>]) -> bool {
        for &right in &compatible[left] {
            if seen[right] {
                continue;
            }
            seen[right] = true;
            let free = match owner[right] {
                None => true,
                Some(other) => augment(other, compatible, seen, owner),
            };
            if free {
                owner[right] = Some(left);
                return true;
            }
        }
        false
    }

    let mut owner: Vec<Option<usize>> = vec![None; right_count];
    for left in 0..compatible.len() {
        let mut seen = vec![false; right_count];
        augment(left, compatible, &mut seen, &mut owner);
    }

    let mut assignment = vec![None; compatible.len()];
    for (right, left) in owner.iter().enumerate() {
        if let Some(left) = left {
            assignment[*left] = Some(right);
        }
    }
    assignment
}

impl EmbeddingAlgorithm for RwMaxMatch {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::RwMaxMatch
    }

    fn embed(&mut self, substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult {
        let largest = vnr.max_cpu_demand();
        let starts: Vec<SubstrateNodeId> = substrate.nodes().filter(|node| substrate.available_cpu(node.id).unwrap_or(0) >= largest).map(|node| node.id).collect();
        let Some(start) = starts.choose(&mut self.rng).copied() else {
            return Err(RejectionReason::NoFeasibleNodeMapping);
        };
        let discovered = self.discover_candidates(substrate, start);
        let candidates: Vec<SubstrateNodeId> = substrate_priority(substrate).into_iter().filter(|node| discovered.contains(node)).collect();

        let mut view = ResidualView::new(substrate, vnr.id);
        let virtual_nodes: Vec<VirtualNodeId> = virtual_priority(vnr);
        let compatible: Vec<Vec<usize>> = virtual_nodes
            .iter()
            .map(|virtual_node| {
                let demand = vnr.cpu_demand(*virtual_node);
                candidates.iter().enumerate().filter(|(_, node)| view.can_host(**node, demand)).map(|(index, _)| index).collect()
            })
            .collect();

        let assignment = maximum_matching(&compatible, candidates.len());
        let matched = assignment.iter().filter(|right| right.is_some()).count();
        if matched < virtual_nodes.len() {
            log::debug!("VNR {}: matched {} of {} virtual nodes among {} candidates.", vnr.id, matched, virtual_nodes.len(), candidates.len());
            return Err(RejectionReason::NoFeasibleNodeMapping);
        }

        for (virtual_node, right) in virtual_nodes.iter().zip(assignment) {
            if let Some(index) = right {
                view.place_node(*virtual_node, candidates[index], vnr.cpu_demand(*virtual_node));
            }
        }

        route_links_k_shortest(&mut view, vnr, self.k_paths)?;
        Ok(view.into_embedding())
    }
}
