use std::collections::BTreeMap;

use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateNodeId, VirtualNodeId};
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

/// Probability of a jump to any node, weighted by its resources.
pub const JUMP_PROBABILITY: f64 = 0.15;

/// Probability of a forward step to a neighbor, weighted by its resources.
pub const FORWARD_PROBABILITY: f64 = 0.85;

const MAX_ITERATIONS: usize = 100;
const CONVERGENCE_EPSILON: f64 = 1e-4;

/// NodeRank over a graph given the resource weight `H(u)` of every node.
///
/// Starts from `H(u) / ΣH` and iterates the jump/forward walk until the total change
/// drops below the epsilon or the iteration cap is hit. Returns `None` when every
/// weight is zero, since the walk then has nowhere to go.
fn node_rank<K: Ord + Copy>(weights: &BTreeMap<K, f64>, adjacency: &BTreeMap<K, Vec<K>>) -> Option<BTreeMap<K, f64>> {
    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return None;
    }

    let weight = |node: &K| weights.get(node).copied().unwrap_or(0.0);
    let neighbors = |node: &K| adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);

    let mut rank: BTreeMap<K, f64> = weights.iter().map(|(node, h)| (*node, h / total)).collect();
    for _ in 0..MAX_ITERATIONS {
        let mass: f64 = rank.values().sum();
        let next: BTreeMap<K, f64> = weights
            .iter()
            .map(|(v, h_v)| {
                let global = h_v / total * JUMP_PROBABILITY * mass;
                let local: f64 = neighbors(v)
                    .iter()
                    .map(|u| {
                        let around_u: f64 = neighbors(u).iter().map(weight).sum();
                        if around_u > 0.0 { h_v / around_u * FORWARD_PROBABILITY * rank.get(u).copied().unwrap_or(0.0) } else { 0.0 }
                    })
                    .sum();
                (*v, global + local)
            })
            .collect();

        let change: f64 = next.iter().map(|(node, value)| (value - rank.get(node).copied().unwrap_or(0.0)).abs()).sum();
        if change < CONVERGENCE_EPSILON {
            break;
        }
        rank = next;
    }
    Some(rank)
}

/// Keys by descending rank, ties by ascending id.
fn by_rank<K: Ord + Copy>(rank: &BTreeMap<K, f64>) -> Vec<K> {
    let mut order: Vec<(K, f64)> = rank.iter().map(|(node, value)| (*node, *value)).collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    order.into_iter().map(|(node, _)| node).collect()
}

/// NodeRank of the substrate with `H(u) = residual cpu × Σ residual bandwidth of incident links`.
pub fn substrate_node_rank(substrate: &SubstrateNetwork) -> Option<BTreeMap<SubstrateNodeId, f64>> {
    let weights: BTreeMap<SubstrateNodeId, f64> = substrate
        .nodes()
        .map(|node| {
            let cpu = substrate.available_cpu(node.id).unwrap_or(0);
            (node.id, (cpu * substrate.incident_bandwidth(node.id)) as f64)
        })
        .collect();
    let adjacency: BTreeMap<SubstrateNodeId, Vec<SubstrateNodeId>> =
        substrate.nodes().map(|node| (node.id, substrate.neighbors(node.id).into_iter().map(|(neighbor, _)| neighbor).collect())).collect();
    node_rank(&weights, &adjacency)
}

/// NodeRank of a request with `H(u) = cpu demand × Σ bandwidth demand of incident links`.
pub fn virtual_node_rank(vnr: &VirtualNetworkRequest) -> Option<BTreeMap<VirtualNodeId, f64>> {
    let weights: BTreeMap<VirtualNodeId, f64> = vnr.nodes().map(|node| (node.id, (node.cpu_demand * vnr.incident_bandwidth(node.id)) as f64)).collect();
    let adjacency: BTreeMap<VirtualNodeId, Vec<VirtualNodeId>> = vnr.nodes().map(|node| (node.id, vnr.neighbors(node.id))).collect();
    node_rank(&weights, &adjacency)
}

/// Substrate nodes by descending NodeRank.
///
/// Without any residual bandwidth the rank is undefined and nodes are ordered by
/// residual cpu instead. Ties go to the lowest id.
pub fn substrate_priority(substrate: &SubstrateNetwork) -> Vec<SubstrateNodeId> {
    if let Some(rank) = substrate_node_rank(substrate) {
        return by_rank(&rank);
    }
    let mut order: Vec<(SubstrateNodeId, i64)> = substrate.nodes().map(|node| (node.id, substrate.available_cpu(node.id).unwrap_or(0))).collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    order.into_iter().map(|(node, _)| node).collect()
}

/// Virtual nodes by descending NodeRank; requests without links fall back to demand order.
pub fn virtual_priority(vnr: &VirtualNetworkRequest) -> Vec<VirtualNodeId> {
    match virtual_node_rank(vnr) {
        Some(rank) => by_rank(&rank),
        None => vnr.nodes_by_demand(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::substrate::topology::german_network;
    use crate::domain::utils::id::VnrId;

    fn v(id: u32) -> VirtualNodeId {
        VirtualNodeId::new(id)
    }

    #[test]
    fn test_rank_is_a_distribution_favouring_rich_nodes() {
        let substrate = german_network().unwrap();
        let rank = substrate_node_rank(&substrate).unwrap();

        assert_eq!(rank.len(), 7);
        assert!(rank.values().all(|value| *value > 0.0));
        // node 2: 150 cpu and four links, node 3: 80 cpu and three thinner links
        assert!(rank[&SubstrateNodeId::new(2)] > rank[&SubstrateNodeId::new(3)]);
        assert_eq!(substrate_priority(&substrate)[0], SubstrateNodeId::new(2));
    }

    #[test]
    fn test_hub_of_a_star_ranks_first() {
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 10).with_node(2, 10).with_node(3, 10).with_link(1, 2, 5).with_link(1, 3, 5);
        let priority = virtual_priority(&vnr);

        assert_eq!(priority, vec![v(1), v(2), v(3)]);
    }

    #[test]
    fn test_request_without_links_falls_back_to_demand() {
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 10).with_node(2, 30);

        assert!(virtual_node_rank(&vnr).is_none());
        assert_eq!(virtual_priority(&vnr), vec![v(2), v(1)]);
    }

    #[test]
    fn test_exhausted_bandwidth_falls_back_to_cpu() {
        let mut substrate = SubstrateNetwork::new("pair");
        substrate.add_node(SubstrateNodeId::new(1), 40).unwrap();
        substrate.add_node(SubstrateNodeId::new(2), 90).unwrap();
        substrate.connect(SubstrateNodeId::new(1), SubstrateNodeId::new(2), 0).unwrap();

        assert!(substrate_node_rank(&substrate).is_none());
        assert_eq!(substrate_priority(&substrate), vec![SubstrateNodeId::new(2), SubstrateNodeId::new(1)]);
    }
}
