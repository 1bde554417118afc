use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::domain::substrate::path::SubstratePath;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};
use crate::error::{Error, Result};

/// Hard cap on the number of simple paths any caller may enumerate between two nodes.
pub const MAX_K_PATHS: usize = 16;

impl SubstrateNetwork {
    /// Shortest path by hop count; among equally short paths the one with the widest
    /// bottleneck of available bandwidth wins, then the one through lower node ids.
    pub fn shortest_path(&self, source: SubstrateNodeId, target: SubstrateNodeId) -> Option<SubstratePath> {
        self.shortest_path_with(source, target, |_| true, |link_id| self.available_bandwidth(link_id).unwrap_or(0))
    }

    /// Shortest path over the links accepted by `allow`, tie-broken by the bottleneck of `residual`.
    pub fn shortest_path_with<A, R>(&self, source: SubstrateNodeId, target: SubstrateNodeId, allow: A, residual: R) -> Option<SubstratePath>
    where
        A: Fn(SubstrateLinkId) -> bool,
        R: Fn(SubstrateLinkId) -> i64,
    {
        if !self.contains_node(source) || !self.contains_node(target) {
            return None;
        }
        if source == target {
            return Some(SubstratePath::new(vec![source], Vec::new()));
        }

        // 1. Hop distances from the source
        let mut distance: BTreeMap<SubstrateNodeId, usize> = BTreeMap::new();
        let mut layers: Vec<Vec<SubstrateNodeId>> = vec![vec![source]];
        distance.insert(source, 0);

        while !distance.contains_key(&target) {
            let mut next_layer = Vec::new();
            for node in layers.last().into_iter().flatten() {
                for (neighbor, link_id) in self.neighbors(*node) {
                    if allow(link_id) && !distance.contains_key(&neighbor) {
                        distance.insert(neighbor, layers.len());
                        next_layer.push(neighbor);
                    }
                }
            }
            if next_layer.is_empty() {
                return None;
            }
            next_layer.sort();
            layers.push(next_layer);
        }

        // 2. Widest bottleneck over the shortest-path DAG, layer by layer
        let mut best: BTreeMap<SubstrateNodeId, (i64, Option<(SubstrateNodeId, SubstrateLinkId)>)> = BTreeMap::new();
        best.insert(source, (i64::MAX, None));

        for (depth, layer) in layers.iter().enumerate().skip(1) {
            for node in layer {
                let mut choice: Option<(i64, SubstrateNodeId, SubstrateLinkId)> = None;
                for (neighbor, link_id) in self.neighbors(*node) {
                    if !allow(link_id) || distance.get(&neighbor) != Some(&(depth - 1)) {
                        continue;
                    }
                    let Some((width, _)) = best.get(&neighbor) else { continue };
                    let candidate = (*width).min(residual(link_id));
                    if choice.is_none_or(|(current, _, _)| candidate > current) {
                        choice = Some((candidate, neighbor, link_id));
                    }
                }
                if let Some((width, predecessor, link_id)) = choice {
                    best.insert(*node, (width, Some((predecessor, link_id))));
                }
            }
        }

        // 3. Walk back from the target
        let mut nodes = vec![target];
        let mut links = Vec::new();
        let mut current = target;
        while let Some((_, Some((predecessor, link_id)))) = best.get(&current) {
            links.push(*link_id);
            nodes.push(*predecessor);
            current = *predecessor;
        }
        if current != source {
            return None;
        }

        nodes.reverse();
        links.reverse();
        Some(SubstratePath::new(nodes, links))
    }

    /// Enumerates at most `k` loop-free paths from `source` to `target` in nondecreasing
    /// hop count (Yen's algorithm on hop-count shortest paths).
    ///
    /// `k` must lie within `1..=MAX_K_PATHS`; any other value is rejected instead of
    /// enumerating an unbounded number of simple paths.
    pub fn k_shortest_paths(&self, source: SubstrateNodeId, target: SubstrateNodeId, k: usize) -> Result<Vec<SubstratePath>> {
        if k == 0 || k > MAX_K_PATHS {
            return Err(Error::UnboundedPathSearch { requested: k, max: MAX_K_PATHS });
        }

        let Some(first) = self.bfs_path(source, target, &HashSet::new(), &HashSet::new()) else {
            log::debug!("NoPathFound: {} => {}", source, target);
            return Ok(Vec::new());
        };

        let mut found: Vec<SubstratePath> = vec![first];
        let mut candidates: BTreeSet<(usize, SubstratePath)> = BTreeSet::new();

        while found.len() < k {
            let Some(previous) = found.last().cloned() else { break };

            for spur_index in 0..previous.hop_count() {
                let spur_node = previous.nodes[spur_index];
                let root = SubstratePath::new(previous.nodes[..=spur_index].to_vec(), previous.links[..spur_index].to_vec());

                let banned_links: HashSet<SubstrateLinkId> = found
                    .iter()
                    .filter(|path| path.nodes.len() > spur_index + 1 && path.nodes[..=spur_index] == root.nodes[..])
                    .map(|path| path.links[spur_index])
                    .collect();
                let banned_nodes: HashSet<SubstrateNodeId> = root.nodes[..spur_index].iter().copied().collect();

                if let Some(spur) = self.bfs_path(spur_node, target, &banned_nodes, &banned_links) {
                    let total = root.concat(&spur);
                    if !found.contains(&total) {
                        candidates.insert((total.hop_count(), total));
                    }
                }
            }

            match candidates.pop_first() {
                Some((_, next)) => found.push(next),
                None => break,
            }
        }

        log::trace!("Paths found {} => {}: {} of at most {}", source, target, found.len(), k);
        Ok(found)
    }

    /// Plain hop-count BFS avoiding the given nodes and links; lower ids are explored first.
    fn bfs_path(
        &self,
        source: SubstrateNodeId,
        target: SubstrateNodeId,
        banned_nodes: &HashSet<SubstrateNodeId>,
        banned_links: &HashSet<SubstrateLinkId>,
    ) -> Option<SubstratePath> {
        if !self.contains_node(source) || !self.contains_node(target) || banned_nodes.contains(&source) {
            return None;
        }

        let mut parent: BTreeMap<SubstrateNodeId, Option<(SubstrateNodeId, SubstrateLinkId)>> = BTreeMap::new();
        let mut queue = VecDeque::from([source]);
        parent.insert(source, None);

        while let Some(node) = queue.pop_front() {
            if node == target {
                break;
            }
            for (neighbor, link_id) in self.neighbors(node) {
                if banned_links.contains(&link_id) || banned_nodes.contains(&neighbor) || parent.contains_key(&neighbor) {
                    continue;
                }
                parent.insert(neighbor, Some((node, link_id)));
                queue.push_back(neighbor);
            }
        }

        if !parent.contains_key(&target) {
            return None;
        }

        let mut nodes = vec![target];
        let mut links = Vec::new();
        let mut current = target;
        while let Some(Some((previous, link_id))) = parent.get(&current) {
            nodes.push(*previous);
            links.push(*link_id);
            current = *previous;
        }
        nodes.reverse();
        links.reverse();
        Some(SubstratePath::new(nodes, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u32) -> SubstrateNodeId {
        SubstrateNodeId::new(id)
    }

    /// Square 1-2-3-4-1 with a diagonal 1-3.
    fn square() -> SubstrateNetwork {
        let mut substrate = SubstrateNetwork::new("square");
        for id in 1..=4 {
            substrate.add_node(n(id), 100).unwrap();
        }
        substrate.connect(n(1), n(2), 10).unwrap();
        substrate.connect(n(2), n(3), 10).unwrap();
        substrate.connect(n(3), n(4), 50).unwrap();
        substrate.connect(n(4), n(1), 50).unwrap();
        substrate.connect(n(1), n(3), 5).unwrap();
        substrate
    }

    #[test]
    fn test_shortest_path_prefers_fewest_hops() {
        let substrate = square();
        let path = substrate.shortest_path(n(1), n(3)).unwrap();
        assert_eq!(path.nodes, vec![n(1), n(3)]);
        assert_eq!(path.hop_count(), 1);
    }

    #[test]
    fn test_shortest_path_tie_breaks_on_residual_bandwidth() {
        let substrate = square();
        // 2 -> 4 has two 2-hop routes: via 1 (10, 50) and via 3 (10, 50); equal width -> lower id
        let path = substrate.shortest_path(n(2), n(4)).unwrap();
        assert_eq!(path.nodes, vec![n(2), n(1), n(4)]);

        // Restricting to links other than 1-3 and asking 1 -> 3 gives two 2-hop routes; via 4 is wider.
        let diagonal = substrate.link_between(n(1), n(3)).unwrap();
        let path = substrate
            .shortest_path_with(n(1), n(3), |link| link != diagonal, |link| substrate.available_bandwidth(link).unwrap())
            .unwrap();
        assert_eq!(path.nodes, vec![n(1), n(4), n(3)]);
    }

    #[test]
    fn test_k_shortest_paths_bounded_and_ordered() {
        let substrate = square();
        let paths = substrate.k_shortest_paths(n(1), n(3), 3).unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].hop_count(), 1);
        assert_eq!(paths[1].hop_count(), 2);
        assert_eq!(paths[2].hop_count(), 2);
        assert_ne!(paths[1], paths[2]);

        // Only three simple paths exist
        let all = substrate.k_shortest_paths(n(1), n(3), MAX_K_PATHS).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_k_shortest_paths_rejects_unbounded_k() {
        let substrate = square();
        assert!(matches!(substrate.k_shortest_paths(n(1), n(3), 0), Err(Error::UnboundedPathSearch { .. })));
        assert!(matches!(substrate.k_shortest_paths(n(1), n(3), MAX_K_PATHS + 1), Err(Error::UnboundedPathSearch { .. })));
    }

    #[test]
    fn test_no_path_between_components() {
        let mut substrate = square();
        substrate.add_node(n(9), 10).unwrap();
        assert!(substrate.shortest_path(n(1), n(9)).is_none());
        assert!(substrate.k_shortest_paths(n(1), n(9), 3).unwrap().is_empty());
    }
}
