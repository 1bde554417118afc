use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use union_find::{QuickUnionUf, UnionBySize, UnionFind};

use crate::domain::utils::id::{VirtualNodeId, VnrId};
use crate::domain::vnr::virtual_network_request::{VirtualNetworkRequest, VnrShape};
use crate::error::{Error, Result};

/// Parameters of the random request generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VnrGeneratorConfig {
    pub count: usize,
    pub node_count_range: (usize, usize),
    pub cpu_range: (i64, i64),
    pub bandwidth_range: (i64, i64),
    pub shapes: Vec<VnrShape>,

    /// Edge probability for `VnrShape::Random`.
    pub edge_probability: f64,

    /// Request `i` arrives at `i * arrival_spacing + jitter` with jitter in `0..=arrival_jitter`.
    pub arrival_spacing: f64,
    pub arrival_jitter: i64,
    pub holding_range: (i64, i64),
    pub seed: u64,
}

impl Default for VnrGeneratorConfig {
    fn default() -> Self {
        Self {
            count: 20,
            node_count_range: (2, 6),
            cpu_range: (10, 50),
            bandwidth_range: (5, 30),
            shapes: vec![VnrShape::Path, VnrShape::Star, VnrShape::Cycle, VnrShape::Tree, VnrShape::Random],
            edge_probability: 0.5,
            arrival_spacing: 1.0,
            arrival_jitter: 5,
            holding_range: (20, 60),
            seed: 42,
        }
    }
}

/// Generates `config.count` requests with ids `1..=count`.
pub fn generate_vnrs(config: &VnrGeneratorConfig) -> Result<Vec<VirtualNetworkRequest>> {
    let (min_nodes, max_nodes) = config.node_count_range;
    if min_nodes == 0 || min_nodes > max_nodes {
        return Err(Error::InvalidTopologyInput(format!("invalid VNR node count range {:?}", config.node_count_range)));
    }
    if config.cpu_range.0 > config.cpu_range.1 || config.bandwidth_range.0 > config.bandwidth_range.1 || config.holding_range.0 > config.holding_range.1 {
        return Err(Error::InvalidTopologyInput("VNR generator ranges must be ordered (min, max)".to_string()));
    }
    if config.shapes.is_empty() {
        return Err(Error::InvalidTopologyInput("VNR generator needs at least one shape".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut vnrs = Vec::with_capacity(config.count);

    for i in 0..config.count {
        let shape = *config.shapes.choose(&mut rng).unwrap_or(&VnrShape::Path);
        let node_count = rng.random_range(min_nodes..=max_nodes);
        let jitter = if config.arrival_jitter > 0 { rng.random_range(0..=config.arrival_jitter) } else { 0 };
        let arrival_time = (config.arrival_spacing * i as f64) as i64 + jitter;
        let holding = rng.random_range(config.holding_range.0..=config.holding_range.1);

        let mut vnr = VirtualNetworkRequest::new(VnrId::new(i as u32 + 1), arrival_time, holding).with_shape(shape);
        for node in 0..node_count {
            vnr.add_node(VirtualNodeId::new(node as u32), rng.random_range(config.cpu_range.0..=config.cpu_range.1));
        }
        for (a, b) in shape_edges(shape, node_count, config.edge_probability, &mut rng) {
            let bandwidth = rng.random_range(config.bandwidth_range.0..=config.bandwidth_range.1);
            vnr.add_link(VirtualNodeId::new(a as u32), VirtualNodeId::new(b as u32), bandwidth);
        }
        vnrs.push(vnr);
    }

    log::debug!("Generated {} VNRs.", vnrs.len());
    Ok(vnrs)
}

fn shape_edges(shape: VnrShape, nodes: usize, edge_probability: f64, rng: &mut StdRng) -> Vec<(usize, usize)> {
    match shape {
        VnrShape::Path | VnrShape::Custom => (1..nodes).map(|i| (i - 1, i)).collect(),
        VnrShape::Star => (1..nodes).map(|i| (0, i)).collect(),
        VnrShape::Cycle => {
            let mut edges: Vec<(usize, usize)> = (1..nodes).map(|i| (i - 1, i)).collect();
            if nodes >= 3 {
                edges.push((nodes - 1, 0));
            }
            edges
        }
        VnrShape::Tree => (1..nodes).map(|i| (rng.random_range(0..i), i)).collect(),
        VnrShape::Random => {
            let probability = edge_probability.clamp(0.0, 1.0);
            let mut edges = Vec::new();
            for i in 0..nodes {
                for j in (i + 1)..nodes {
                    if rng.random_bool(probability) {
                        edges.push((i, j));
                    }
                }
            }
            connect_components(nodes, &mut edges, rng);
            edges
        }
    }
}

/// Joins the components of `edges` by linking a random member of each component to the next.
fn connect_components(nodes: usize, edges: &mut Vec<(usize, usize)>, rng: &mut StdRng) {
    let mut dsu = QuickUnionUf::<UnionBySize>::new(nodes);
    for (a, b) in edges.iter() {
        dsu.union(*a, *b);
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: Vec<Option<usize>> = vec![None; nodes];
    for node in 0..nodes {
        let root = dsu.find(node);
        match group_of_root[root] {
            Some(index) => groups[index].push(node),
            None => {
                group_of_root[root] = Some(groups.len());
                groups.push(vec![node]);
            }
        }
    }

    for pair in groups.windows(2) {
        if let (Some(a), Some(b)) = (pair[0].choose(rng), pair[1].choose(rng)) {
            edges.push(((*a).min(*b), (*a).max(*b)));
        }
    }
}

/// The fixed 20-request reference queue used for fair algorithm comparison.
pub fn reference_queue() -> Vec<VirtualNetworkRequest> {
    let vnr = |id: u32, arrival: i64, lifetime: i64, shape: VnrShape| VirtualNetworkRequest::new(VnrId::new(id), arrival, lifetime).with_shape(shape);

    vec![
        vnr(1, 5, 20, VnrShape::Path).with_node(1, 15).with_node(2, 25).with_node(3, 20).with_link(1, 2, 10).with_link(2, 3, 15),
        vnr(2, 10, 30, VnrShape::Cycle).with_node(1, 20).with_node(2, 15).with_node(3, 25).with_link(1, 2, 8).with_link(2, 3, 12).with_link(1, 3, 10),
        vnr(3, 15, 25, VnrShape::Path)
            .with_node(1, 18)
            .with_node(2, 22)
            .with_node(3, 16)
            .with_node(4, 28)
            .with_link(1, 2, 12)
            .with_link(2, 3, 9)
            .with_link(3, 4, 14),
        vnr(4, 20, 35, VnrShape::Star)
            .with_node(1, 30)
            .with_node(2, 12)
            .with_node(3, 18)
            .with_node(4, 14)
            .with_link(1, 2, 16)
            .with_link(1, 3, 11)
            .with_link(1, 4, 13),
        vnr(5, 25, 40, VnrShape::Path)
            .with_node(1, 14)
            .with_node(2, 26)
            .with_node(3, 19)
            .with_node(4, 23)
            .with_node(5, 17)
            .with_link(1, 2, 7)
            .with_link(2, 3, 11)
            .with_link(3, 4, 9)
            .with_link(4, 5, 13),
        vnr(6, 30, 15, VnrShape::Path).with_node(1, 35).with_node(2, 40).with_node(3, 32).with_link(1, 2, 25).with_link(2, 3, 20),
        vnr(7, 35, 28, VnrShape::Cycle)
            .with_node(1, 21)
            .with_node(2, 17)
            .with_node(3, 24)
            .with_node(4, 19)
            .with_link(1, 2, 8)
            .with_link(2, 3, 12)
            .with_link(3, 4, 10)
            .with_link(4, 1, 15),
        vnr(8, 40, 45, VnrShape::Star)
            .with_node(1, 35)
            .with_node(2, 10)
            .with_node(3, 12)
            .with_node(4, 15)
            .with_node(5, 11)
            .with_link(1, 2, 14)
            .with_link(1, 3, 9)
            .with_link(1, 4, 17)
            .with_link(1, 5, 12),
        vnr(9, 45, 22, VnrShape::Cycle).with_node(1, 8).with_node(2, 12).with_node(3, 10).with_link(1, 2, 5).with_link(2, 3, 6).with_link(1, 3, 4),
        vnr(10, 50, 33, VnrShape::Random)
            .with_node(1, 22)
            .with_node(2, 18)
            .with_node(3, 25)
            .with_node(4, 20)
            .with_link(1, 2, 11)
            .with_link(1, 3, 14)
            .with_link(2, 4, 9)
            .with_link(3, 4, 16)
            .with_link(1, 4, 12),
        vnr(11, 55, 38, VnrShape::Cycle)
            .with_node(1, 16)
            .with_node(2, 21)
            .with_node(3, 14)
            .with_node(4, 19)
            .with_node(5, 23)
            .with_link(1, 2, 7)
            .with_link(2, 3, 10)
            .with_link(3, 4, 8)
            .with_link(4, 5, 12)
            .with_link(5, 1, 9),
        vnr(12, 60, 18, VnrShape::Path).with_node(1, 13).with_node(2, 27).with_node(3, 15).with_link(1, 2, 18).with_link(2, 3, 11),
        vnr(13, 65, 42, VnrShape::Tree)
            .with_node(1, 24)
            .with_node(2, 16)
            .with_node(3, 29)
            .with_node(4, 12)
            .with_link(1, 2, 13)
            .with_link(1, 3, 15)
            .with_link(2, 4, 8),
        vnr(14, 70, 50, VnrShape::Random)
            .with_node(1, 20)
            .with_node(2, 15)
            .with_node(3, 25)
            .with_node(4, 18)
            .with_node(5, 22)
            .with_link(1, 2, 10)
            .with_link(1, 3, 14)
            .with_link(2, 4, 7)
            .with_link(3, 5, 11)
            .with_link(4, 5, 13)
            .with_link(1, 5, 9),
        vnr(15, 75, 26, VnrShape::Cycle).with_node(1, 18).with_node(2, 22).with_node(3, 16).with_link(1, 2, 12).with_link(2, 3, 14).with_link(1, 3, 8),
        vnr(16, 80, 35, VnrShape::Path)
            .with_node(1, 17)
            .with_node(2, 21)
            .with_node(3, 14)
            .with_node(4, 26)
            .with_link(1, 2, 22)
            .with_link(2, 3, 18)
            .with_link(3, 4, 25),
        vnr(17, 85, 44, VnrShape::Tree)
            .with_node(1, 28)
            .with_node(2, 13)
            .with_node(3, 19)
            .with_node(4, 15)
            .with_node(5, 11)
            .with_link(1, 2, 16)
            .with_link(1, 3, 12)
            .with_link(2, 4, 9)
            .with_link(2, 5, 7),
        vnr(18, 90, 12, VnrShape::Path).with_node(1, 31).with_node(2, 19).with_node(3, 24).with_link(1, 2, 17).with_link(2, 3, 21),
        vnr(19, 95, 37, VnrShape::Cycle)
            .with_node(1, 20)
            .with_node(2, 14)
            .with_node(3, 18)
            .with_node(4, 25)
            .with_link(1, 2, 10)
            .with_link(1, 3, 12)
            .with_link(2, 4, 14)
            .with_link(3, 4, 11),
        vnr(20, 100, 48, VnrShape::Tree)
            .with_node(1, 16)
            .with_node(2, 23)
            .with_node(3, 20)
            .with_node(4, 17)
            .with_node(5, 21)
            .with_link(1, 2, 8)
            .with_link(2, 3, 13)
            .with_link(3, 4, 15)
            .with_link(3, 5, 10),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_queue_is_valid() {
        let queue = reference_queue();
        assert_eq!(queue.len(), 20);
        for vnr in &queue {
            vnr.validate().unwrap();
        }
        assert!(queue.windows(2).all(|w| w[0].arrival_time < w[1].arrival_time));
    }

    #[test]
    fn test_generated_vnrs_respect_ranges() {
        let config = VnrGeneratorConfig { count: 50, ..Default::default() };
        let vnrs = generate_vnrs(&config).unwrap();

        assert_eq!(vnrs.len(), 50);
        for vnr in &vnrs {
            vnr.validate().unwrap();
            assert!((2..=6).contains(&vnr.node_count()));
            assert!(vnr.nodes().all(|node| (10..=50).contains(&node.cpu_demand)));
            assert!(vnr.links().iter().all(|link| (5..=30).contains(&link.bandwidth_demand)));
            assert!((20..=60).contains(&vnr.holding_duration));
            // every shape produced here is connected: n - 1 links at least
            assert!(vnr.link_count() + 1 >= vnr.node_count());
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        let config = VnrGeneratorConfig::default();
        assert_eq!(generate_vnrs(&config).unwrap(), generate_vnrs(&config).unwrap());
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let config = VnrGeneratorConfig { node_count_range: (4, 2), ..Default::default() };
        assert!(generate_vnrs(&config).is_err());
    }
}
