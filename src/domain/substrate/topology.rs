use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::SubstrateNodeId;
use crate::error::{Error, Result};

/// Synthetic substrate families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyFamily {
    /// Erdős–Rényi edges laid over a spanning path.
    Random,
    /// Barabási–Albert preferential attachment.
    ScaleFree,
    /// Square grid with 4-neighborhood.
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubstrateGeneratorConfig {
    pub nodes: usize,
    pub family: TopologyFamily,

    /// Edge probability for `Random`; for `ScaleFree` the attachment count is `max(1, nodes * density / 2)`.
    pub density: f64,
    pub cpu_range: (i64, i64),
    pub bandwidth_range: (i64, i64),
    pub seed: u64,
}

impl Default for SubstrateGeneratorConfig {
    fn default() -> Self {
        Self { nodes: 20, family: TopologyFamily::Random, density: 0.15, cpu_range: (50, 100), bandwidth_range: (50, 100), seed: 42 }
    }
}

/// Builds a reference substrate from `(id, cpu)` nodes and `(a, b, bandwidth)` links.
fn build_reference(name: &str, nodes: &[(u32, i64)], links: &[(u32, u32, i64)]) -> Result<SubstrateNetwork> {
    let mut substrate = SubstrateNetwork::new(name);
    for (id, cpu) in nodes {
        substrate.add_node(SubstrateNodeId::new(*id), *cpu)?;
    }
    for (a, b, bandwidth) in links {
        substrate.connect(SubstrateNodeId::new(*a), SubstrateNodeId::new(*b), *bandwidth)?;
    }
    substrate.validate()?;
    Ok(substrate)
}

/// German reference substrate: 7 nodes, 11 links.
pub fn german_network() -> Result<SubstrateNetwork> {
    build_reference(
        "German",
        &[(1, 100), (2, 150), (3, 80), (4, 120), (5, 90), (6, 110), (7, 140)],
        &[
            (1, 2, 100),
            (1, 3, 80),
            (2, 4, 120),
            (2, 5, 90),
            (2, 6, 135),
            (3, 4, 100),
            (4, 5, 110),
            (6, 1, 95),
            (7, 5, 105),
            (7, 4, 125),
            (2, 3, 85),
        ],
    )
}

/// Italian reference substrate: 10 nodes, 15 links.
pub fn italian_network() -> Result<SubstrateNetwork> {
    build_reference(
        "Italian",
        &[(1, 100), (2, 150), (3, 80), (4, 120), (5, 90), (6, 110), (7, 140), (8, 200), (9, 170), (10, 130)],
        &[
            (1, 2, 100),
            (1, 3, 80),
            (1, 7, 120),
            (2, 4, 90),
            (2, 7, 135),
            (3, 5, 100),
            (4, 8, 110),
            (5, 6, 95),
            (5, 7, 105),
            (6, 7, 125),
            (6, 9, 85),
            (7, 8, 145),
            (7, 9, 185),
            (8, 10, 70),
            (9, 10, 200),
        ],
    )
}

/// Generates a connected synthetic substrate. Node ids are `0..n`.
///
/// The connectivity postcondition is checked before returning; a generator that
/// produced a disconnected graph yields `InvalidTopologyInput`.
pub fn generate_substrate(config: &SubstrateGeneratorConfig) -> Result<SubstrateNetwork> {
    if config.nodes == 0 {
        return Err(Error::InvalidTopologyInput("substrate generator needs at least one node".to_string()));
    }
    if config.cpu_range.0 > config.cpu_range.1 || config.bandwidth_range.0 > config.bandwidth_range.1 || config.cpu_range.0 < 0 || config.bandwidth_range.0 < 0 {
        return Err(Error::InvalidTopologyInput(format!("invalid resource ranges {:?} / {:?}", config.cpu_range, config.bandwidth_range)));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let edges = match config.family {
        TopologyFamily::Random => random_edges(config.nodes, config.density, &mut rng),
        TopologyFamily::ScaleFree => scale_free_edges(config.nodes, config.density, &mut rng),
        TopologyFamily::Grid => grid_edges(config.nodes),
    };
    let node_count = match config.family {
        TopologyFamily::Grid => grid_side(config.nodes).pow(2),
        _ => config.nodes,
    };

    let mut substrate = SubstrateNetwork::new(format!("{:?}-{}", config.family, node_count));
    for id in 0..node_count {
        let cpu = rng.random_range(config.cpu_range.0..=config.cpu_range.1);
        substrate.add_node(SubstrateNodeId::new(id as u32), cpu)?;
    }
    for (a, b) in edges {
        let bandwidth = rng.random_range(config.bandwidth_range.0..=config.bandwidth_range.1);
        substrate.connect(SubstrateNodeId::new(a as u32), SubstrateNodeId::new(b as u32), bandwidth)?;
    }

    if !substrate.is_connected() {
        return Err(Error::InvalidTopologyInput(format!("failed to create a connected {:?} substrate", config.family)));
    }

    log::info!("Generated {:?} substrate with {} nodes and {} links.", config.family, substrate.node_count(), substrate.link_count());
    Ok(substrate)
}

fn random_edges(nodes: usize, probability: f64, rng: &mut StdRng) -> Vec<(usize, usize)> {
    // Spanning path first, so the result is connected regardless of the probability
    let mut edges: Vec<(usize, usize)> = (1..nodes).map(|i| (i - 1, i)).collect();
    let probability = probability.clamp(0.0, 1.0);

    for i in 0..nodes {
        for j in (i + 2)..nodes {
            if rng.random_bool(probability) {
                edges.push((i, j));
            }
        }
    }
    edges
}

fn scale_free_edges(nodes: usize, density: f64, rng: &mut StdRng) -> Vec<(usize, usize)> {
    let attach = ((nodes as f64 * density / 2.0) as usize).max(1);
    if nodes <= attach {
        return random_edges(nodes, 1.0, rng);
    }

    // Seed: star over the first `attach + 1` nodes
    let mut edges: Vec<(usize, usize)> = (1..=attach).map(|i| (0, i)).collect();
    let mut endpoints: Vec<usize> = edges.iter().flat_map(|(a, b)| [*a, *b]).collect();

    for new_node in (attach + 1)..nodes {
        let mut targets: Vec<usize> = Vec::with_capacity(attach);
        while targets.len() < attach {
            // Sampling from the endpoint list is sampling proportional to degree
            if let Some(candidate) = endpoints.choose(rng).copied() {
                if !targets.contains(&candidate) {
                    targets.push(candidate);
                }
            }
        }
        targets.sort();
        for target in targets {
            edges.push((target, new_node));
            endpoints.push(target);
            endpoints.push(new_node);
        }
    }
    edges
}

fn grid_side(nodes: usize) -> usize {
    ((nodes as f64).sqrt().floor() as usize).max(1)
}

fn grid_edges(nodes: usize) -> Vec<(usize, usize)> {
    let side = grid_side(nodes);
    let mut edges = Vec::new();
    for row in 0..side {
        for col in 0..side {
            let id = row * side + col;
            if col + 1 < side {
                edges.push((id, id + 1));
            }
            if row + 1 < side {
                edges.push((id, id + side));
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_networks_shape() {
        let german = german_network().unwrap();
        assert_eq!(german.node_count(), 7);
        assert_eq!(german.link_count(), 11);
        assert_eq!(german.get_total_cpu_capacity(), 790);

        let italian = italian_network().unwrap();
        assert_eq!(italian.node_count(), 10);
        assert_eq!(italian.link_count(), 15);
    }

    #[test]
    fn test_generated_families_are_connected() {
        for family in [TopologyFamily::Random, TopologyFamily::ScaleFree, TopologyFamily::Grid] {
            let config = SubstrateGeneratorConfig { nodes: 25, family, density: 0.1, ..Default::default() };
            let substrate = generate_substrate(&config).unwrap();
            assert!(substrate.is_connected(), "{:?} substrate must be connected", family);
            assert!(substrate.validate().is_ok());
        }
    }

    #[test]
    fn test_grid_dimensions() {
        let config = SubstrateGeneratorConfig { nodes: 10, family: TopologyFamily::Grid, ..Default::default() };
        let substrate = generate_substrate(&config).unwrap();
        // floor(sqrt(10)) = 3 -> 3x3 grid, 12 links
        assert_eq!(substrate.node_count(), 9);
        assert_eq!(substrate.link_count(), 12);
    }

    #[test]
    fn test_generation_is_reproducible() {
        let config = SubstrateGeneratorConfig { nodes: 30, family: TopologyFamily::ScaleFree, density: 0.2, ..Default::default() };
        assert_eq!(generate_substrate(&config).unwrap(), generate_substrate(&config).unwrap());
    }

    #[test]
    fn test_generator_rejects_empty_request() {
        let config = SubstrateGeneratorConfig { nodes: 0, ..Default::default() };
        assert!(generate_substrate(&config).is_err());
    }
}
