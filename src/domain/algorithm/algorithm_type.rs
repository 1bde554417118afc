use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::algorithm::algorithm_trait::EmbeddingAlgorithm;
use crate::domain::algorithm::rw_bfs::RwBfs;
use crate::domain::algorithm::rw_max_match::RwMaxMatch;
use crate::domain::algorithm::simple_greedy::SimpleGreedy;
use crate::domain::algorithm::yu2008::Yu2008;
use crate::domain::simulator::simulation_config::SimulationConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    SimpleGreedy,
    RwBfs,
    RwMaxMatch,
    Yu2008,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [AlgorithmKind::SimpleGreedy, AlgorithmKind::RwBfs, AlgorithmKind::RwMaxMatch, AlgorithmKind::Yu2008];

    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::SimpleGreedy => "SimpleGreedy",
            AlgorithmKind::RwBfs => "RwBfs",
            AlgorithmKind::RwMaxMatch => "RwMaxMatch",
            AlgorithmKind::Yu2008 => "Yu2008",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    /// Case-insensitive; `-` and `_` are ignored, so `rw-bfs` and `RW_BFS` both work.
    fn from_str(value: &str) -> Result<Self> {
        let normalized: String = value.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_lowercase();
        AlgorithmKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownAlgorithm(value.to_string()))
    }
}

/// Instantiates the algorithm named in `config` with its parameters.
pub fn build_algorithm(config: &SimulationConfig) -> Result<Box<dyn EmbeddingAlgorithm>> {
    config.validate()?;
    let algorithm: Box<dyn EmbeddingAlgorithm> = match config.algorithm {
        AlgorithmKind::SimpleGreedy => Box::new(SimpleGreedy::new()),
        AlgorithmKind::RwBfs => Box::new(RwBfs::new(config.seed, config.max_hops, config.walk_attempts)),
        AlgorithmKind::RwMaxMatch => Box::new(RwMaxMatch::new(config.seed, config.k_paths)?),
        AlgorithmKind::Yu2008 => Box::new(Yu2008::new(config.chunk_size)),
    };
    Ok(algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("rw-bfs".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::RwBfs);
        assert_eq!("YU2008".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Yu2008);
        assert_eq!("simple_greedy".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::SimpleGreedy);
        assert!(matches!("dijkstra".parse::<AlgorithmKind>(), Err(Error::UnknownAlgorithm(_))));
    }

    #[test]
    fn test_build_every_kind() {
        for kind in AlgorithmKind::ALL {
            let config = SimulationConfig { algorithm: kind, ..Default::default() };
            assert_eq!(build_algorithm(&config).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_build_rejects_unbounded_k() {
        let config = SimulationConfig { algorithm: AlgorithmKind::RwMaxMatch, k_paths: 99, ..Default::default() };
        assert!(matches!(build_algorithm(&config), Err(Error::UnboundedPathSearch { .. })));
    }
}
