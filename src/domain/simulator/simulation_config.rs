use crate::api::simulation_dto::SimulationConfigDto;
use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::substrate::path_search::MAX_K_PATHS;
use crate::error::{Error, Result};

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub algorithm: AlgorithmKind,
    pub seed: u64,

    /// Window size of chunked algorithms (Yu2008).
    pub chunk_size: usize,

    /// Candidate paths per virtual link (RwMaxMatch), within `1..=MAX_K_PATHS`.
    pub k_paths: usize,

    /// Depth of the random BFS walk (RwBfs).
    pub max_hops: usize,

    /// Seeds tried before RwBfs gives up on a request.
    pub walk_attempts: usize,

    /// CSV target for per-VNR and per-snapshot statistics; none disables the export.
    pub statistics_file: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { algorithm: AlgorithmKind::SimpleGreedy, seed: 42, chunk_size: 5, k_paths: 3, max_hops: 3, walk_attempts: 3, statistics_file: None }
    }
}

impl SimulationConfig {
    pub fn new(algorithm: AlgorithmKind) -> Self {
        Self { algorithm, ..Default::default() }
    }

    pub fn from_dto(dto: SimulationConfigDto) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            algorithm: dto.algorithm.parse()?,
            seed: dto.seed.unwrap_or(defaults.seed),
            chunk_size: dto.chunk_size.unwrap_or(defaults.chunk_size),
            k_paths: dto.k_paths.unwrap_or(defaults.k_paths),
            max_hops: dto.max_hops.unwrap_or(defaults.max_hops),
            walk_attempts: dto.walk_attempts.unwrap_or(defaults.walk_attempts),
            statistics_file: dto.statistics_file,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration("chunkSize must be at least 1".to_string()));
        }
        if self.walk_attempts == 0 {
            return Err(Error::InvalidConfiguration("walkAttempts must be at least 1".to_string()));
        }
        if self.k_paths == 0 || self.k_paths > MAX_K_PATHS {
            return Err(Error::UnboundedPathSearch { requested: self.k_paths, max: MAX_K_PATHS });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parser::parse_json_str;

    #[test]
    fn test_from_dto_fills_defaults() {
        let dto: SimulationConfigDto = parse_json_str(r#"{ "algorithm": "rw-max-match", "kPaths": 5 }"#).unwrap();
        let config = SimulationConfig::from_dto(dto).unwrap();
        assert_eq!(config.algorithm, AlgorithmKind::RwMaxMatch);
        assert_eq!(config.k_paths, 5);
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.statistics_file, None);
    }

    #[test]
    fn test_zero_chunk_is_rejected() {
        let config = SimulationConfig { chunk_size: 0, ..SimulationConfig::new(AlgorithmKind::Yu2008) };
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }
}
