use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfigDto {
    /// Algorithm name, e.g. "SimpleGreedy", "rw-bfs", "RwMaxMatch", "yu2008".
    pub algorithm: String,

    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub k_paths: Option<usize>,
    #[serde(default)]
    pub max_hops: Option<usize>,
    #[serde(default)]
    pub walk_attempts: Option<usize>,
    #[serde(default)]
    pub statistics_file: Option<String>,
}
