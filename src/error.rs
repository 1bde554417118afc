use thiserror::Error;

use crate::domain::substrate::resource_error::ResourceError;
use crate::domain::utils::id::VnrId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write statistics: {0}")]
    StatisticsError(#[from] csv::Error),

    #[error("Invalid topology input: {0}")]
    InvalidTopologyInput(String),

    #[error("Duplicate VNR id {0} in the request queue")]
    DuplicateVnrId(VnrId),

    #[error("Path search for {requested} paths rejected, k must be within 1..={max}")]
    UnboundedPathSearch { requested: usize, max: usize },

    #[error("Unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("Invalid simulation configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Simulation run aborted: {0}")]
    SimulationAborted(String),

    #[error("Resource state violated: {0}")]
    ResourceError(#[from] ResourceError),
}

pub type Result<T> = std::result::Result<T, Error>;
