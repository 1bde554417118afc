use thiserror::Error;

use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId, VnrId};

/// Violations of the substrate resource contract.
///
/// Every operation returning one of these leaves the substrate untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Substrate node {0} does not exist")]
    UnknownNode(SubstrateNodeId),

    #[error("Substrate link {0} does not exist")]
    UnknownLink(SubstrateLinkId),

    #[error("Path with {nodes} nodes cannot have {links} links")]
    MalformedPath { nodes: usize, links: usize },

    #[error("Substrate nodes {0} and {1} are not adjacent")]
    NotAdjacent(SubstrateNodeId, SubstrateNodeId),

    #[error("Node {node} has {available} cpu available, {requested} requested")]
    InsufficientCpu { node: SubstrateNodeId, requested: i64, available: i64 },

    #[error("Link {link} has {available} bandwidth available, {requested} requested")]
    InsufficientBandwidth { link: SubstrateLinkId, requested: i64, available: i64 },

    #[error("Releasing {amount} on {resource} would exceed its capacity {capacity}")]
    OverRelease { resource: String, amount: i64, capacity: i64 },

    #[error("Negative amount {0} is not a valid demand")]
    NegativeAmount(i64),

    #[error("Embedding of VNR {0} was already released")]
    AlreadyReleased(VnrId),

    #[error("Embedding of VNR {0} is invalid: {1}")]
    InvalidEmbedding(VnrId, String),
}
