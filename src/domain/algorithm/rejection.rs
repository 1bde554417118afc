use std::fmt;

use serde::Serialize;

use crate::domain::substrate::resource_error::ResourceError;

/// Why an embedding attempt failed. Rejections are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Some virtual node found no unused substrate node with enough cpu.
    InsufficientNodeCapacity,

    /// The chosen path for a virtual link lacks bandwidth.
    InsufficientBandwidth,

    /// No substrate path (within the search bound) can carry a virtual link.
    NoPath,

    /// Virtual nodes cannot all be placed at the same time.
    NoFeasibleNodeMapping,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InsufficientNodeCapacity => "INSUFFICIENT_NODE_CAPACITY",
            RejectionReason::InsufficientBandwidth => "INSUFFICIENT_BANDWIDTH",
            RejectionReason::NoPath => "NO_PATH",
            RejectionReason::NoFeasibleNodeMapping => "NO_FEASIBLE_NODE_MAPPING",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A proposal the substrate refused to commit is reported as the matching rejection.
impl From<&ResourceError> for RejectionReason {
    fn from(error: &ResourceError) -> Self {
        match error {
            ResourceError::InsufficientCpu { .. } => RejectionReason::InsufficientNodeCapacity,
            ResourceError::InsufficientBandwidth { .. } => RejectionReason::InsufficientBandwidth,
            ResourceError::NotAdjacent(..) | ResourceError::MalformedPath { .. } | ResourceError::UnknownLink(_) => RejectionReason::NoPath,
            _ => RejectionReason::NoFeasibleNodeMapping,
        }
    }
}
