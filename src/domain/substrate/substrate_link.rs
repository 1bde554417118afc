use crate::domain::substrate::resource_error::ResourceError;
use crate::domain::substrate::resource_trait::Resource;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};

/// An undirected physical link offering bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateLink {
    pub id: SubstrateLinkId,
    pub source: SubstrateNodeId,
    pub target: SubstrateNodeId,
    bandwidth_capacity: i64,
    bandwidth_available: i64,
}

impl SubstrateLink {
    pub fn new(id: SubstrateLinkId, source: SubstrateNodeId, target: SubstrateNodeId, bandwidth_capacity: i64) -> Self {
        Self { id, source, target, bandwidth_capacity, bandwidth_available: bandwidth_capacity }
    }

    /// Returns the endpoint opposite to `node`, or `None` if `node` is not an endpoint.
    pub fn other_end(&self, node: SubstrateNodeId) -> Option<SubstrateNodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn connects(&self, a: SubstrateNodeId, b: SubstrateNodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    pub fn reserve(&mut self, amount: i64) -> Result<(), ResourceError> {
        if amount < 0 {
            return Err(ResourceError::NegativeAmount(amount));
        }
        if !self.can_handle(amount) {
            return Err(ResourceError::InsufficientBandwidth { link: self.id, requested: amount, available: self.bandwidth_available });
        }
        self.bandwidth_available -= amount;
        Ok(())
    }
}

impl Resource for SubstrateLink {
    fn get_capacity(&self) -> i64 {
        self.bandwidth_capacity
    }

    fn get_available(&self) -> i64 {
        self.bandwidth_available
    }

    fn set_available(&mut self, available: i64) {
        self.bandwidth_available = available;
    }

    fn get_label(&self) -> String {
        format!("link {} ({} <-> {})", self.id, self.source, self.target)
    }
}
