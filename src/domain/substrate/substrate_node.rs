use crate::domain::substrate::resource_error::ResourceError;
use crate::domain::substrate::resource_trait::Resource;
use crate::domain::utils::id::SubstrateNodeId;

/// A physical node offering cpu.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateNode {
    pub id: SubstrateNodeId,
    cpu_capacity: i64,
    cpu_available: i64,
}

impl SubstrateNode {
    pub fn new(id: SubstrateNodeId, cpu_capacity: i64) -> Self {
        Self { id, cpu_capacity, cpu_available: cpu_capacity }
    }

    pub fn reserve(&mut self, amount: i64) -> Result<(), ResourceError> {
        if amount < 0 {
            return Err(ResourceError::NegativeAmount(amount));
        }
        if !self.can_handle(amount) {
            return Err(ResourceError::InsufficientCpu { node: self.id, requested: amount, available: self.cpu_available });
        }
        self.cpu_available -= amount;
        Ok(())
    }
}

impl Resource for SubstrateNode {
    fn get_capacity(&self) -> i64 {
        self.cpu_capacity
    }

    fn get_available(&self) -> i64 {
        self.cpu_available
    }

    fn set_available(&mut self, available: i64) {
        self.cpu_available = available;
    }

    fn get_label(&self) -> String {
        format!("node {}", self.id)
    }
}
