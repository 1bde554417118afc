use crate::domain::algorithm::algorithm_trait::{EmbedResult, EmbeddingAlgorithm};
use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::placement::embed_greedy;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

/// Largest demand onto largest residual cpu, then one shortest path per virtual link.
#[derive(Debug, Default, Clone)]
pub struct SimpleGreedy;

impl SimpleGreedy {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingAlgorithm for SimpleGreedy {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::SimpleGreedy
    }

    fn embed(&mut self, substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult {
        embed_greedy(substrate, vnr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::algorithm::rejection::RejectionReason;
    use crate::domain::substrate::topology::german_network;
    use crate::domain::utils::id::{SubstrateNodeId, VirtualNodeId, VnrId};

    #[test]
    fn test_embeds_on_largest_nodes() {
        let substrate = german_network().unwrap();
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 20).with_node(2, 30).with_link(1, 2, 10);

        let embedding = SimpleGreedy::new().embed(&substrate, &vnr).unwrap();
        // node 2 (150 cpu) takes the larger demand, node 7 (140 cpu) the other
        assert_eq!(embedding.substrate_node_of(VirtualNodeId::new(2)), Some(SubstrateNodeId::new(2)));
        assert_eq!(embedding.substrate_node_of(VirtualNodeId::new(1)), Some(SubstrateNodeId::new(7)));
        assert!(embedding.validate_against(&vnr).is_ok());
    }

    #[test]
    fn test_rejects_oversized_node_without_touching_substrate() {
        let substrate = german_network().unwrap();
        let before = substrate.clone();
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 500);

        assert_eq!(SimpleGreedy::new().embed(&substrate, &vnr), Err(RejectionReason::InsufficientNodeCapacity));
        assert_eq!(substrate, before);
    }
}
