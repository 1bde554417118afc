use crate::domain::algorithm::algorithm_trait::{EmbedResult, EmbeddingAlgorithm};
use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::placement::embed_greedy;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

/// Window-based admission after Yu et al. (2008).
///
/// Arrivals are grouped into windows of `chunk_size`; inside a window the most
/// profitable requests are placed first. Low-revenue requests at the end of a busy
/// window see an already loaded substrate and are rejected more often.
#[derive(Debug, Clone)]
pub struct Yu2008 {
    chunk_size: usize,
}

impl Yu2008 {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }
}

impl EmbeddingAlgorithm for Yu2008 {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Yu2008
    }

    fn embed(&mut self, substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult {
        embed_greedy(substrate, vnr)
    }

    fn chunk_size(&self) -> Option<usize> {
        Some(self.chunk_size)
    }

    /// Descending revenue, ties by ascending VNR id.
    fn order_window(&self, window: &mut [&VirtualNetworkRequest]) {
        window.sort_by(|a, b| b.revenue().cmp(&a.revenue()).then(a.id.cmp(&b.id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utils::id::VnrId;

    #[test]
    fn test_window_is_ordered_by_revenue() {
        let low = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 5);
        let high = VirtualNetworkRequest::new(VnrId::new(2), 1, 10).with_node(1, 50);
        let tied = VirtualNetworkRequest::new(VnrId::new(3), 2, 10).with_node(1, 5);

        let mut window = vec![&low, &high, &tied];
        Yu2008::new(3).order_window(&mut window);
        let ids: Vec<u32> = window.iter().map(|vnr| vnr.id.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_places_like_simple_greedy() {
        let substrate = crate::domain::substrate::topology::german_network().unwrap();
        let vnr = VirtualNetworkRequest::new(VnrId::new(1), 0, 10).with_node(1, 20).with_node(2, 30).with_link(1, 2, 10);

        let greedy = crate::domain::algorithm::simple_greedy::SimpleGreedy::new().embed(&substrate, &vnr);
        assert_eq!(Yu2008::new(3).embed(&substrate, &vnr), greedy);
        assert!(greedy.is_ok());
    }

    #[test]
    fn test_zero_chunk_is_clamped() {
        assert_eq!(Yu2008::new(0).chunk_size(), Some(1));
    }
}
