use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::embedding::Embedding;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;

pub type EmbedResult = Result<Embedding, RejectionReason>;

/// A strategy that proposes a mapping of one VNR onto the substrate.
///
/// Implementations only read the substrate. Every tentative reservation lives in a
/// `ResidualView` that is discarded on failure, so a rejected call leaves no trace.
/// The returned embedding becomes authoritative only once the engine commits it.
pub trait EmbeddingAlgorithm: std::fmt::Debug + Send {
    fn kind(&self) -> AlgorithmKind;

    fn embed(&mut self, substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult;

    /// Number of upcoming arrivals the engine groups into one window; `None` disables chunking.
    fn chunk_size(&self) -> Option<usize> {
        None
    }

    /// Reorders a window of arrivals before dispatch. Only called when `chunk_size` is set.
    fn order_window(&self, _window: &mut [&VirtualNetworkRequest]) {}
}
