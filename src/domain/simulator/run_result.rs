use serde::Serialize;

use crate::domain::algorithm::algorithm_type::AlgorithmKind;
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::embedding::Embedding;
use crate::domain::metrics::metrics_collector::RunMetrics;
use crate::domain::metrics::utilization::UtilizationSnapshot;
use crate::domain::utils::id::VnrId;
use crate::domain::vnr::virtual_network_request::{VirtualNetworkRequest, VnrState};

/// What happened to one VNR during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VnrOutcome {
    pub vnr_id: VnrId,
    pub arrival_time: i64,

    /// Time the request was handed to the algorithm; differs from `arrival_time` in chunked runs.
    pub embedding_time: Option<i64>,
    pub departure_time: Option<i64>,
    pub state: VnrState,
    pub rejection: Option<RejectionReason>,
    pub revenue: i64,

    /// Zero unless the request was embedded.
    pub cost: i64,
    pub embedding: Option<Embedding>,

    /// Embedded requests holding resources right after this one was processed.
    pub currently_active: usize,
}

impl VnrOutcome {
    pub fn pending(vnr: &VirtualNetworkRequest) -> Self {
        Self {
            vnr_id: vnr.id,
            arrival_time: vnr.arrival_time,
            embedding_time: None,
            departure_time: None,
            state: VnrState::Pending,
            rejection: None,
            revenue: vnr.revenue(),
            cost: 0,
            embedding: None,
            currently_active: 0,
        }
    }

    /// True for requests that were embedded at some point, departed ones included.
    pub fn was_embedded(&self) -> bool {
        matches!(self.state, VnrState::Embedded | VnrState::Departed)
    }
}

/// Everything a run produced: per-VNR outcomes in id order, aggregate metrics and
/// one utilization snapshot per processed timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub algorithm: AlgorithmKind,
    pub substrate_name: String,
    pub outcomes: Vec<VnrOutcome>,
    pub metrics: RunMetrics,
    pub snapshots: Vec<UtilizationSnapshot>,
}

impl RunResult {
    pub fn outcome(&self, vnr_id: VnrId) -> Option<&VnrOutcome> {
        self.outcomes.iter().find(|outcome| outcome.vnr_id == vnr_id)
    }

    /// Latest snapshot taken at or before `time`.
    pub fn utilization_at(&self, time: i64) -> Option<&UtilizationSnapshot> {
        self.snapshots.iter().take_while(|snapshot| snapshot.time <= time).last()
    }

    pub fn embedded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.was_embedded()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.state == VnrState::Rejected).count()
    }
}
