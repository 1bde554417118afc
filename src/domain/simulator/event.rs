use crate::domain::utils::id::VnrId;

/// Departures sort before arrivals, so resources freed at `t` are available to requests arriving at `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Departure,
    Arrival,
}

/// One point on the simulation timeline, ordered by time, then kind, then VNR id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimulationEvent {
    pub time: i64,
    pub kind: EventKind,
    pub vnr_id: VnrId,
}

impl SimulationEvent {
    pub fn arrival(time: i64, vnr_id: VnrId) -> Self {
        Self { time, kind: EventKind::Arrival, vnr_id }
    }

    pub fn departure(time: i64, vnr_id: VnrId) -> Self {
        Self { time, kind: EventKind::Departure, vnr_id }
    }
}
