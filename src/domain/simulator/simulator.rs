use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use std::thread;

use crate::domain::algorithm::algorithm_trait::EmbeddingAlgorithm;
use crate::domain::algorithm::algorithm_type::build_algorithm;
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::embedding::CommittedEmbedding;
use crate::domain::metrics::metrics_collector::MetricsCollector;
use crate::domain::simulator::event::SimulationEvent;
use crate::domain::simulator::run_result::{RunResult, VnrOutcome};
use crate::domain::simulator::simulation_config::SimulationConfig;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::VnrId;
use crate::domain::utils::statistics::ANALYTICS_TARGET;
use crate::domain::vnr::virtual_network_request::{VirtualNetworkRequest, VnrState};
use crate::error::{Error, Result};

/// Mutable state of one run.
struct Engine<'a, 'b> {
    substrate: &'a mut SubstrateNetwork,
    algorithm: &'a mut (dyn EmbeddingAlgorithm + 'b),
    departures: BinaryHeap<Reverse<SimulationEvent>>,
    committed: BTreeMap<VnrId, CommittedEmbedding>,
    outcomes: BTreeMap<VnrId, VnrOutcome>,
    collector: MetricsCollector,
}

impl Engine<'_, '_> {
    fn set_state(&mut self, vnr_id: VnrId, next: VnrState) -> Option<&mut VnrOutcome> {
        let outcome = self.outcomes.get_mut(&vnr_id)?;
        if !outcome.state.can_transition_to(next) {
            log::error!("VNR {} cannot move from {:?} to {:?}.", vnr_id, outcome.state, next);
            return None;
        }
        outcome.state = next;
        Some(outcome)
    }

    fn arrive(&mut self, vnr: &VirtualNetworkRequest, time: i64) {
        let proposal = self.algorithm.embed(&*self.substrate, vnr);

        let committed = match proposal {
            Ok(embedding) => embedding.validate_against(vnr).and_then(|_| self.substrate.commit(embedding)).map_err(|error| {
                log::warn!("Proposal for VNR {} refused at commit: {}", vnr.id, error);
                RejectionReason::from(&error)
            }),
            Err(reason) => Err(reason),
        };

        match committed {
            Ok(committed) => {
                let cost = committed.embedding().cost();
                let embedding = committed.embedding().clone();
                self.committed.insert(vnr.id, committed);
                let departure_time = vnr.departure_time(time);
                self.departures.push(Reverse(SimulationEvent::departure(departure_time, vnr.id)));
                self.collector.record_embedded(vnr.revenue(), cost);

                let active = self.committed.len();
                if let Some(outcome) = self.set_state(vnr.id, VnrState::Embedded) {
                    outcome.embedding_time = Some(time);
                    outcome.departure_time = Some(departure_time);
                    outcome.cost = cost;
                    outcome.embedding = Some(embedding);
                    outcome.currently_active = active;
                }
                log::debug!("t={}: VNR {} embedded (revenue {}, cost {}).", time, vnr.id, vnr.revenue(), cost);
            }
            Err(reason) => {
                self.collector.record_rejected(reason);

                let active = self.committed.len();
                if let Some(outcome) = self.set_state(vnr.id, VnrState::Rejected) {
                    outcome.embedding_time = Some(time);
                    outcome.rejection = Some(reason);
                    outcome.currently_active = active;
                }
                log::debug!("t={}: VNR {} rejected with {}.", time, vnr.id, reason);
            }
        }
    }

    fn depart(&mut self, event: SimulationEvent) -> Result<()> {
        let Some(mut committed) = self.committed.remove(&event.vnr_id) else {
            return Err(Error::SimulationAborted(format!("departure of VNR {} at t={} without a committed embedding", event.vnr_id, event.time)));
        };
        self.substrate.release(&mut committed)?;
        self.set_state(event.vnr_id, VnrState::Departed);
        log::debug!("t={}: VNR {} departed.", event.time, event.vnr_id);
        Ok(())
    }

    /// Processes every departure due at or before `time`.
    fn depart_until(&mut self, time: i64) -> Result<()> {
        while let Some(Reverse(event)) = self.departures.peek().copied() {
            if event.time > time {
                break;
            }
            self.departures.pop();
            self.depart(event)?;
            self.snapshot(event.time);
        }
        Ok(())
    }

    fn snapshot(&mut self, time: i64) {
        let snapshot = self.substrate.utilization_snapshot(time, self.committed.len());
        self.collector.record_snapshot(snapshot);
    }
}

/// Rejects queues the engine cannot process: malformed requests or repeated ids.
fn validate_queue(vnrs: &[VirtualNetworkRequest]) -> Result<()> {
    let mut seen: BTreeSet<VnrId> = BTreeSet::new();
    for vnr in vnrs {
        vnr.validate()?;
        if !seen.insert(vnr.id) {
            return Err(Error::DuplicateVnrId(vnr.id));
        }
    }
    Ok(())
}

/// Runs the discrete-event simulation of `vnrs` on `substrate` with `algorithm`.
///
/// Events are processed in time order, departures before arrivals at equal times and
/// arrivals by VNR id. Algorithms that declare a chunk size receive windows of that many
/// arrivals, dispatched together in the algorithm's preferred order once the last member
/// has arrived, after every departure due by then. Departures are scheduled from the
/// dispatch time. Every departure is processed before returning, so the substrate ends
/// with the availability it started with.
///
/// Invalid input (disconnected or malformed substrate, malformed or duplicate VNRs)
/// fails before any event is processed.
pub fn run(substrate: &mut SubstrateNetwork, vnrs: &[VirtualNetworkRequest], algorithm: &mut dyn EmbeddingAlgorithm) -> Result<RunResult> {
    substrate.validate()?;
    validate_queue(vnrs)?;

    let kind = algorithm.kind();
    let chunk_size = algorithm.chunk_size();
    log::info!("Starting {} run on '{}' with {} VNRs.", kind, substrate.get_name(), vnrs.len());

    let mut arrivals: Vec<&VirtualNetworkRequest> = vnrs.iter().collect();
    arrivals.sort_by_key(|vnr| SimulationEvent::arrival(vnr.arrival_time, vnr.id));
    let mut arrivals: VecDeque<&VirtualNetworkRequest> = arrivals.into();

    let mut engine = Engine {
        substrate,
        algorithm,
        departures: BinaryHeap::new(),
        committed: BTreeMap::new(),
        outcomes: vnrs.iter().map(|vnr| (vnr.id, VnrOutcome::pending(vnr))).collect(),
        collector: MetricsCollector::new(),
    };

    while !arrivals.is_empty() {
        let take = chunk_size.unwrap_or(1).min(arrivals.len());
        let mut window: Vec<&VirtualNetworkRequest> = arrivals.drain(..take).collect();
        let Some(dispatch_time) = window.iter().map(|vnr| vnr.arrival_time).max() else { break };

        engine.depart_until(dispatch_time)?;
        if chunk_size.is_some() {
            engine.algorithm.order_window(&mut window);
        }
        for vnr in window {
            engine.arrive(vnr, dispatch_time);
        }
        engine.snapshot(dispatch_time);
    }
    engine.depart_until(i64::MAX)?;

    let metrics = engine.collector.summarize();
    tracing::info!(
        target: ANALYTICS_TARGET,
        Algorithm = %kind,
        Substrate = engine.substrate.get_name(),
        TotalVnrs = metrics.total_vnrs,
        Embedded = metrics.embedded,
        Rejected = metrics.rejected,
        AcceptanceRatio = metrics.acceptance_ratio,
        RevenueCostRatio = metrics.revenue_cost_ratio,
        "Simulation finished"
    );

    Ok(RunResult {
        algorithm: kind,
        substrate_name: engine.substrate.get_name().to_string(),
        outcomes: engine.outcomes.into_values().collect(),
        metrics,
        snapshots: engine.collector.into_snapshots(),
    })
}

/// Builds the algorithm described by `config` and runs it.
pub fn run_with_config(substrate: &mut SubstrateNetwork, vnrs: &[VirtualNetworkRequest], config: &SimulationConfig) -> Result<RunResult> {
    let mut algorithm = build_algorithm(config)?;
    run(substrate, vnrs, algorithm.as_mut())
}

/// Runs every configuration on its own copy of `substrate`, one scoped thread per run.
///
/// Results come back in the order of `configs`; `substrate` itself is not touched.
pub fn compare_algorithms(substrate: &SubstrateNetwork, vnrs: &[VirtualNetworkRequest], configs: &[SimulationConfig]) -> Result<Vec<RunResult>> {
    thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|config| {
                let mut copy = substrate.clone();
                scope.spawn(move || run_with_config(&mut copy, vnrs, config))
            })
            .collect();

        handles
            .into_iter()
            .zip(configs)
            .map(|(handle, config)| handle.join().map_err(|_| Error::SimulationAborted(format!("{} run panicked", config.algorithm))).and_then(|result| result))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::algorithm::simple_greedy::SimpleGreedy;
    use crate::domain::algorithm::yu2008::Yu2008;
    use crate::domain::utils::id::SubstrateNodeId;
    use tracing_test::traced_test;

    fn pair(cpu: i64, bandwidth: i64) -> SubstrateNetwork {
        let mut substrate = SubstrateNetwork::new("pair");
        substrate.add_node(SubstrateNodeId::new(1), cpu).unwrap();
        substrate.add_node(SubstrateNodeId::new(2), cpu).unwrap();
        substrate.connect(SubstrateNodeId::new(1), SubstrateNodeId::new(2), bandwidth).unwrap();
        substrate
    }

    fn single(id: u32, arrival: i64, holding: i64, cpu: i64) -> VirtualNetworkRequest {
        VirtualNetworkRequest::new(VnrId::new(id), arrival, holding).with_node(1, cpu)
    }

    #[test]
    #[traced_test]
    fn test_run_logs_summary() {
        let mut substrate = pair(100, 100);
        let vnrs = vec![single(1, 0, 10, 20)];
        let result = run(&mut substrate, &vnrs, &mut SimpleGreedy::new()).unwrap();

        assert_eq!(result.embedded_count(), 1);
        assert!(logs_contain("Simulation finished"));
    }

    #[test]
    fn test_departure_frees_resources_for_same_time_arrival() {
        // each VNR needs the whole of one node, so 3 only fits after 1 departs at t=10
        let mut substrate = pair(100, 100);
        let vnrs = vec![single(1, 0, 10, 100), single(2, 0, 50, 100), single(3, 10, 5, 100)];
        let result = run(&mut substrate, &vnrs, &mut SimpleGreedy::new()).unwrap();

        assert_eq!(result.outcome(VnrId::new(3)).unwrap().state, VnrState::Departed);
        assert_eq!(result.outcome(VnrId::new(3)).unwrap().currently_active, 2);
        assert_eq!(result.utilization_at(10).unwrap().active_vnrs, 2);
        assert_eq!(substrate.get_total_cpu_available(), 200);
    }

    #[test]
    fn test_duplicate_ids_are_rejected_before_running() {
        let mut substrate = pair(100, 100);
        let vnrs = vec![single(1, 0, 10, 10), single(1, 5, 10, 10)];
        assert!(matches!(run(&mut substrate, &vnrs, &mut SimpleGreedy::new()), Err(Error::DuplicateVnrId(_))));
    }

    #[test]
    fn test_chunk_dispatches_at_last_arrival_in_revenue_order() {
        let mut substrate = pair(100, 100);
        let vnrs = vec![single(1, 0, 100, 60), single(2, 3, 100, 90), single(3, 4, 100, 70)];
        let result = run(&mut substrate, &vnrs, &mut Yu2008::new(3)).unwrap();

        // 2 (90) and 3 (70) take both nodes before 1 (60) is tried
        assert_eq!(result.outcome(VnrId::new(1)).unwrap().state, VnrState::Rejected);
        assert_eq!(result.outcome(VnrId::new(1)).unwrap().embedding_time, Some(4));
        assert_eq!(result.outcome(VnrId::new(2)).unwrap().embedding_time, Some(4));
        assert_eq!(result.outcome(VnrId::new(2)).unwrap().departure_time, Some(104));
    }

    #[test]
    fn test_chunk_sees_departures_due_before_dispatch() {
        let mut substrate = SubstrateNetwork::new("single");
        substrate.add_node(SubstrateNodeId::new(1), 100).unwrap();
        // window [1, 2] runs at t=1 and 1 holds the node until t=6;
        // window [3, 4] runs at t=10 and must see the node free again
        let vnrs = vec![single(1, 0, 5, 100), single(2, 1, 5, 10), single(3, 4, 5, 100), single(4, 10, 5, 50)];
        let result = run(&mut substrate, &vnrs, &mut Yu2008::new(2)).unwrap();

        let third = result.outcome(VnrId::new(3)).unwrap();
        assert_eq!(third.state, VnrState::Departed);
        assert_eq!(third.embedding_time, Some(10));
        assert_eq!(third.departure_time, Some(15));
        assert_eq!(result.outcome(VnrId::new(2)).unwrap().state, VnrState::Rejected);
        assert!(result.outcomes.iter().all(|outcome| outcome.embedding_time.is_some_and(|t| t >= outcome.arrival_time)));
        assert_eq!(result.utilization_at(6).unwrap().active_vnrs, 0);
    }

    #[test]
    fn test_departure_without_embedding_aborts() {
        let mut substrate = pair(100, 100);
        let mut algorithm = SimpleGreedy::new();
        let mut engine = Engine {
            substrate: &mut substrate,
            algorithm: &mut algorithm,
            departures: BinaryHeap::new(),
            committed: BTreeMap::new(),
            outcomes: BTreeMap::new(),
            collector: MetricsCollector::new(),
        };

        let stray = SimulationEvent::departure(5, VnrId::new(9));
        assert!(matches!(engine.depart(stray), Err(Error::SimulationAborted(_))));
    }

    #[test]
    fn test_compare_leaves_input_untouched() {
        let substrate = pair(100, 100);
        let vnrs = vec![single(1, 0, 10, 20), single(2, 1, 10, 30)];
        let configs: Vec<SimulationConfig> = crate::domain::algorithm::algorithm_type::AlgorithmKind::ALL.into_iter().map(SimulationConfig::new).collect();

        let results = compare_algorithms(&substrate, &vnrs, &configs).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|result| result.metrics.acceptance_ratio == 1.0));
        assert_eq!(substrate, pair(100, 100));
    }
}
