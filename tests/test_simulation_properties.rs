use vne_sim::domain::algorithm::algorithm_type::{AlgorithmKind, build_algorithm};
use vne_sim::domain::algorithm::rejection::RejectionReason;
use vne_sim::domain::algorithm::simple_greedy::SimpleGreedy;
use vne_sim::domain::algorithm::yu2008::Yu2008;
use vne_sim::domain::simulator::run_result::RunResult;
use vne_sim::domain::simulator::simulation_config::SimulationConfig;
use vne_sim::domain::simulator::simulator::{compare_algorithms, run, run_with_config};
use vne_sim::domain::substrate::substrate_network::SubstrateNetwork;
use vne_sim::domain::substrate::topology::{SubstrateGeneratorConfig, TopologyFamily, generate_substrate, german_network};
use vne_sim::domain::utils::id::{SubstrateNodeId, VnrId};
use vne_sim::domain::vnr::virtual_network_request::{VirtualNetworkRequest, VnrShape, VnrState};
use vne_sim::domain::vnr::vnr_generator::{VnrGeneratorConfig, generate_vnrs, reference_queue};

fn all_configs() -> Vec<SimulationConfig> {
    AlgorithmKind::ALL.into_iter().map(SimulationConfig::new).collect()
}

fn assert_conserved(result: &RunResult, total: usize) {
    assert_eq!(result.outcomes.len(), total);
    assert_eq!(result.embedded_count() + result.rejected_count(), total, "{} lost a request", result.algorithm);
    assert_eq!(result.metrics.embedded + result.metrics.rejected, total);
    assert!(result.outcomes.iter().all(|outcome| outcome.state != VnrState::Pending));
    assert!(result.outcomes.iter().all(|outcome| outcome.rejection.is_some() == (outcome.state == VnrState::Rejected)));
}

/// Fifteen small requests, each gone before the next arrives.
fn light_queue() -> Vec<VirtualNetworkRequest> {
    (1..=15)
        .map(|id| {
            let base = VirtualNetworkRequest::new(VnrId::new(id), id as i64 * 10, 5).with_node(1, 10).with_node(2, 8).with_link(1, 2, 5);
            match id % 3 {
                0 => base.with_shape(VnrShape::Path).with_node(3, 6).with_link(2, 3, 4),
                1 => base.with_shape(VnrShape::Cycle).with_node(3, 5).with_link(2, 3, 3).with_link(3, 1, 3),
                _ => base.with_shape(VnrShape::Path),
            }
        })
        .collect()
}

#[test]
fn test_light_load_is_fully_accepted_by_every_algorithm() {
    let substrate = german_network().unwrap();
    let vnrs = light_queue();

    for result in compare_algorithms(&substrate, &vnrs, &all_configs()).unwrap() {
        assert_conserved(&result, vnrs.len());
        assert_eq!(result.metrics.acceptance_ratio, 1.0, "{} rejected under light load: {:?}", result.algorithm, result.metrics.rejection_counts);
    }
}

#[test]
fn test_over_saturation_forces_rejections() {
    // only five German nodes have 100 cpu, and nobody leaves
    let vnrs: Vec<VirtualNetworkRequest> = (1..=10).map(|id| VirtualNetworkRequest::new(VnrId::new(id), 0, 1000).with_node(1, 100)).collect();

    for config in all_configs() {
        let mut substrate = german_network().unwrap();
        let result = run_with_config(&mut substrate, &vnrs, &config).unwrap();

        assert_conserved(&result, vnrs.len());
        assert!(result.rejected_count() >= 5, "{} accepted more than fits", result.algorithm);
        assert!(result.metrics.acceptance_ratio < 1.0);
        assert!(!result.metrics.rejection_counts.is_empty());
    }
}

#[test]
fn test_bandwidth_over_saturation_is_rejected_on_links() {
    // 20 long-lived pairs of 80 bandwidth: 1600 demanded against 1155 on the German links
    let vnrs: Vec<VirtualNetworkRequest> = (1..=20)
        .map(|id| VirtualNetworkRequest::new(VnrId::new(id), id as i64, 1000).with_shape(VnrShape::Path).with_node(1, 5).with_node(2, 5).with_link(1, 2, 80))
        .collect();
    let substrate = german_network().unwrap();
    let demanded: i64 = vnrs.iter().map(|vnr| vnr.total_bandwidth_demand()).sum();
    assert!(demanded > substrate.get_total_bandwidth_capacity());

    for result in compare_algorithms(&substrate, &vnrs, &all_configs()).unwrap() {
        assert_conserved(&result, vnrs.len());
        assert!(result.rejected_count() > 0, "{} embedded more bandwidth than exists", result.algorithm);
        assert!(
            result.metrics.rejection_counts.keys().all(|reason| matches!(reason, RejectionReason::InsufficientBandwidth | RejectionReason::NoPath)),
            "{} rejected for a non-link reason: {:?}",
            result.algorithm,
            result.metrics.rejection_counts
        );
        assert!(result.metrics.peak_link_utilization <= 1.0);
    }
}

#[test]
fn test_greedy_saturation_reports_node_capacity() {
    let vnrs: Vec<VirtualNetworkRequest> = (1..=10).map(|id| VirtualNetworkRequest::new(VnrId::new(id), 0, 1000).with_node(1, 100)).collect();
    let mut substrate = german_network().unwrap();
    let result = run(&mut substrate, &vnrs, &mut SimpleGreedy::new()).unwrap();

    assert_eq!(result.embedded_count(), 5);
    assert_eq!(result.metrics.rejection_counts.get(&RejectionReason::InsufficientNodeCapacity), Some(&5));
}

#[test]
fn test_utilization_stays_within_capacity() {
    let substrate = german_network().unwrap();
    let vnrs = reference_queue();

    for result in compare_algorithms(&substrate, &vnrs, &all_configs()).unwrap() {
        assert_conserved(&result, vnrs.len());
        assert!(!result.snapshots.is_empty());
        for snapshot in &result.snapshots {
            assert!(snapshot.node_utilization.values().all(|u| (0.0..=1.0).contains(u)));
            assert!(snapshot.link_utilization.values().all(|u| (0.0..=1.0).contains(u)));
        }
        assert!(result.metrics.peak_node_utilization <= 1.0);
        assert!(result.snapshots.windows(2).all(|pair| pair[0].time < pair[1].time));
    }
}

#[test]
fn test_every_departure_restores_the_substrate() {
    for config in all_configs() {
        let mut substrate = german_network().unwrap();
        let result = run_with_config(&mut substrate, &reference_queue(), &config).unwrap();

        assert_eq!(substrate, german_network().unwrap(), "{} leaked resources", result.algorithm);
        assert!(result.outcomes.iter().filter(|o| o.was_embedded()).all(|o| o.state == VnrState::Departed));
        assert_eq!(result.snapshots.last().map(|s| s.active_vnrs), Some(0));
    }
}

#[test]
fn test_runs_are_deterministic() {
    let substrate = generate_substrate(&SubstrateGeneratorConfig { nodes: 30, family: TopologyFamily::ScaleFree, density: 0.2, seed: 9, ..Default::default() }).unwrap();
    let vnrs = generate_vnrs(&VnrGeneratorConfig { count: 60, seed: 9, ..Default::default() }).unwrap();

    let first = compare_algorithms(&substrate, &vnrs, &all_configs()).unwrap();
    let second = compare_algorithms(&substrate, &vnrs, &all_configs()).unwrap();
    assert_eq!(first, second);
    for result in &first {
        assert_conserved(result, vnrs.len());
    }
}

#[test]
fn test_yu2008_favours_revenue_within_a_window() {
    let mut single = SubstrateNetwork::new("single");
    single.add_node(SubstrateNodeId::new(1), 100).unwrap();
    // three cheap requests followed by one expensive request, all in one window
    let vnrs = vec![
        VirtualNetworkRequest::new(VnrId::new(1), 0, 100).with_node(1, 20),
        VirtualNetworkRequest::new(VnrId::new(2), 1, 100).with_node(1, 20),
        VirtualNetworkRequest::new(VnrId::new(3), 2, 100).with_node(1, 20),
        VirtualNetworkRequest::new(VnrId::new(4), 3, 100).with_node(1, 70),
    ];

    let greedy = run(&mut single.clone(), &vnrs, &mut SimpleGreedy::new()).unwrap();
    let chunked = run(&mut single.clone(), &vnrs, &mut Yu2008::new(4)).unwrap();

    let state = |result: &RunResult, id: u32| result.outcome(VnrId::new(id)).unwrap().state;
    for id in 1..=3 {
        assert_eq!(state(&greedy, id), VnrState::Departed);
    }
    assert_eq!(state(&greedy, 4), VnrState::Rejected);

    // 4 goes first, 1 still fits beside it, 2 and 3 are starved
    assert_eq!(state(&chunked, 4), VnrState::Departed);
    assert_eq!(state(&chunked, 1), VnrState::Departed);
    assert_eq!(state(&chunked, 2), VnrState::Rejected);
    assert_eq!(state(&chunked, 3), VnrState::Rejected);
    assert_eq!(chunked.metrics.total_revenue, 90);
    assert!(chunked.metrics.total_revenue > greedy.metrics.total_revenue);
}

#[test]
fn test_disconnected_substrate_is_refused() {
    let mut substrate = SubstrateNetwork::new("split");
    substrate.add_node(SubstrateNodeId::new(1), 10).unwrap();
    substrate.add_node(SubstrateNodeId::new(2), 10).unwrap();

    let mut algorithm = build_algorithm(&SimulationConfig::default()).unwrap();
    assert!(run(&mut substrate, &reference_queue(), algorithm.as_mut()).is_err());
}

#[test]
fn test_empty_queue_yields_zero_acceptance() {
    let mut substrate = german_network().unwrap();
    let result = run(&mut substrate, &[], &mut SimpleGreedy::new()).unwrap();
    assert_eq!(result.metrics.total_vnrs, 0);
    assert_eq!(result.metrics.acceptance_ratio, 0.0);
    assert!(result.snapshots.is_empty());
}
