pub mod metrics_collector;
pub mod utilization;
