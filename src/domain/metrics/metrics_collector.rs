use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::metrics::utilization::UtilizationSnapshot;

/// Revenue over cost of one embedded VNR; `None` when nothing was consumed.
pub fn efficiency(revenue: i64, cost: i64) -> Option<f64> {
    if cost == 0 { None } else { Some(revenue as f64 / cost as f64) }
}

/// Aggregate figures of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub total_vnrs: usize,
    pub embedded: usize,
    pub rejected: usize,
    pub acceptance_ratio: f64,
    pub blocking_probability: f64,
    pub total_revenue: i64,
    pub total_cost: i64,

    /// Σ revenue / Σ cost over embedded VNRs, 0 when no cost was incurred.
    pub revenue_cost_ratio: f64,

    /// Mean per-VNR efficiency, VNRs with zero cost excluded.
    pub mean_efficiency: f64,
    pub rejection_counts: BTreeMap<RejectionReason, usize>,
    pub peak_node_utilization: f64,
    pub peak_link_utilization: f64,
    pub average_node_utilization: f64,
    pub average_link_utilization: f64,
}

/// Accumulates outcomes and snapshots while the engine runs.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    embedded: usize,
    rejected: usize,
    total_revenue: i64,
    total_cost: i64,
    efficiencies: Vec<f64>,
    rejection_counts: BTreeMap<RejectionReason, usize>,
    snapshots: Vec<UtilizationSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_embedded(&mut self, revenue: i64, cost: i64) {
        self.embedded += 1;
        self.total_revenue += revenue;
        self.total_cost += cost;
        if let Some(value) = efficiency(revenue, cost) {
            self.efficiencies.push(value);
        }
    }

    pub fn record_rejected(&mut self, reason: RejectionReason) {
        self.rejected += 1;
        *self.rejection_counts.entry(reason).or_insert(0) += 1;
    }

    /// Stores the snapshot of a processed timestamp, replacing an earlier one for the same time.
    pub fn record_snapshot(&mut self, snapshot: UtilizationSnapshot) {
        match self.snapshots.last_mut() {
            Some(last) if last.time == snapshot.time => *last = snapshot,
            _ => self.snapshots.push(snapshot),
        }
    }

    pub fn snapshots(&self) -> &[UtilizationSnapshot] {
        &self.snapshots
    }

    pub fn summarize(&self) -> RunMetrics {
        let total_vnrs = self.embedded + self.rejected;
        let acceptance_ratio = if total_vnrs == 0 { 0.0 } else { self.embedded as f64 / total_vnrs as f64 };
        let snapshot_count = self.snapshots.len().max(1) as f64;

        RunMetrics {
            total_vnrs,
            embedded: self.embedded,
            rejected: self.rejected,
            acceptance_ratio,
            blocking_probability: 1.0 - acceptance_ratio,
            total_revenue: self.total_revenue,
            total_cost: self.total_cost,
            revenue_cost_ratio: efficiency(self.total_revenue, self.total_cost).unwrap_or(0.0),
            mean_efficiency: if self.efficiencies.is_empty() { 0.0 } else { self.efficiencies.iter().sum::<f64>() / self.efficiencies.len() as f64 },
            rejection_counts: self.rejection_counts.clone(),
            peak_node_utilization: self.snapshots.iter().map(|s| s.peak_node()).fold(0.0, f64::max),
            peak_link_utilization: self.snapshots.iter().map(|s| s.peak_link()).fold(0.0, f64::max),
            average_node_utilization: self.snapshots.iter().map(|s| s.mean_node()).sum::<f64>() / snapshot_count,
            average_link_utilization: self.snapshots.iter().map(|s| s.mean_link()).sum::<f64>() / snapshot_count,
        }
    }

    pub fn into_snapshots(self) -> Vec<UtilizationSnapshot> {
        self.snapshots
    }
}
