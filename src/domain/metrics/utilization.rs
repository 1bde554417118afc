use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};

/// Per-resource utilization (`1 - available / capacity`) after one processed timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSnapshot {
    pub time: i64,
    pub active_vnrs: usize,
    pub node_utilization: BTreeMap<SubstrateNodeId, f64>,
    pub link_utilization: BTreeMap<SubstrateLinkId, f64>,
}

impl UtilizationSnapshot {
    pub fn peak_node(&self) -> f64 {
        self.node_utilization.values().copied().fold(0.0, f64::max)
    }

    pub fn peak_link(&self) -> f64 {
        self.link_utilization.values().copied().fold(0.0, f64::max)
    }

    pub fn mean_node(&self) -> f64 {
        mean(self.node_utilization.values().copied())
    }

    pub fn mean_link(&self) -> f64 {
        mean(self.link_utilization.values().copied())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_and_means() {
        let snapshot = UtilizationSnapshot {
            time: 10,
            active_vnrs: 2,
            node_utilization: BTreeMap::from([(SubstrateNodeId::new(1), 0.5), (SubstrateNodeId::new(2), 0.25)]),
            link_utilization: BTreeMap::new(),
        };
        assert_eq!(snapshot.peak_node(), 0.5);
        assert_eq!(snapshot.mean_node(), 0.375);
        assert_eq!(snapshot.peak_link(), 0.0);
        assert_eq!(snapshot.mean_link(), 0.0);
    }
}
