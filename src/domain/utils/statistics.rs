use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};

use crate::domain::simulator::run_result::RunResult;
use crate::error::Result;

/// Target of the structured `tracing` events emitted per run.
pub const ANALYTICS_TARGET: &str = "vne_sim::analytics";

/// Each event consists of a set of key-value-pairs with the measured data or some meta data of the event.
/// This enum specifies all allowed key values and thus the column in the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatParameter {
    /// Simulation time of the entry.
    Time,

    /// Description why this entry was made
    LogDescription,

    /// Embedding algorithm of the run
    Algorithm,

    VnrId,

    /// Final VnrState of the request
    VnrState,

    /// Rejection code, empty for embedded requests
    RejectionReason,

    Revenue,

    /// Substrate resources consumed (cpu + bandwidth * hops)
    Cost,

    /// Embedded requests holding resources
    ActiveVnrs,

    PeakNodeUtilization,
    PeakLinkUtilization,
    MeanNodeUtilization,
    MeanLinkUtilization,
}

impl StatParameter {
    /// Column order of the CSV file.
    pub const ALL: [StatParameter; 13] = [
        StatParameter::Time,
        StatParameter::LogDescription,
        StatParameter::Algorithm,
        StatParameter::VnrId,
        StatParameter::VnrState,
        StatParameter::RejectionReason,
        StatParameter::Revenue,
        StatParameter::Cost,
        StatParameter::ActiveVnrs,
        StatParameter::PeakNodeUtilization,
        StatParameter::PeakLinkUtilization,
        StatParameter::MeanNodeUtilization,
        StatParameter::MeanLinkUtilization,
    ];

    pub fn headers() -> Vec<String> {
        Self::ALL.iter().map(|param| format!("{:?}", param)).collect()
    }
}

/// store values in their native format, only format them when writing to the CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl StatValue {
    fn render(&self) -> String {
        match self {
            StatValue::Text(t) => t.clone(),
            StatValue::Integer(i) => i.to_string(),
            StatValue::Float(f) => f.to_string(),
            StatValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl From<bool> for StatValue {
    fn from(v: bool) -> Self {
        StatValue::Bool(v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }

    /// Row in `StatParameter::ALL` order, `NA` for unset columns.
    fn row(&self) -> Vec<String> {
        StatParameter::ALL.iter().map(|param| self.data.get(param).map(StatValue::render).unwrap_or_else(|| "NA".to_string())).collect()
    }
}

/// `;`-separated statistics file, written synchronously.
pub struct StatisticsWriter {
    csv_wtr: csv::Writer<Box<dyn Write>>,
}

impl StatisticsWriter {
    /// Opens `filename` (or stdout when `None`) and writes the header row.
    pub fn create(filename: Option<&str>) -> Result<Self> {
        let writer: Box<dyn Write> = match filename {
            Some(f) => Box::new(File::create(f)?),
            None => Box::new(io::stdout()),
        };

        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
        csv_wtr.write_record(StatParameter::headers())?;
        Ok(Self { csv_wtr })
    }

    pub fn add_event(&mut self, event: &StatisticEvent) -> Result<()> {
        self.csv_wtr.write_record(event.row())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.csv_wtr.flush()?;
        Ok(())
    }
}

/// One event per VNR outcome followed by one per utilization snapshot.
pub fn run_events(result: &RunResult) -> Vec<StatisticEvent> {
    let algorithm = result.algorithm.to_string();
    let mut events = Vec::with_capacity(result.outcomes.len() + result.snapshots.len());

    for outcome in &result.outcomes {
        let mut event = StatisticEvent::new();
        event
            .set(StatParameter::Time, outcome.embedding_time.unwrap_or(outcome.arrival_time))
            .set(StatParameter::LogDescription, "VNR outcome")
            .set(StatParameter::Algorithm, algorithm.as_str())
            .set(StatParameter::VnrId, outcome.vnr_id.id as i64)
            .set(StatParameter::VnrState, format!("{:?}", outcome.state))
            .set(StatParameter::Revenue, outcome.revenue)
            .set(StatParameter::Cost, outcome.cost)
            .set(StatParameter::ActiveVnrs, outcome.currently_active);
        if let Some(reason) = outcome.rejection {
            event.set(StatParameter::RejectionReason, reason.code());
        }
        events.push(event);
    }

    for snapshot in &result.snapshots {
        let mut event = StatisticEvent::new();
        event
            .set(StatParameter::Time, snapshot.time)
            .set(StatParameter::LogDescription, "Utilization snapshot")
            .set(StatParameter::Algorithm, algorithm.as_str())
            .set(StatParameter::ActiveVnrs, snapshot.active_vnrs)
            .set(StatParameter::PeakNodeUtilization, snapshot.peak_node())
            .set(StatParameter::PeakLinkUtilization, snapshot.peak_link())
            .set(StatParameter::MeanNodeUtilization, snapshot.mean_node())
            .set(StatParameter::MeanLinkUtilization, snapshot.mean_link());
        events.push(event);
    }
    events
}

/// Writes all statistics of `result` to `filename` (stdout when `None`).
pub fn export_run(result: &RunResult, filename: Option<&str>) -> Result<()> {
    let mut writer = StatisticsWriter::create(filename)?;
    for event in run_events(result) {
        writer.add_event(&event)?;
    }
    writer.flush()?;
    log::info!("Wrote statistics of {} run to {}.", result.algorithm, filename.unwrap_or("stdout"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_follows_column_order() {
        let mut event = StatisticEvent::new();
        event.set(StatParameter::Time, 5i64).set(StatParameter::Revenue, 40i64);
        let row = event.row();
        assert_eq!(row.len(), StatParameter::ALL.len());
        assert_eq!(row[0], "5");
        assert_eq!(row[1], "NA");
        assert_eq!(row[6], "40");
    }

    #[test]
    fn test_headers_match_variant_names() {
        assert_eq!(StatParameter::headers()[0], "Time");
        assert_eq!(StatParameter::headers()[12], "MeanLinkUtilization");
    }
}
