//! Read-side views assembled from several subsystems.

use serde::Serialize;

use crate::config::SamplingConfig;
use crate::logs::{CorrelatedLog, LogStats};
use crate::store::{MetricSample, SeriesCounts};
use crate::trace::{RecorderStats, Trace};

/// A trace together with the logs and metric samples recorded under its id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedTrace {
    pub trace: Trace,
    /// The root span has not ended yet; derived fields are not final.
    pub in_progress: bool,
    pub logs: Vec<CorrelatedLog>,
    pub metrics: Vec<MetricSample>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub total: usize,
    pub active: usize,
}

/// Point-in-time counts of every table and ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatistics {
    pub service_name: String,
    pub uptime_ms: f64,
    pub traces: RecorderStats,
    pub logs: LogStats,
    pub metric_series: SeriesCounts,
    pub metric_correlated_traces: usize,
    pub alerts: AlertCounts,
    pub dependency_edges: usize,
    pub sampling: SamplingConfig,
}
