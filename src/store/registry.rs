//! In-memory metrics store.
//!
//! # Responsibilities
//! - Counters, gauges and histograms keyed by canonical series key
//! - Exemplars linking a histogram to the latest trace that fed it
//! - Per-trace index of samples for trace/metric correlation
//! - Minimal text exposition of counters and gauges
//!
//! # Design Decisions
//! - Sharded concurrent maps (DashMap) so unrelated series never contend
//! - The per-trace index has its own lock and is bounded independently
//! - Histograms are not part of the text exposition

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::buffer::TraceIndex;
use crate::clock::Clock;
use crate::config::BufferConfig;
use crate::store::histogram::{Histogram, HistogramStats, Percentiles};
use crate::store::labels::{canonical_key, exposition_key, label_set, LabelSet};

/// One recorded observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub timestamp_ms: f64,
    pub labels: LabelSet,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

/// Latest traced observation of a histogram series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub trace_id: String,
    pub span_id: Option<String>,
    pub value: f64,
    pub timestamp_ms: f64,
}

#[derive(Debug)]
struct ScalarSeries {
    name: String,
    labels: LabelSet,
    value: f64,
}

#[derive(Debug)]
struct HistogramSeries {
    histogram: Histogram,
    exemplar: Option<Exemplar>,
}

/// Number of series of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeriesCounts {
    pub counters: usize,
    pub gauges: usize,
    pub histograms: usize,
}

pub struct MetricsStore {
    counters: DashMap<String, ScalarSeries>,
    gauges: DashMap<String, ScalarSeries>,
    histograms: DashMap<String, HistogramSeries>,
    trace_samples: Mutex<TraceIndex<MetricSample>>,
    max_histogram_values: usize,
    clock: Arc<dyn Clock>,
}

impl MetricsStore {
    pub fn new(buffers: &BufferConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            gauges: DashMap::new(),
            histograms: DashMap::new(),
            trace_samples: Mutex::new(TraceIndex::new(
                buffers.max_correlated_traces,
                buffers.max_metrics_per_trace,
            )),
            max_histogram_values: buffers.max_histogram_values,
            clock,
        }
    }

    /// Add `amount` to a counter. Negative and non-finite amounts are ignored.
    pub fn increment_counter(&self, name: &str, amount: f64, labels: &[(&str, &str)]) {
        if !(amount.is_finite() && amount >= 0.0) {
            tracing::debug!(metric = name, amount, "Rejected counter increment");
            return;
        }
        let labels = label_set(labels);
        self.counters
            .entry(canonical_key(name, &labels))
            .or_insert_with(|| ScalarSeries {
                name: name.to_string(),
                labels,
                value: 0.0,
            })
            .value += amount;
    }

    pub fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        if !value.is_finite() {
            tracing::debug!(metric = name, value, "Rejected non-finite gauge value");
            return;
        }
        let labels = label_set(labels);
        self.gauges
            .entry(canonical_key(name, &labels))
            .or_insert_with(|| ScalarSeries {
                name: name.to_string(),
                labels,
                value: 0.0,
            })
            .value = value;
    }

    /// Record a histogram sample, optionally linked to a trace.
    pub fn record_metric(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
        trace_id: Option<&str>,
        span_id: Option<&str>,
    ) {
        if !value.is_finite() {
            tracing::debug!(metric = name, value, "Rejected non-finite histogram sample");
            return;
        }
        let labels = label_set(labels);
        let now = self.clock.now_ms();

        {
            let mut series = self
                .histograms
                .entry(canonical_key(name, &labels))
                .or_insert_with(|| HistogramSeries {
                    histogram: Histogram::new(self.max_histogram_values),
                    exemplar: None,
                });
            series.histogram.record(value);
            if let Some(trace_id) = trace_id {
                series.exemplar = Some(Exemplar {
                    trace_id: trace_id.to_string(),
                    span_id: span_id.map(str::to_string),
                    value,
                    timestamp_ms: now,
                });
            }
        }

        if let Some(trace_id) = trace_id {
            let sample = MetricSample {
                name: name.to_string(),
                value,
                timestamp_ms: now,
                labels,
                trace_id: Some(trace_id.to_string()),
                span_id: span_id.map(str::to_string),
            };
            self.trace_samples.lock().insert(trace_id, sample);
        }
    }

    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.counters
            .get(&canonical_key(name, &label_set(labels)))
            .map(|s| s.value)
    }

    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges
            .get(&canonical_key(name, &label_set(labels)))
            .map(|s| s.value)
    }

    /// Percentiles of a histogram series; all zero if it does not exist.
    pub fn get_percentiles(&self, name: &str, labels: &[(&str, &str)]) -> Percentiles {
        self.histograms
            .get(&canonical_key(name, &label_set(labels)))
            .map(|s| s.histogram.percentiles())
            .unwrap_or_default()
    }

    pub fn histogram_stats(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramStats> {
        self.histograms
            .get(&canonical_key(name, &label_set(labels)))
            .map(|s| s.histogram.stats())
    }

    pub fn exemplar(&self, name: &str, labels: &[(&str, &str)]) -> Option<Exemplar> {
        self.histograms
            .get(&canonical_key(name, &label_set(labels)))
            .and_then(|s| s.exemplar.clone())
    }

    /// Samples recorded under `trace_id`, oldest first.
    pub fn samples_for_trace(&self, trace_id: &str) -> Vec<MetricSample> {
        self.trace_samples
            .lock()
            .get(trace_id)
            .map(|samples| samples.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop the correlation entries of a trace that left history.
    pub fn forget_trace(&self, trace_id: &str) -> Option<VecDeque<MetricSample>> {
        self.trace_samples.lock().remove(trace_id)
    }

    pub fn correlated_traces(&self) -> usize {
        self.trace_samples.lock().len()
    }

    pub fn series_counts(&self) -> SeriesCounts {
        SeriesCounts {
            counters: self.counters.len(),
            gauges: self.gauges.len(),
            histograms: self.histograms.len(),
        }
    }

    /// One `series value` line per counter and gauge, sorted by series.
    pub fn export_prometheus(&self) -> String {
        let mut lines: Vec<String> = self
            .counters
            .iter()
            .chain(self.gauges.iter())
            .map(|entry| {
                let series = entry.value();
                format!("{} {}", exposition_key(&series.name, &series.labels), series.value)
            })
            .collect();
        lines.sort_unstable();

        let mut output = lines.join("\n");
        if !output.is_empty() {
            output.push('\n');
        }
        output
    }
}
