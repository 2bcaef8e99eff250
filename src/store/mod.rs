//! Metrics store subsystem.
//!
//! # Data Flow
//! ```text
//! increment_counter / set_gauge / record_metric (name, value, labels)
//!     → labels.rs (sort by key, join as k=v → canonical series key)
//!     → registry.rs (counter, gauge or histogram series)
//!     → histogram.rs (bounded raw values → percentiles, mean, min, max)
//!
//! record_metric with trace_id
//!     → exemplar on the series
//!     → per-trace sample index (evicted with the trace)
//! ```

pub mod histogram;
pub mod labels;
pub mod registry;

pub use histogram::{percentile, Histogram, HistogramStats, Percentiles};
pub use labels::{canonical_key, label_set, LabelSet};
pub use registry::{Exemplar, MetricSample, MetricsStore, SeriesCounts};
