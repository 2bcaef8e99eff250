//! Engine self-metrics.
//!
//! These describe the engine itself, not the telemetry it stores. They go
//! through the `metrics` facade and are a no-op until a recorder is installed.
//!
//! # Metrics
//! - `obs_spans_started_total` (counter)
//! - `obs_spans_ended_total` (counter): by status
//! - `obs_late_spans_total` (counter): spans ending after their trace finalized
//! - `obs_traces_finalized_total` (counter): by tail sampling outcome
//! - `obs_traces_evicted_total` (counter): pushed out of the completed ring
//! - `obs_logs_total` (counter): by level
//! - `obs_anomalies_total` (counter): by kind and severity
//! - `obs_active_traces`, `obs_active_spans` (gauges)

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Self-metrics exporter listening");
    Ok(())
}

pub fn record_span_started() {
    metrics::counter!("obs_spans_started_total").increment(1);
}

pub fn record_span_ended(status: &'static str) {
    metrics::counter!("obs_spans_ended_total", "status" => status).increment(1);
}

pub fn record_late_span() {
    metrics::counter!("obs_late_spans_total").increment(1);
}

pub fn record_trace_finalized(outcome: &'static str) {
    metrics::counter!("obs_traces_finalized_total", "outcome" => outcome).increment(1);
}

pub fn record_trace_evicted() {
    metrics::counter!("obs_traces_evicted_total").increment(1);
}

pub fn record_log(level: &'static str) {
    metrics::counter!("obs_logs_total", "level" => level).increment(1);
}

pub fn record_anomaly(kind: &'static str, severity: &'static str) {
    metrics::counter!("obs_anomalies_total", "kind" => kind, "severity" => severity).increment(1);
}

pub fn record_active(active_traces: usize, active_spans: usize) {
    metrics::gauge!("obs_active_traces").set(active_traces as f64);
    metrics::gauge!("obs_active_spans").set(active_spans as f64);
}
