//! The observability engine.
//!
//! # Responsibilities
//! - Own one instance of every subsystem and wire them together
//! - Expose the caller-facing API (write side and read side)
//! - Keep correlation indices in step with trace retention
//! - Apply reloaded configuration without a restart
//!
//! # Data Flow
//! ```text
//! start_trace / end_span / add_span_event ──▶ trace::TraceRecorder
//!                                                │ root ended
//!                                                ▼
//!                                   sampling::Sampler (tail decision)
//!                                   ├─ retained → completed ring, dependency graph
//!                                   └─ dropped  → forget correlated logs/metrics
//!                                   evicted from ring → forget correlated logs/metrics
//!
//! record_metric / increment_counter / set_gauge ──▶ store::MetricsStore
//! log ──────────────────────────────────────────▶ logs::LogCorrelator
//!
//! get_golden_signals ──▶ completed ring (window) → analysis::GoldenSignals
//! detect_anomalies   ──▶ get_golden_signals → analysis::AnomalyDetector
//! ```
//!
//! # Design Decisions
//! - Constructed explicitly and shared by `Arc`; there is no global instance
//! - Caller-facing operations never fail; bad input is a no-op
//! - Policy (sampling, SLA, anomaly thresholds) is hot-swappable, capacities
//!   are not

pub mod correlation;
pub mod sink;

use std::sync::Arc;

use arc_swap::ArcSwap;
use uuid::Uuid;

use crate::analysis::{
    AnomalyAlert, AnomalyDetector, DependencyGraph, GoldenSignals, SaturationSignal,
    ServiceDependencies, SlaReport,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{AnomalyConfig, BufferConfig, EngineConfig, SamplingConfig, SlaConfig};
use crate::logs::{CorrelatedLog, LogCorrelator, LogLevel, LogRecord};
use crate::sampling::Sampler;
use crate::store::{Exemplar, HistogramStats, MetricsStore, Percentiles};
use crate::trace::{SpanEnd, SpanStatus, Trace, TraceContext, TraceQuery, TraceRecorder};

pub use correlation::{AlertCounts, CorrelatedTrace, EngineStatistics};
pub use sink::{NoopTelemetry, TelemetrySink};

pub struct ObservabilityEngine {
    service_name: String,
    buffers: BufferConfig,
    clock: Arc<dyn Clock>,
    started_at_ms: f64,
    sampler: Arc<Sampler>,
    sla: ArcSwap<SlaConfig>,
    dependencies: Arc<DependencyGraph>,
    recorder: TraceRecorder,
    metrics: MetricsStore,
    logs: LogCorrelator,
    anomalies: AnomalyDetector,
}

impl ObservabilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let sampler = Arc::new(Sampler::new(config.sampling));
        let dependencies = Arc::new(DependencyGraph::new());
        let recorder = TraceRecorder::new(
            config.buffers.max_completed_traces,
            Arc::clone(&sampler),
            Arc::clone(&dependencies),
            Arc::clone(&clock),
            config.service_name.clone(),
        );

        tracing::info!(
            service_name = %config.service_name,
            max_completed_traces = config.buffers.max_completed_traces,
            max_logs = config.buffers.max_logs,
            "Observability engine initialized"
        );

        Self {
            metrics: MetricsStore::new(&config.buffers, Arc::clone(&clock)),
            logs: LogCorrelator::new(&config.buffers, Arc::clone(&clock)),
            anomalies: AnomalyDetector::new(config.anomaly, config.buffers.max_alerts),
            sla: ArcSwap::from_pointee(config.sla),
            started_at_ms: clock.now_ms(),
            service_name: config.service_name,
            buffers: config.buffers,
            clock,
            sampler,
            dependencies,
            recorder,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    // --- tracing -----------------------------------------------------------

    /// Open a span. Without `parent` a new trace starts and is head-sampled.
    pub fn start_trace(
        &self,
        operation: &str,
        parent: Option<&TraceContext>,
        tags: &[(&str, &str)],
    ) -> TraceContext {
        self.recorder.start_span(operation, parent, tags)
    }

    /// End a span. `false` if the id is unknown or the span already ended.
    pub fn end_span(
        &self,
        span_id: &str,
        status: SpanStatus,
        error: Option<&str>,
        metrics: &[(&str, f64)],
    ) -> bool {
        match self.recorder.end_span(span_id, status, error, metrics) {
            SpanEnd::Unknown => false,
            SpanEnd::Ended => true,
            SpanEnd::Finalized(finalization) => {
                if !finalization.decision.is_retained() {
                    self.forget_trace(&finalization.trace_id);
                }
                if let Some(evicted) = finalization.evicted_trace_id.as_deref() {
                    // A trace id seen twice may still have a newer retained copy
                    if self.recorder.completed_trace(evicted).is_none() {
                        self.forget_trace(evicted);
                    }
                }
                true
            }
        }
    }

    pub fn add_span_event(&self, span_id: &str, name: &str, attributes: &[(&str, &str)]) -> bool {
        self.recorder.add_event(span_id, name, attributes)
    }

    fn forget_trace(&self, trace_id: &str) {
        self.logs.forget_trace(trace_id);
        self.metrics.forget_trace(trace_id);
    }

    /// A completed trace, or an in-progress one, with its logs and samples.
    pub fn get_trace_with_correlation(&self, trace_id: &str) -> Option<CorrelatedTrace> {
        let (trace, in_progress) = match self.recorder.completed_trace(trace_id) {
            Some(trace) => (trace, false),
            None => (self.recorder.active_trace(trace_id)?, true),
        };
        Some(CorrelatedTrace {
            trace,
            in_progress,
            logs: self.logs.logs_for_trace(trace_id),
            metrics: self.metrics.samples_for_trace(trace_id),
        })
    }

    /// Completed traces matching `query`, newest first.
    pub fn find_traces_by_criteria(&self, query: &TraceQuery) -> Vec<Trace> {
        self.recorder.find(query)
    }

    pub fn get_service_dependencies(&self) -> ServiceDependencies {
        self.dependencies.edges()
    }

    // --- metrics -----------------------------------------------------------

    pub fn record_metric(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
        trace_id: Option<&str>,
        span_id: Option<&str>,
    ) {
        self.metrics.record_metric(name, value, labels, trace_id, span_id);
    }

    pub fn increment_counter(&self, name: &str, amount: f64, labels: &[(&str, &str)]) {
        self.metrics.increment_counter(name, amount, labels);
    }

    pub fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.metrics.set_gauge(name, value, labels);
    }

    pub fn get_percentiles(&self, name: &str, labels: &[(&str, &str)]) -> Percentiles {
        self.metrics.get_percentiles(name, labels)
    }

    pub fn get_histogram_stats(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramStats> {
        self.metrics.histogram_stats(name, labels)
    }

    pub fn get_exemplar(&self, name: &str, labels: &[(&str, &str)]) -> Option<Exemplar> {
        self.metrics.exemplar(name, labels)
    }

    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.metrics.counter_value(name, labels)
    }

    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.metrics.gauge_value(name, labels)
    }

    pub fn export_prometheus_metrics(&self) -> String {
        self.metrics.export_prometheus()
    }

    // --- logs --------------------------------------------------------------

    pub fn log(&self, record: LogRecord) {
        self.logs.log(record);
    }

    pub fn recent_logs(&self, limit: usize, min_level: Option<LogLevel>) -> Vec<CorrelatedLog> {
        self.logs.recent(limit, min_level)
    }

    // --- analysis ----------------------------------------------------------

    /// Golden signals over completed traces that started in the last `window_seconds`.
    pub fn get_golden_signals(&self, window_seconds: u64) -> GoldenSignals {
        let now = self.clock.now_ms();
        let since = now - window_seconds as f64 * 1000.0;
        let digests = self.recorder.digests_since(since);
        let (active_traces, active_spans) = self.recorder.active_counts();

        GoldenSignals::compute(
            &digests,
            window_seconds,
            SaturationSignal {
                active_traces,
                active_spans,
            },
            now,
        )
    }

    /// SLA compliance against the configured targets.
    pub fn check_sla(&self, window_seconds: u64) -> SlaReport {
        let targets = self.sla.load();
        self.check_sla_with(window_seconds, &targets)
    }

    pub fn check_sla_with(&self, window_seconds: u64, targets: &SlaConfig) -> SlaReport {
        SlaReport::evaluate(&self.get_golden_signals(window_seconds), targets)
    }

    /// Evaluate the configured window against the baselines and fold it in.
    pub fn detect_anomalies(&self) -> Vec<AnomalyAlert> {
        let window = self.anomalies.config().window_secs;
        self.anomalies.evaluate(&self.get_golden_signals(window))
    }

    pub fn anomaly_detector(&self) -> &AnomalyDetector {
        &self.anomalies
    }

    pub fn alerts(&self) -> Vec<AnomalyAlert> {
        self.anomalies.alerts()
    }

    pub fn active_alerts(&self) -> Vec<AnomalyAlert> {
        self.anomalies.active_alerts()
    }

    pub fn resolve_alert(&self, id: Uuid) -> bool {
        self.anomalies.resolve(id)
    }

    // --- configuration and statistics --------------------------------------

    pub fn sampling_config(&self) -> Arc<SamplingConfig> {
        self.sampler.config()
    }

    pub fn sla_config(&self) -> Arc<SlaConfig> {
        self.sla.load_full()
    }

    pub fn anomaly_config(&self) -> Arc<AnomalyConfig> {
        self.anomalies.config()
    }

    /// Swap in reloaded policy. Capacities and service name stay as built.
    pub fn apply_config(&self, config: &EngineConfig) {
        if config.buffers != self.buffers {
            tracing::warn!("Buffer capacities changed in config; restart required to apply");
        }
        if config.service_name != self.service_name {
            tracing::warn!(
                configured = %config.service_name,
                running = %self.service_name,
                "Service name changed in config; restart required to apply"
            );
        }

        if *self.sampler.config() != config.sampling {
            self.sampler.update(config.sampling.clone());
        }
        if **self.sla.load() != config.sla {
            tracing::info!(
                target_latency_ms = config.sla.target_latency_ms,
                target_error_rate = config.sla.target_error_rate,
                "SLA targets updated"
            );
            self.sla.store(Arc::new(config.sla.clone()));
        }
        if *self.anomalies.config() != config.anomaly {
            self.anomalies.update(config.anomaly.clone());
        }
    }

    pub fn get_statistics(&self) -> EngineStatistics {
        let alerts = AlertCounts {
            total: self.anomalies.alert_count(),
            active: self.anomalies.active_alerts().len(),
        };
        EngineStatistics {
            service_name: self.service_name.clone(),
            uptime_ms: (self.clock.now_ms() - self.started_at_ms).max(0.0),
            traces: self.recorder.stats(),
            logs: self.logs.stats(),
            metric_series: self.metrics.series_counts(),
            metric_correlated_traces: self.metrics.correlated_traces(),
            alerts,
            dependency_edges: self.dependencies.edge_count(),
            sampling: (*self.sampler.config()).clone(),
        }
    }
}

impl Default for ObservabilityEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TelemetrySink for ObservabilityEngine {
    fn start_trace(
        &self,
        operation: &str,
        parent: Option<&TraceContext>,
        tags: &[(&str, &str)],
    ) -> TraceContext {
        ObservabilityEngine::start_trace(self, operation, parent, tags)
    }

    fn end_span(
        &self,
        span_id: &str,
        status: SpanStatus,
        error: Option<&str>,
        metrics: &[(&str, f64)],
    ) -> bool {
        ObservabilityEngine::end_span(self, span_id, status, error, metrics)
    }

    fn add_span_event(&self, span_id: &str, name: &str, attributes: &[(&str, &str)]) -> bool {
        ObservabilityEngine::add_span_event(self, span_id, name, attributes)
    }

    fn record_metric(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
        trace_id: Option<&str>,
        span_id: Option<&str>,
    ) {
        ObservabilityEngine::record_metric(self, name, value, labels, trace_id, span_id)
    }

    fn increment_counter(&self, name: &str, amount: f64, labels: &[(&str, &str)]) {
        ObservabilityEngine::increment_counter(self, name, amount, labels)
    }

    fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        ObservabilityEngine::set_gauge(self, name, value, labels)
    }

    fn log(&self, record: LogRecord) {
        ObservabilityEngine::log(self, record)
    }
}
