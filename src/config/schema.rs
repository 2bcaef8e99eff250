//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file (or no file) is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the observability engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Service name recorded on spans that carry no `service.name` tag.
    pub service_name: String,

    /// Head and tail sampling settings.
    pub sampling: SamplingConfig,

    /// Capacities of the history buffers.
    pub buffers: BufferConfig,

    /// Anomaly detection settings.
    pub anomaly: AnomalyConfig,

    /// Service level objective used by SLA reports.
    pub sla: SlaConfig,

    /// Admin exposition API.
    pub admin: AdminConfig,

    /// Self-observability (engine logs and process metrics).
    pub observability: ObservabilityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown-service".to_string(),
            sampling: SamplingConfig::default(),
            buffers: BufferConfig::default(),
            anomaly: AnomalyConfig::default(),
            sla: SlaConfig::default(),
            admin: AdminConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Probability (0.0 - 1.0) that an ordinary trace is sampled.
    pub sample_rate: f64,

    /// Latency target used to classify a trace as slow, in milliseconds.
    pub sla_target_ms: f64,

    /// A trace slower than `slow_trace_multiplier × sla_target_ms` is always kept.
    pub slow_trace_multiplier: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 0.1,
            sla_target_ms: 1000.0,
            slow_trace_multiplier: 2.0,
        }
    }
}

/// History buffer capacities.
///
/// Fixed for the lifetime of an engine; reloads do not resize buffers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Completed traces kept for querying and golden signals.
    pub max_completed_traces: usize,

    /// Raw values kept per histogram series.
    pub max_histogram_values: usize,

    /// Logs kept in the global ring.
    pub max_logs: usize,

    /// Traces that may hold correlated logs/metrics at once.
    pub max_correlated_traces: usize,

    /// Logs kept per trace in the correlation index.
    pub max_logs_per_trace: usize,

    /// Metric samples kept per trace in the correlation index.
    pub max_metrics_per_trace: usize,

    /// Anomaly alerts kept.
    pub max_alerts: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_completed_traces: 10_000,
            max_histogram_values: 1_000,
            max_logs: 10_000,
            max_correlated_traces: 10_000,
            max_logs_per_trace: 500,
            max_metrics_per_trace: 500,
            max_alerts: 1_000,
        }
    }
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Run the periodic analysis monitor.
    pub enabled: bool,

    /// Sliding window analysed on each run, in seconds.
    pub window_secs: u64,

    /// How often the monitor runs, in seconds.
    pub interval_secs: u64,

    /// EWMA smoothing factor for baselines.
    pub ewma_alpha: f64,

    /// p99 above `latency_spike_factor × baseline` raises a latency spike.
    pub latency_spike_factor: f64,

    /// Error rate above `error_spike_factor × baseline` raises an error spike...
    pub error_spike_factor: f64,

    /// ...but only when the error rate also exceeds this absolute floor.
    pub error_rate_floor: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 300,
            interval_secs: 60,
            ewma_alpha: 0.1,
            latency_spike_factor: 3.0,
            error_spike_factor: 2.0,
            error_rate_floor: 0.01,
        }
    }
}

/// Service level objective.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SlaConfig {
    /// Maximum acceptable p99 latency in milliseconds.
    pub target_latency_ms: f64,

    /// Maximum acceptable error rate (0.0 - 1.0).
    pub target_error_rate: f64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            target_latency_ms: 1000.0,
            target_error_rate: 0.01,
        }
    }
}

/// Admin exposition API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:9464").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:9464".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Observability configuration for the engine process itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus exporter for engine self-metrics.
    pub metrics_enabled: bool,

    /// Self-metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sampling.slow_trace_multiplier, 2.0);
        assert_eq!(config.anomaly.window_secs, 300);
        assert_eq!(config.anomaly.ewma_alpha, 0.1);
        assert_eq!(config.sla.target_error_rate, 0.01);
        assert!(config.buffers.max_completed_traces > 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            service_name = "checkout"

            [sampling]
            sample_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.service_name, "checkout");
        assert_eq!(config.sampling.sample_rate, 0.5);
        assert_eq!(config.sampling.sla_target_ms, 1000.0);
        assert_eq!(config.buffers, BufferConfig::default());
    }
}
