//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates within [0, 1], capacities > 0, factors > 0)
//! - Validate bind addresses and log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system (startup and reload)
//! - Suspicious but legal combinations are warnings, reported by `config_warnings`

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::EngineConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("anomaly.ewma_alpha must be within (0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_level is not a recognised level: {0}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_rate(&mut errors, "sampling.sample_rate", config.sampling.sample_rate);
    check_positive(&mut errors, "sampling.sla_target_ms", config.sampling.sla_target_ms);
    check_positive(
        &mut errors,
        "sampling.slow_trace_multiplier",
        config.sampling.slow_trace_multiplier,
    );

    let buffers = &config.buffers;
    for (field, value) in [
        ("buffers.max_completed_traces", buffers.max_completed_traces),
        ("buffers.max_histogram_values", buffers.max_histogram_values),
        ("buffers.max_logs", buffers.max_logs),
        ("buffers.max_correlated_traces", buffers.max_correlated_traces),
        ("buffers.max_logs_per_trace", buffers.max_logs_per_trace),
        ("buffers.max_metrics_per_trace", buffers.max_metrics_per_trace),
        ("buffers.max_alerts", buffers.max_alerts),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let anomaly = &config.anomaly;
    if anomaly.window_secs == 0 {
        errors.push(ValidationError::Zero { field: "anomaly.window_secs" });
    }
    if anomaly.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "anomaly.interval_secs" });
    }
    if !(anomaly.ewma_alpha > 0.0 && anomaly.ewma_alpha <= 1.0) {
        errors.push(ValidationError::AlphaOutOfRange(anomaly.ewma_alpha));
    }
    check_positive(&mut errors, "anomaly.latency_spike_factor", anomaly.latency_spike_factor);
    check_positive(&mut errors, "anomaly.error_spike_factor", anomaly.error_spike_factor);
    check_rate(&mut errors, "anomaly.error_rate_floor", anomaly.error_rate_floor);

    check_positive(&mut errors, "sla.target_latency_ms", config.sla.target_latency_ms);
    check_rate(&mut errors, "sla.target_error_rate", config.sla.target_error_rate);

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.request_timeout_secs == 0 {
            errors.push(ValidationError::Zero { field: "admin.request_timeout_secs" });
        }
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Legal settings that are probably a mistake.
pub fn config_warnings(config: &EngineConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let tail_target = config.sampling.sla_target_ms;
    let sla_target = config.sla.target_latency_ms;
    if tail_target != sla_target {
        warnings.push(format!(
            "sampling.sla_target_ms ({tail_target}) differs from sla.target_latency_ms ({sla_target}); \
             slow-trace retention and SLA checks use different latency targets"
        ));
    }
    warnings
}

fn check_rate(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::RateOutOfRange { field, value });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: f64) {
    // NaN fails this comparison too
    if !(value > 0.0) {
        errors.push(ValidationError::NotPositive { field, value });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.sampling.sample_rate = 1.5;
        config.buffers.max_logs = 0;
        config.anomaly.ewma_alpha = 0.0;
        config.admin.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::RateOutOfRange {
            field: "sampling.sample_rate",
            value: 1.5
        }));
        assert!(errors.contains(&ValidationError::Zero { field: "buffers.max_logs" }));
        assert!(errors.contains(&ValidationError::AlphaOutOfRange(0.0)));
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut config = EngineConfig::default();
        config.sla.target_latency_ms = f64::NAN;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::NotPositive { field: "sla.target_latency_ms", .. }
        ));
    }

    #[test]
    fn test_disabled_admin_skips_address_check() {
        let mut config = EngineConfig::default();
        config.admin.enabled = false;
        config.admin.bind_address = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_diverging_latency_targets_warn() {
        let mut config = EngineConfig::default();
        assert!(config_warnings(&config).is_empty());

        config.sampling.sla_target_ms = 250.0;
        let warnings = config_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sampling.sla_target_ms (250)"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::Zero { field: "buffers.max_logs" };
        assert_eq!(err.to_string(), "buffers.max_logs must be greater than zero");
    }
}
