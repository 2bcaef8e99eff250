//! Golden signals and SLA evaluation.
//!
//! # Signals
//! Computed over completed traces whose start falls inside the window:
//! - Latency: percentiles and mean of trace durations
//! - Traffic: trace count and count per second of window
//! - Errors: traces with at least one failed span, and their share
//! - Saturation: active traces and spans at computation time (a proxy, not
//!   an OS resource measure)
//!
//! Empty windows yield zeros. Nothing here divides by a zero count.

use serde::Serialize;

use crate::config::SlaConfig;
use crate::store::Percentiles;
use crate::trace::TraceDigest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySignal {
    #[serde(flatten)]
    pub percentiles: Percentiles,
    pub mean_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrafficSignal {
    pub request_count: usize,
    pub requests_per_second: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ErrorSignal {
    pub error_count: usize,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaturationSignal {
    pub active_traces: usize,
    pub active_spans: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GoldenSignals {
    pub window_seconds: u64,
    pub computed_at_ms: f64,
    pub latency: LatencySignal,
    pub traffic: TrafficSignal,
    pub errors: ErrorSignal,
    pub saturation: SaturationSignal,
}

impl GoldenSignals {
    /// Aggregate `digests`, which the caller has already restricted to the window.
    ///
    /// An empty window yields all zeros, saturation included.
    pub fn compute(
        digests: &[TraceDigest],
        window_seconds: u64,
        saturation: SaturationSignal,
        computed_at_ms: f64,
    ) -> Self {
        let mut signals = GoldenSignals {
            window_seconds,
            computed_at_ms,
            ..GoldenSignals::default()
        };
        if digests.is_empty() {
            return signals;
        }
        signals.saturation = saturation;

        let mut durations: Vec<f64> = digests.iter().map(|d| d.total_duration_ms).collect();
        durations.sort_unstable_by(f64::total_cmp);
        let count = durations.len();

        signals.latency = LatencySignal {
            percentiles: Percentiles::from_sorted(&durations),
            mean_ms: durations.iter().sum::<f64>() / count as f64,
        };

        signals.traffic = TrafficSignal {
            request_count: count,
            requests_per_second: if window_seconds > 0 {
                count as f64 / window_seconds as f64
            } else {
                0.0
            },
        };

        let error_count = digests.iter().filter(|d| d.error_count > 0).count();
        signals.errors = ErrorSignal {
            error_count,
            error_rate: error_count as f64 / count as f64,
        };

        signals
    }
}

/// SLA compliance over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaReport {
    pub window_seconds: u64,
    pub target_latency_ms: f64,
    pub target_error_rate: f64,
    pub observed_p99_ms: f64,
    pub observed_error_rate: f64,
    pub request_count: usize,
    pub latency_compliant: bool,
    pub error_rate_compliant: bool,
    pub overall_compliant: bool,
}

impl SlaReport {
    pub fn evaluate(signals: &GoldenSignals, targets: &SlaConfig) -> Self {
        let observed_p99_ms = signals.latency.percentiles.p99;
        let observed_error_rate = signals.errors.error_rate;
        let latency_compliant = observed_p99_ms <= targets.target_latency_ms;
        let error_rate_compliant = observed_error_rate <= targets.target_error_rate;

        Self {
            window_seconds: signals.window_seconds,
            target_latency_ms: targets.target_latency_ms,
            target_error_rate: targets.target_error_rate,
            observed_p99_ms,
            observed_error_rate,
            request_count: signals.traffic.request_count,
            latency_compliant,
            error_rate_compliant,
            overall_compliant: latency_compliant && error_rate_compliant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(duration: f64, errors: usize) -> TraceDigest {
        TraceDigest {
            start_time_ms: 0.0,
            total_duration_ms: duration,
            error_count: errors,
        }
    }

    fn targets(latency: f64, error_rate: f64) -> SlaConfig {
        SlaConfig {
            target_latency_ms: latency,
            target_error_rate: error_rate,
        }
    }

    #[test]
    fn test_empty_window_is_zero() {
        let signals = GoldenSignals::compute(&[], 1, SaturationSignal::default(), 5.0);
        assert_eq!(signals.latency, LatencySignal::default());
        assert_eq!(signals.traffic, TrafficSignal::default());
        assert_eq!(signals.errors, ErrorSignal::default());
        assert_eq!(signals.computed_at_ms, 5.0);
    }

    #[test]
    fn test_saturation_zero_on_empty_window() {
        let saturation = SaturationSignal {
            active_traces: 2,
            active_spans: 5,
        };
        let signals = GoldenSignals::compute(&[], 60, saturation, 0.0);
        assert_eq!(signals.saturation, SaturationSignal::default());

        let signals = GoldenSignals::compute(&[digest(10.0, 0)], 60, saturation, 0.0);
        assert_eq!(signals.saturation, saturation);
    }

    #[test]
    fn test_traffic_and_errors() {
        let digests = [digest(10.0, 0), digest(20.0, 2), digest(30.0, 0), digest(40.0, 1)];
        let signals = GoldenSignals::compute(&digests, 2, SaturationSignal::default(), 0.0);

        assert_eq!(signals.traffic.request_count, 4);
        assert_eq!(signals.traffic.requests_per_second, 2.0);
        assert_eq!(signals.errors.error_count, 2);
        assert_eq!(signals.errors.error_rate, 0.5);
        assert_eq!(signals.latency.mean_ms, 25.0);
        assert_eq!(signals.latency.percentiles.p50, 25.0);
    }

    #[test]
    fn test_zero_window_has_no_rate() {
        let signals = GoldenSignals::compute(&[digest(1.0, 0)], 0, SaturationSignal::default(), 0.0);
        assert_eq!(signals.traffic.requests_per_second, 0.0);
    }

    #[test]
    fn test_sla_compliance() {
        let mut signals = GoldenSignals::default();
        signals.latency.percentiles.p99 = 80.0;
        signals.errors.error_rate = 0.005;

        let report = SlaReport::evaluate(&signals, &targets(100.0, 0.01));
        assert!(report.latency_compliant);
        assert!(report.error_rate_compliant);
        assert!(report.overall_compliant);

        signals.latency.percentiles.p99 = 150.0;
        let report = SlaReport::evaluate(&signals, &targets(100.0, 0.01));
        assert!(!report.latency_compliant);
        assert!(report.error_rate_compliant);
        assert!(!report.overall_compliant);
    }

    #[test]
    fn test_latency_serializes_flat() {
        let json = serde_json::to_value(LatencySignal::default()).unwrap();
        assert!(json.get("p99.9").is_some());
        assert!(json.get("mean_ms").is_some());
    }
}
