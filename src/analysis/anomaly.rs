//! Anomaly detection against EWMA baselines.
//!
//! # Responsibilities
//! - Keep one exponentially weighted baseline per monitored signal
//! - Compare each window's golden signals against the baselines
//! - Store raised alerts in a bounded history and track resolution
//!
//! # Rules
//! ```text
//! latency_spike (HIGH)     p99 > latency_spike_factor × baseline(p99)
//! error_spike   (CRITICAL) rate > error_spike_factor × baseline(rate)
//!                          and rate > error_rate_floor
//! after comparison         baseline = α·current + (1 - α)·baseline
//! ```
//!
//! # Design Decisions
//! - The first non-empty window seeds the baselines and raises nothing
//! - Windows without requests are skipped entirely so idle periods do not
//!   drag the baselines to zero
//! - Thresholds are hot-swappable; baselines survive a config swap

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::golden::GoldenSignals;
use crate::buffer::BoundedRing;
use crate::config::AnomalyConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    LatencySpike,
    ErrorSpike,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyKind::LatencySpike => "latency_spike",
            AnomalyKind::ErrorSpike => "error_spike",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            AnomalyKind::LatencySpike => Severity::High,
            AnomalyKind::ErrorSpike => Severity::Critical,
        }
    }

    pub fn recommended_action(self) -> &'static str {
        match self {
            AnomalyKind::LatencySpike => {
                "Inspect the slowest recent traces and their bottleneck spans; check downstream dependencies and resource limits"
            }
            AnomalyKind::ErrorSpike => {
                "Inspect recent error traces and correlated logs; consider rolling back the latest deployment"
            }
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal with its own baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoredSignal {
    LatencyP99,
    ErrorRate,
}

impl MonitoredSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitoredSignal::LatencyP99 => "latency_p99",
            MonitoredSignal::ErrorRate => "error_rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub id: Uuid,
    pub timestamp_ms: f64,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub description: String,
    pub metrics: BTreeMap<String, f64>,
    pub recommended_action: String,
    pub resolved: bool,
}

impl AnomalyAlert {
    fn raise(kind: AnomalyKind, timestamp_ms: f64, description: String, metrics: BTreeMap<String, f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            severity: kind.severity(),
            kind,
            description,
            metrics,
            recommended_action: kind.recommended_action().to_string(),
            resolved: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Baselines {
    latency_p99: Option<f64>,
    error_rate: Option<f64>,
}

impl Baselines {
    fn slot(&mut self, signal: MonitoredSignal) -> &mut Option<f64> {
        match signal {
            MonitoredSignal::LatencyP99 => &mut self.latency_p99,
            MonitoredSignal::ErrorRate => &mut self.error_rate,
        }
    }
}

#[derive(Debug)]
struct DetectorState {
    baselines: Baselines,
    alerts: BoundedRing<AnomalyAlert>,
}

pub struct AnomalyDetector {
    config: ArcSwap<AnomalyConfig>,
    state: Mutex<DetectorState>,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig, max_alerts: usize) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            state: Mutex::new(DetectorState {
                baselines: Baselines::default(),
                alerts: BoundedRing::new(max_alerts),
            }),
        }
    }

    pub fn config(&self) -> Arc<AnomalyConfig> {
        self.config.load_full()
    }

    pub fn update(&self, config: AnomalyConfig) {
        tracing::info!(
            ewma_alpha = config.ewma_alpha,
            latency_spike_factor = config.latency_spike_factor,
            error_spike_factor = config.error_spike_factor,
            "Anomaly thresholds updated"
        );
        self.config.store(Arc::new(config));
    }

    /// Compare one window against the baselines, then fold it into them.
    ///
    /// A window with no requests is not folded in: baselines only move on
    /// observed traffic, so an idle window returns no alerts and leaves them as is.
    pub fn evaluate(&self, signals: &GoldenSignals) -> Vec<AnomalyAlert> {
        if signals.traffic.request_count == 0 {
            tracing::debug!(window_seconds = signals.window_seconds, "Empty window skipped");
            return Vec::new();
        }

        let config = self.config.load();
        let p99 = signals.latency.percentiles.p99;
        let error_rate = signals.errors.error_rate;
        let mut raised = Vec::new();

        let mut state = self.state.lock();

        if let Some(baseline) = state.baselines.latency_p99 {
            if p99 > config.latency_spike_factor * baseline {
                raised.push(AnomalyAlert::raise(
                    AnomalyKind::LatencySpike,
                    signals.computed_at_ms,
                    format!("p99 latency {p99:.1}ms exceeds {:.1}x baseline {baseline:.1}ms", config.latency_spike_factor),
                    BTreeMap::from([
                        ("p99_ms".to_string(), p99),
                        ("baseline_p99_ms".to_string(), baseline),
                        ("request_count".to_string(), signals.traffic.request_count as f64),
                    ]),
                ));
            }
        }

        if let Some(baseline) = state.baselines.error_rate {
            if error_rate > config.error_spike_factor * baseline && error_rate > config.error_rate_floor {
                raised.push(AnomalyAlert::raise(
                    AnomalyKind::ErrorSpike,
                    signals.computed_at_ms,
                    format!(
                        "error rate {:.2}% exceeds {:.1}x baseline {:.2}%",
                        error_rate * 100.0,
                        config.error_spike_factor,
                        baseline * 100.0
                    ),
                    BTreeMap::from([
                        ("error_rate".to_string(), error_rate),
                        ("baseline_error_rate".to_string(), baseline),
                        ("error_count".to_string(), signals.errors.error_count as f64),
                    ]),
                ));
            }
        }

        let alpha = config.ewma_alpha;
        for (signal, current) in [(MonitoredSignal::LatencyP99, p99), (MonitoredSignal::ErrorRate, error_rate)] {
            let slot = state.baselines.slot(signal);
            *slot = Some(match *slot {
                Some(baseline) => alpha * current + (1.0 - alpha) * baseline,
                None => current,
            });
        }

        for alert in &raised {
            tracing::warn!(
                alert_id = %alert.id,
                kind = alert.kind.as_str(),
                severity = alert.severity.as_str(),
                description = %alert.description,
                "Anomaly detected"
            );
            metrics::record_anomaly(alert.kind.as_str(), alert.severity.as_str());
            state.alerts.push(alert.clone());
        }

        raised
    }

    /// Set a baseline directly, e.g. from a known steady state.
    pub fn seed_baseline(&self, signal: MonitoredSignal, value: f64) {
        *self.state.lock().baselines.slot(signal) = Some(value);
    }

    pub fn baseline(&self, signal: MonitoredSignal) -> Option<f64> {
        *self.state.lock().baselines.slot(signal)
    }

    /// All retained alerts, newest first.
    pub fn alerts(&self) -> Vec<AnomalyAlert> {
        self.state.lock().alerts.iter_newest().cloned().collect()
    }

    /// Unresolved alerts, newest first.
    pub fn active_alerts(&self) -> Vec<AnomalyAlert> {
        self.state
            .lock()
            .alerts
            .iter_newest()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Mark an alert resolved. `false` if the id is not in history.
    pub fn resolve(&self, id: Uuid) -> bool {
        let mut state = self.state.lock();
        if let Some(alert) = state.alerts.iter_mut().find(|a| a.id == id) {
            alert.resolved = true;
            tracing::info!(alert_id = %id, kind = alert.kind.as_str(), "Alert resolved");
            return true;
        }
        false
    }

    pub fn alert_count(&self) -> usize {
        self.state.lock().alerts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(p99: f64, error_rate: f64, requests: usize) -> GoldenSignals {
        let mut signals = GoldenSignals::default();
        signals.window_seconds = 300;
        signals.latency.percentiles.p99 = p99;
        signals.errors.error_rate = error_rate;
        signals.errors.error_count = (error_rate * requests as f64).round() as usize;
        signals.traffic.request_count = requests;
        signals
    }

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(AnomalyConfig::default(), 10)
    }

    #[test]
    fn test_first_window_seeds_without_alerting() {
        let detector = detector();
        assert!(detector.evaluate(&window(500.0, 0.5, 10)).is_empty());
        assert_eq!(detector.baseline(MonitoredSignal::LatencyP99), Some(500.0));
        assert_eq!(detector.baseline(MonitoredSignal::ErrorRate), Some(0.5));
    }

    #[test]
    fn test_latency_spike_is_high() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 50.0);
        detector.seed_baseline(MonitoredSignal::ErrorRate, 0.0);

        let alerts = detector.evaluate(&window(200.0, 0.0, 10));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AnomalyKind::LatencySpike);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].recommended_action, AnomalyKind::LatencySpike.recommended_action());
        assert_eq!(alerts[0].metrics["baseline_p99_ms"], 50.0);
    }

    #[test]
    fn test_small_increase_does_not_alert() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 50.0);
        assert!(detector.evaluate(&window(60.0, 0.0, 10)).is_empty());
    }

    #[test]
    fn test_baseline_moves_by_ewma() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 50.0);
        detector.evaluate(&window(60.0, 0.0, 10));
        let baseline = detector.baseline(MonitoredSignal::LatencyP99).unwrap();
        assert!((baseline - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_spike_needs_floor() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 100.0);
        detector.seed_baseline(MonitoredSignal::ErrorRate, 0.001);

        // 5x baseline but under the 1% floor
        assert!(detector.evaluate(&window(100.0, 0.005, 1000)).is_empty());

        detector.seed_baseline(MonitoredSignal::ErrorRate, 0.01);
        let alerts = detector.evaluate(&window(100.0, 0.05, 1000));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AnomalyKind::ErrorSpike);
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_empty_window_is_skipped() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 50.0);
        assert!(detector.evaluate(&window(0.0, 0.0, 0)).is_empty());
        assert_eq!(detector.baseline(MonitoredSignal::LatencyP99), Some(50.0));
        assert_eq!(detector.baseline(MonitoredSignal::ErrorRate), None);
    }

    #[test]
    fn test_resolve_and_active_alerts() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 10.0);
        let first = detector.evaluate(&window(100.0, 0.0, 5)).remove(0);
        detector.seed_baseline(MonitoredSignal::LatencyP99, 10.0);
        let second = detector.evaluate(&window(100.0, 0.0, 5)).remove(0);

        assert!(detector.resolve(first.id));
        assert!(!detector.resolve(Uuid::new_v4()));

        let active = detector.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert_eq!(detector.alerts().len(), 2);
    }

    #[test]
    fn test_alert_history_is_bounded() {
        let detector = AnomalyDetector::new(AnomalyConfig::default(), 2);
        for _ in 0..3 {
            detector.seed_baseline(MonitoredSignal::LatencyP99, 1.0);
            detector.evaluate(&window(100.0, 0.0, 1));
        }
        assert_eq!(detector.alert_count(), 2);
    }

    #[test]
    fn test_update_swaps_thresholds() {
        let detector = detector();
        detector.update(AnomalyConfig {
            latency_spike_factor: 10.0,
            ..AnomalyConfig::default()
        });
        detector.seed_baseline(MonitoredSignal::LatencyP99, 50.0);
        assert!(detector.evaluate(&window(200.0, 0.0, 10)).is_empty());
        assert_eq!(detector.config().latency_spike_factor, 10.0);
    }

    #[test]
    fn test_alert_serializes_type_field() {
        let detector = detector();
        detector.seed_baseline(MonitoredSignal::LatencyP99, 1.0);
        let alert = detector.evaluate(&window(10.0, 0.0, 1)).remove(0);
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "latency_spike");
        assert_eq!(json["severity"], "HIGH");
    }
}
