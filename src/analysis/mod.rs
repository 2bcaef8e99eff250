//! Analysis over retained telemetry.
//!
//! # Data Flow
//! ```text
//! completed traces in window ──▶ golden.rs (latency, traffic, errors, saturation)
//!                                    │            └─▶ SlaReport
//!                                    ▼
//!                               anomaly.rs (EWMA baselines → alerts)
//!                                    ▲
//! monitor.rs (interval ticker) ──────┘
//!
//! retained trace ──▶ dependency.rs (service → service edges)
//! ```

pub mod anomaly;
pub mod dependency;
pub mod golden;
pub mod monitor;

pub use anomaly::{AnomalyAlert, AnomalyDetector, AnomalyKind, MonitoredSignal, Severity};
pub use dependency::{DependencyGraph, ServiceDependencies};
pub use golden::{
    ErrorSignal, GoldenSignals, LatencySignal, SaturationSignal, SlaReport, TrafficSignal,
};
pub use monitor::AnalysisMonitor;
