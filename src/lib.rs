//! Unified observability engine.
//!
//! An in-process engine for distributed tracing (W3C Trace Context), metrics
//! and log correlation, with head and tail sampling, golden signals, SLA
//! checks, EWMA anomaly detection and a service dependency graph.

// Core data path
pub mod buffer;
pub mod clock;
pub mod logs;
pub mod sampling;
pub mod store;
pub mod trace;

// Analysis and facade
pub mod analysis;
pub mod engine;

// Runtime surface
pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::EngineConfig;
pub use engine::{NoopTelemetry, ObservabilityEngine, TelemetrySink};
pub use lifecycle::Shutdown;
pub use logs::{LogLevel, LogRecord};
pub use trace::{SpanStatus, TraceContext};
