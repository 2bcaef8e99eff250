//! Self-observability of the engine process.
//!
//! # Data Flow
//! ```text
//! Engine subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape of the self-metrics exporter (optional)
//! ```
//!
//! # Design Decisions
//! - Kept separate from the telemetry the engine stores for its callers
//! - Metric updates are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
