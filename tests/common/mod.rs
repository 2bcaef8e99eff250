//! Shared utilities for integration testing.

use std::sync::Arc;

use observability_engine::clock::ManualClock;
use observability_engine::{EngineConfig, ObservabilityEngine, SpanStatus, TraceContext};

pub const START_MS: f64 = 1_700_000_000_000.0;

/// An engine on a manual clock, keeping every ordinary trace.
pub fn engine() -> (Arc<ObservabilityEngine>, Arc<ManualClock>) {
    engine_with(|config| config.sampling.sample_rate = 1.0)
}

/// An engine on a manual clock with a tweaked default config.
pub fn engine_with(
    tweak: impl FnOnce(&mut EngineConfig),
) -> (Arc<ObservabilityEngine>, Arc<ManualClock>) {
    let mut config = EngineConfig::default();
    tweak(&mut config);
    let clock = Arc::new(ManualClock::new(START_MS));
    let engine = Arc::new(ObservabilityEngine::with_clock(config, clock.clone()));
    (engine, clock)
}

/// Run a single-span trace lasting `duration_ms`.
pub fn run_trace(
    engine: &ObservabilityEngine,
    clock: &ManualClock,
    operation: &str,
    duration_ms: f64,
    status: SpanStatus,
) -> TraceContext {
    let ctx = engine.start_trace(operation, None, &[]);
    clock.advance(duration_ms);
    engine.end_span(&ctx.span_id, status, None, &[]);
    ctx
}
