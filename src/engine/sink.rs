//! Write-side telemetry interface.
//!
//! Instrumented code depends on `TelemetrySink` rather than on the engine, so
//! it can run with `NoopTelemetry` when no engine is wired in.

use crate::logs::LogRecord;
use crate::trace::{SpanStatus, TraceContext};

pub trait TelemetrySink: Send + Sync {
    fn start_trace(
        &self,
        operation: &str,
        parent: Option<&TraceContext>,
        tags: &[(&str, &str)],
    ) -> TraceContext;

    fn end_span(
        &self,
        span_id: &str,
        status: SpanStatus,
        error: Option<&str>,
        metrics: &[(&str, f64)],
    ) -> bool;

    fn add_span_event(&self, span_id: &str, name: &str, attributes: &[(&str, &str)]) -> bool;

    fn record_metric(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
        trace_id: Option<&str>,
        span_id: Option<&str>,
    );

    fn increment_counter(&self, name: &str, amount: f64, labels: &[(&str, &str)]);

    fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    fn log(&self, record: LogRecord);
}

/// Discards everything. Contexts are still minted so propagation keeps working.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn start_trace(
        &self,
        _operation: &str,
        parent: Option<&TraceContext>,
        _tags: &[(&str, &str)],
    ) -> TraceContext {
        match parent {
            Some(parent) => parent.child(),
            None => TraceContext::new_root(false),
        }
    }

    fn end_span(&self, _: &str, _: SpanStatus, _: Option<&str>, _: &[(&str, f64)]) -> bool {
        false
    }

    fn add_span_event(&self, _: &str, _: &str, _: &[(&str, &str)]) -> bool {
        false
    }

    fn record_metric(&self, _: &str, _: f64, _: &[(&str, &str)], _: Option<&str>, _: Option<&str>) {}

    fn increment_counter(&self, _: &str, _: f64, _: &[(&str, &str)]) {}

    fn set_gauge(&self, _: &str, _: f64, _: &[(&str, &str)]) {}

    fn log(&self, _: LogRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_still_propagates() {
        let sink: &dyn TelemetrySink = &NoopTelemetry;
        let root = sink.start_trace("op", None, &[]);
        let child = sink.start_trace("child", Some(&root), &[]);

        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert!(!sink.end_span(&child.span_id, SpanStatus::Ok, None, &[]));
    }
}
