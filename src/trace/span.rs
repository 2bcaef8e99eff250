//! Span records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::trace::context::TraceContext;

/// Tag read by the dependency graph to attribute a span to a service.
pub const SERVICE_NAME_TAG: &str = "service.name";

/// Tag holding the error message passed to `end_span`.
pub const ERROR_MESSAGE_TAG: &str = "error.message";

/// Outcome of a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    #[default]
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::Error => "error",
        }
    }
}

/// A timestamped annotation on a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub timestamp_ms: f64,
    pub name: String,
    pub attributes: HashMap<String, String>,
}

/// A single timed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    /// `service.name` tag if present, otherwise the engine's default service.
    pub service_name: String,
    pub start_time_ms: f64,
    pub end_time_ms: Option<f64>,
    pub duration_ms: Option<f64>,
    pub status: SpanStatus,
    pub tags: HashMap<String, String>,
    pub events: Vec<SpanEvent>,
    pub metrics: HashMap<String, f64>,
}

impl Span {
    pub(crate) fn start(
        ctx: &TraceContext,
        operation_name: &str,
        tags: &[(&str, &str)],
        default_service: &str,
        now_ms: f64,
    ) -> Self {
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let service_name = tags
            .get(SERVICE_NAME_TAG)
            .cloned()
            .unwrap_or_else(|| default_service.to_string());

        Self {
            trace_id: ctx.trace_id.clone(),
            span_id: ctx.span_id.clone(),
            parent_span_id: ctx.parent_span_id.clone(),
            operation_name: operation_name.to_string(),
            service_name,
            start_time_ms: now_ms,
            end_time_ms: None,
            duration_ms: None,
            status: SpanStatus::Ok,
            tags,
            events: Vec::new(),
            metrics: HashMap::new(),
        }
    }

    /// The `service.name` tag, if the caller set one.
    pub fn service_tag(&self) -> Option<&str> {
        self.tags.get(SERVICE_NAME_TAG).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.status == SpanStatus::Error
    }

    pub(crate) fn finish(
        &mut self,
        now_ms: f64,
        status: SpanStatus,
        error: Option<&str>,
        metrics: &[(&str, f64)],
    ) {
        self.end_time_ms = Some(now_ms);
        // Clock steps backwards must not produce negative durations
        self.duration_ms = Some((now_ms - self.start_time_ms).max(0.0));
        self.status = status;

        if let Some(message) = error {
            self.status = SpanStatus::Error;
            self.tags
                .insert(ERROR_MESSAGE_TAG.to_string(), message.to_string());
        }

        for (name, value) in metrics {
            self.metrics.insert(name.to_string(), *value);
        }
    }

    pub(crate) fn push_event(&mut self, now_ms: f64, name: &str, attributes: &[(&str, &str)]) {
        self.events.push(SpanEvent {
            timestamp_ms: now_ms,
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_from_tag() {
        let ctx = TraceContext::new_root(true);
        let span = Span::start(&ctx, "GET /users", &[("service.name", "api")], "default", 0.0);
        assert_eq!(span.service_name, "api");
        assert_eq!(span.service_tag(), Some("api"));

        let untagged = Span::start(&ctx, "GET /users", &[], "default", 0.0);
        assert_eq!(untagged.service_name, "default");
        assert_eq!(untagged.service_tag(), None);
    }

    #[test]
    fn test_finish_computes_duration_and_merges_metrics() {
        let ctx = TraceContext::new_root(true);
        let mut span = Span::start(&ctx, "query", &[], "db", 100.0);
        span.finish(142.5, SpanStatus::Ok, None, &[("rows", 12.0)]);

        assert_eq!(span.end_time_ms, Some(142.5));
        assert_eq!(span.duration_ms, Some(42.5));
        assert_eq!(span.metrics["rows"], 12.0);
        assert_eq!(span.status, SpanStatus::Ok);
    }

    #[test]
    fn test_error_message_forces_error_status() {
        let ctx = TraceContext::new_root(true);
        let mut span = Span::start(&ctx, "call", &[], "svc", 10.0);
        span.finish(5.0, SpanStatus::Ok, Some("boom"), &[]);

        assert!(span.is_error());
        assert_eq!(span.tags[ERROR_MESSAGE_TAG], "boom");
        assert_eq!(span.duration_ms, Some(0.0));
    }
}
