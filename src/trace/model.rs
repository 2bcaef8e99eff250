//! Trace aggregation and critical path.
//!
//! # Critical Path
//! The critical path is approximated as the single longest span in the trace.
//! Overlapping concurrent children are not merged into an interval schedule,
//! so for fan-out requests this is the slowest branch, not the exact path.

use serde::{Deserialize, Serialize};

use crate::trace::span::Span;

/// All locally recorded spans sharing one trace_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: String,
    /// The span that opened this trace locally; its end finalizes the trace.
    pub root_span_id: String,
    /// Root operation, used for querying.
    pub operation_name: String,
    pub service_name: String,
    pub start_time_ms: f64,
    pub end_time_ms: Option<f64>,
    /// Head sampling decision carried in the propagated context.
    pub sampled: bool,
    /// Ended spans, in end order. The root span is last.
    pub spans: Vec<Span>,
    pub total_duration_ms: f64,
    pub error_count: usize,
    pub critical_path_ms: f64,
    pub bottleneck_span_id: Option<String>,
}

impl Trace {
    pub(crate) fn open(root: &Span, sampled: bool) -> Self {
        Self {
            trace_id: root.trace_id.clone(),
            root_span_id: root.span_id.clone(),
            operation_name: root.operation_name.clone(),
            service_name: root.service_name.clone(),
            start_time_ms: root.start_time_ms,
            end_time_ms: None,
            sampled,
            spans: Vec::new(),
            total_duration_ms: 0.0,
            error_count: 0,
            critical_path_ms: 0.0,
            bottleneck_span_id: None,
        }
    }

    pub(crate) fn push_span(&mut self, span: Span) {
        if span.is_error() {
            self.error_count += 1;
        }
        self.spans.push(span);
    }

    /// Compute derived fields once the root span has been pushed.
    pub(crate) fn finalize(&mut self) {
        if let Some((end, duration)) = self.root().map(|r| (r.end_time_ms, r.duration_ms)) {
            self.end_time_ms = end;
            self.total_duration_ms = duration.unwrap_or_default();
        }
        let longest = critical_path(&self.spans).map(|(id, d)| (id.to_string(), d));
        if let Some((span_id, duration)) = longest {
            self.bottleneck_span_id = Some(span_id);
            self.critical_path_ms = duration;
        }
    }

    pub fn root(&self) -> Option<&Span> {
        self.spans.iter().find(|s| s.span_id == self.root_span_id)
    }

    pub fn span(&self, span_id: &str) -> Option<&Span> {
        self.spans.iter().find(|s| s.span_id == span_id)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// The longest ended span and its duration.
pub fn critical_path(spans: &[Span]) -> Option<(&str, f64)> {
    spans
        .iter()
        .filter_map(|s| s.duration_ms.map(|d| (s.span_id.as_str(), d)))
        .fold(None, |best, (id, d)| match best {
            Some((_, best_d)) if best_d >= d => best,
            _ => Some((id, d)),
        })
}

/// The fields of a completed trace needed for windowed analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceDigest {
    pub start_time_ms: f64,
    pub total_duration_ms: f64,
    pub error_count: usize,
}

impl From<&Trace> for TraceDigest {
    fn from(trace: &Trace) -> Self {
        Self {
            start_time_ms: trace.start_time_ms,
            total_duration_ms: trace.total_duration_ms,
            error_count: trace.error_count,
        }
    }
}
