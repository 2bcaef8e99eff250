//! Span recorder and trace aggregator.
//!
//! # Responsibilities
//! - Mint contexts and open spans (active-span table)
//! - Group ended spans into their trace (active-trace table)
//! - Finalize a trace exactly once when its root span ends
//! - Apply tail sampling and keep retained traces in the bounded ring
//! - Feed retained traces to the dependency graph
//!
//! # Design Decisions
//! - One lock guards both tables and the ring so a trace moves from active to
//!   completed atomically
//! - Unknown or already-ended span ids are a normal branch, not an error
//! - A span whose parent context belongs to a trace that is not active here
//!   (remote parent) opens a local trace rooted at that span
//! - Spans that are never ended stay in the active table until restart

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::analysis::dependency::DependencyGraph;
use crate::buffer::BoundedRing;
use crate::clock::Clock;
use crate::observability::metrics;
use crate::sampling::{Sampler, TailDecision};
use crate::trace::context::{generate_span_id, TraceContext};
use crate::trace::model::{Trace, TraceDigest};
use crate::trace::query::TraceQuery;
use crate::trace::span::{Span, SpanStatus};

#[derive(Debug)]
struct TraceTables {
    active_spans: HashMap<String, Span>,
    active_traces: HashMap<String, Trace>,
    completed: BoundedRing<Trace>,
}

/// Result of ending a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEnd {
    /// The id was unknown or the span had already ended.
    Unknown,
    /// The span ended; its trace is still open (or already gone).
    Ended,
    /// The span was its trace's root and the trace was finalized.
    Finalized(Finalization),
}

/// What happened to a trace when its root span ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    pub trace_id: String,
    pub decision: TailDecision,
    /// Trace pushed out of the completed ring to make room, if any.
    pub evicted_trace_id: Option<String>,
}

/// Lifetime counters, readable without taking the table lock.
#[derive(Debug, Default)]
struct RecorderCounters {
    spans_started: AtomicU64,
    spans_ended: AtomicU64,
    late_spans: AtomicU64,
    traces_retained: AtomicU64,
    traces_dropped: AtomicU64,
    traces_evicted: AtomicU64,
}

/// Point-in-time view of the recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecorderStats {
    pub active_spans: usize,
    pub active_traces: usize,
    pub completed_traces: usize,
    pub completed_capacity: usize,
    pub spans_started: u64,
    pub spans_ended: u64,
    pub late_spans: u64,
    pub traces_retained: u64,
    pub traces_dropped: u64,
    pub traces_evicted: u64,
}

pub struct TraceRecorder {
    tables: Mutex<TraceTables>,
    sampler: Arc<Sampler>,
    dependencies: Arc<DependencyGraph>,
    clock: Arc<dyn Clock>,
    default_service: String,
    counters: RecorderCounters,
}

impl TraceRecorder {
    pub fn new(
        max_completed_traces: usize,
        sampler: Arc<Sampler>,
        dependencies: Arc<DependencyGraph>,
        clock: Arc<dyn Clock>,
        default_service: impl Into<String>,
    ) -> Self {
        Self {
            tables: Mutex::new(TraceTables {
                active_spans: HashMap::new(),
                active_traces: HashMap::new(),
                completed: BoundedRing::new(max_completed_traces),
            }),
            sampler,
            dependencies,
            clock,
            default_service: default_service.into(),
            counters: RecorderCounters::default(),
        }
    }

    /// Open a span, starting a new trace unless `parent` continues one.
    pub fn start_span(
        &self,
        operation: &str,
        parent: Option<&TraceContext>,
        tags: &[(&str, &str)],
    ) -> TraceContext {
        let mut ctx = match parent {
            Some(parent) => parent.child(),
            None => TraceContext::new_root(self.sampler.head_decision()),
        };
        let now = self.clock.now_ms();

        let mut tables = self.tables.lock();
        while tables.active_spans.contains_key(&ctx.span_id) {
            ctx.span_id = generate_span_id();
        }

        let span = Span::start(&ctx, operation, tags, &self.default_service, now);
        if !tables.active_traces.contains_key(&ctx.trace_id) {
            tracing::debug!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                operation = operation,
                remote_parent = ctx.parent_span_id.is_some(),
                "Trace opened"
            );
            tables
                .active_traces
                .insert(ctx.trace_id.clone(), Trace::open(&span, ctx.sampled));
        }
        tables.active_spans.insert(ctx.span_id.clone(), span);
        metrics::record_active(tables.active_traces.len(), tables.active_spans.len());
        drop(tables);

        self.counters.spans_started.fetch_add(1, Ordering::Relaxed);
        metrics::record_span_started();
        ctx
    }

    /// End a span. Unknown and already-ended ids are ignored.
    pub fn end_span(
        &self,
        span_id: &str,
        status: SpanStatus,
        error: Option<&str>,
        span_metrics: &[(&str, f64)],
    ) -> SpanEnd {
        let now = self.clock.now_ms();
        let mut tables = self.tables.lock();

        let Some(mut span) = tables.active_spans.remove(span_id) else {
            tracing::debug!(span_id = span_id, "end_span for unknown or ended span ignored");
            return SpanEnd::Unknown;
        };
        span.finish(now, status, error, span_metrics);
        self.counters.spans_ended.fetch_add(1, Ordering::Relaxed);
        metrics::record_span_ended(span.status.as_str());

        let trace_id = span.trace_id.clone();
        let is_root = match tables.active_traces.get_mut(&trace_id) {
            Some(trace) => {
                let is_root = trace.root_span_id == span.span_id;
                trace.push_span(span);
                is_root
            }
            None => {
                self.counters.late_spans.fetch_add(1, Ordering::Relaxed);
                metrics::record_late_span();
                tracing::debug!(
                    trace_id = %trace_id,
                    span_id = span_id,
                    "Span ended after its trace finalized, dropped"
                );
                return SpanEnd::Ended;
            }
        };

        if !is_root {
            return SpanEnd::Ended;
        }

        let Some(mut trace) = tables.active_traces.remove(&trace_id) else {
            return SpanEnd::Ended;
        };
        trace.finalize();

        let decision = self.sampler.tail_decision(&trace);
        metrics::record_trace_finalized(decision.as_str());
        tracing::debug!(
            trace_id = %trace_id,
            duration_ms = trace.total_duration_ms,
            errors = trace.error_count,
            spans = trace.spans.len(),
            decision = decision.as_str(),
            "Trace finalized"
        );

        let mut evicted_trace_id = None;
        if decision.is_retained() {
            self.dependencies.observe(&trace);
            if let Some(evicted) = tables.completed.push(trace) {
                self.counters.traces_evicted.fetch_add(1, Ordering::Relaxed);
                metrics::record_trace_evicted();
                evicted_trace_id = Some(evicted.trace_id);
            }
            self.counters.traces_retained.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.traces_dropped.fetch_add(1, Ordering::Relaxed);
        }
        metrics::record_active(tables.active_traces.len(), tables.active_spans.len());

        SpanEnd::Finalized(Finalization {
            trace_id,
            decision,
            evicted_trace_id,
        })
    }

    /// Append an event to a span that is still active.
    pub fn add_event(&self, span_id: &str, name: &str, attributes: &[(&str, &str)]) -> bool {
        let now = self.clock.now_ms();
        let mut tables = self.tables.lock();
        match tables.active_spans.get_mut(span_id) {
            Some(span) => {
                span.push_event(now, name, attributes);
                true
            }
            None => false,
        }
    }

    /// Newest completed trace with this id.
    pub fn completed_trace(&self, trace_id: &str) -> Option<Trace> {
        self.tables
            .lock()
            .completed
            .iter_newest()
            .find(|t| t.trace_id == trace_id)
            .cloned()
    }

    /// Snapshot of a trace that has not finalized yet.
    pub fn active_trace(&self, trace_id: &str) -> Option<Trace> {
        self.tables.lock().active_traces.get(trace_id).cloned()
    }

    /// Completed traces matching `query`, newest first.
    pub fn find(&self, query: &TraceQuery) -> Vec<Trace> {
        self.tables
            .lock()
            .completed
            .iter_newest()
            .filter(|t| query.matches(t))
            .take(query.limit)
            .cloned()
            .collect()
    }

    /// Completed traces that started at or after `since_ms`.
    pub fn digests_since(&self, since_ms: f64) -> Vec<TraceDigest> {
        self.tables
            .lock()
            .completed
            .iter()
            .filter(|t| t.start_time_ms >= since_ms)
            .map(TraceDigest::from)
            .collect()
    }

    /// `(active traces, active spans)`.
    pub fn active_counts(&self) -> (usize, usize) {
        let tables = self.tables.lock();
        (tables.active_traces.len(), tables.active_spans.len())
    }

    pub fn stats(&self) -> RecorderStats {
        let tables = self.tables.lock();
        RecorderStats {
            active_spans: tables.active_spans.len(),
            active_traces: tables.active_traces.len(),
            completed_traces: tables.completed.len(),
            completed_capacity: tables.completed.capacity(),
            spans_started: self.counters.spans_started.load(Ordering::Relaxed),
            spans_ended: self.counters.spans_ended.load(Ordering::Relaxed),
            late_spans: self.counters.late_spans.load(Ordering::Relaxed),
            traces_retained: self.counters.traces_retained.load(Ordering::Relaxed),
            traces_dropped: self.counters.traces_dropped.load(Ordering::Relaxed),
            traces_evicted: self.counters.traces_evicted.load(Ordering::Relaxed),
        }
    }
}
