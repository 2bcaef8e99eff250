//! Distributed tracing subsystem.
//!
//! # Data Flow
//! ```text
//! incoming headers ──▶ context.rs (TraceContext::from_headers)
//!                           │
//! start_trace ─────────▶ recorder.rs ──▶ active spans / active traces
//!                           │
//! end_span (child) ────▶ span.rs (finish) ──▶ appended to its Trace
//! end_span (root) ─────▶ model.rs (finalize, critical path)
//!                           → sampling (tail decision)
//!                           → completed ring + dependency graph
//!
//! find_traces_by_criteria ──▶ query.rs (TraceQuery) over the completed ring
//! ```

pub mod context;
pub mod model;
pub mod query;
pub mod recorder;
pub mod span;

pub use context::{TraceContext, TRACEPARENT_HEADER, TRACESTATE_HEADER};
pub use model::{critical_path, Trace, TraceDigest};
pub use query::TraceQuery;
pub use recorder::{Finalization, RecorderStats, SpanEnd, TraceRecorder};
pub use span::{Span, SpanEvent, SpanStatus, ERROR_MESSAGE_TAG, SERVICE_NAME_TAG};
