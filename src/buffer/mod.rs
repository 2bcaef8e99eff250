//! Capacity-bounded history buffers.
//!
//! # Data Flow
//! ```text
//! completed traces ──▶ ring.rs (BoundedRing<Trace>)
//! raw metric values ──▶ ring.rs (BoundedRing<f64>, one per series)
//! logs, alerts ──────▶ ring.rs
//!
//! logs/metrics tagged with a trace_id ──▶ trace_index.rs (TraceIndex<T>)
//! ```
//!
//! # Design Decisions
//! - FIFO eviction is the only resource-control mechanism
//! - Inserting past capacity hands the evicted entry back to the caller so
//!   dependent indices can be cleaned up in the same critical section

pub mod ring;
pub mod trace_index;

pub use ring::BoundedRing;
pub use trace_index::TraceIndex;
