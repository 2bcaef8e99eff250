//! Sampling subsystem.
//!
//! # Data Flow
//! ```text
//! start_trace (no parent)
//!     → head_decision: random() < sample_rate
//!     → carried in TraceContext.sampled, propagated downstream
//!
//! root span ends
//!     → tail_decision:
//!         error_count > 0                        → keep
//!         total_duration > 2 × sla_target        → keep
//!         random() < sample_rate                 → keep
//!         otherwise                              → drop
//! ```
//!
//! # Design Decisions
//! - The two decisions are independent; head governs propagation, tail
//!   governs local retention
//! - Error and slow traces survive regardless of the head outcome
//! - Stateless apart from the swappable config, so concurrent finalizations
//!   need no coordination

pub mod sampler;

pub use sampler::{Sampler, TailDecision};
