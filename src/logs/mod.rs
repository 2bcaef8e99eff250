//! Log correlation subsystem.
//!
//! # Data Flow
//! ```text
//! log(LogRecord)
//!     → correlator.rs: timestamp, append to the bounded ring
//!     → correlator.rs: if trace_id is set, index under that trace
//!
//! trace dropped by tail sampling / evicted from history
//!     → forget_trace (index entries only; the ring keeps the line)
//! ```

pub mod correlator;
pub mod record;

pub use correlator::{LogCorrelator, LogStats};
pub use record::{CorrelatedLog, ExceptionInfo, LogLevel, LogRecord};
