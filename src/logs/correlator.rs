//! Log correlator.
//!
//! # Responsibilities
//! - Keep a bounded ring of recent logs
//! - Index logs carrying a trace id so a trace can be shown with its logs
//! - Forget a trace's logs when the trace leaves history
//!
//! # Design Decisions
//! - Ring and index share one lock and one `Arc` per log line
//! - The index is bounded per trace and in number of traces, independently
//!   of the ring

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::buffer::{BoundedRing, TraceIndex};
use crate::clock::Clock;
use crate::config::BufferConfig;
use crate::logs::record::{CorrelatedLog, LogLevel, LogRecord};
use crate::observability::metrics;

#[derive(Debug)]
struct LogTables {
    recent: BoundedRing<Arc<CorrelatedLog>>,
    by_trace: TraceIndex<Arc<CorrelatedLog>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total_logs: u64,
    pub retained_logs: usize,
    pub capacity: usize,
    pub correlated_traces: usize,
}

pub struct LogCorrelator {
    tables: Mutex<LogTables>,
    clock: Arc<dyn Clock>,
    total: AtomicU64,
}

impl LogCorrelator {
    pub fn new(buffers: &BufferConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(LogTables {
                recent: BoundedRing::new(buffers.max_logs),
                by_trace: TraceIndex::new(buffers.max_correlated_traces, buffers.max_logs_per_trace),
            }),
            clock,
            total: AtomicU64::new(0),
        }
    }

    pub fn log(&self, record: LogRecord) {
        let level = record.level;
        let entry = Arc::new(CorrelatedLog::from_record(record, self.clock.now_ms()));

        {
            let mut tables = self.tables.lock();
            if let Some(trace_id) = entry.trace_id.as_deref() {
                tables.by_trace.insert(trace_id, Arc::clone(&entry));
            }
            tables.recent.push(entry);
        }

        self.total.fetch_add(1, Ordering::Relaxed);
        metrics::record_log(level.as_str());
    }

    /// Logs indexed under `trace_id`, oldest first.
    pub fn logs_for_trace(&self, trace_id: &str) -> Vec<CorrelatedLog> {
        self.tables
            .lock()
            .by_trace
            .get(trace_id)
            .map(|logs| logs.iter().map(|l| CorrelatedLog::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Up to `limit` logs at or above `min_level`, newest first.
    pub fn recent(&self, limit: usize, min_level: Option<LogLevel>) -> Vec<CorrelatedLog> {
        let min_level = min_level.unwrap_or(LogLevel::Trace);
        self.tables
            .lock()
            .recent
            .iter_newest()
            .filter(|l| l.level >= min_level)
            .take(limit)
            .map(|l| CorrelatedLog::clone(l))
            .collect()
    }

    pub fn forget_trace(&self, trace_id: &str) {
        if self.tables.lock().by_trace.remove(trace_id).is_some() {
            tracing::debug!(trace_id = trace_id, "Dropped log correlation entries");
        }
    }

    pub fn stats(&self) -> LogStats {
        let tables = self.tables.lock();
        LogStats {
            total_logs: self.total.load(Ordering::Relaxed),
            retained_logs: tables.recent.len(),
            capacity: tables.recent.capacity(),
            correlated_traces: tables.by_trace.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn correlator(max_logs: usize) -> (LogCorrelator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0.0));
        let buffers = BufferConfig {
            max_logs,
            max_logs_per_trace: 2,
            max_correlated_traces: 2,
            ..BufferConfig::default()
        };
        (LogCorrelator::new(&buffers, clock.clone()), clock)
    }

    #[test]
    fn test_recent_is_newest_first_and_filtered() {
        let (logs, clock) = correlator(10);
        for (level, msg) in [
            (LogLevel::Info, "a"),
            (LogLevel::Error, "b"),
            (LogLevel::Debug, "c"),
            (LogLevel::Critical, "d"),
        ] {
            clock.advance(1.0);
            logs.log(LogRecord::new(level, msg));
        }

        let all: Vec<String> = logs.recent(10, None).into_iter().map(|l| l.message).collect();
        assert_eq!(all, vec!["d", "c", "b", "a"]);

        let severe: Vec<String> = logs
            .recent(10, Some(LogLevel::Error))
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(severe, vec!["d", "b"]);

        assert_eq!(logs.recent(1, None)[0].timestamp_ms, 4.0);
    }

    #[test]
    fn test_ring_is_bounded() {
        let (logs, _) = correlator(3);
        for i in 0..5 {
            logs.log(LogRecord::new(LogLevel::Info, format!("m{i}")));
        }
        let stats = logs.stats();
        assert_eq!(stats.total_logs, 5);
        assert_eq!(stats.retained_logs, 3);
        assert_eq!(logs.recent(10, None).last().unwrap().message, "m2");
    }

    #[test]
    fn test_trace_index_is_bounded_per_trace() {
        let (logs, _) = correlator(10);
        for i in 0..3 {
            logs.log(LogRecord::new(LogLevel::Info, format!("m{i}")).in_span("t1", None));
        }
        let messages: Vec<String> = logs.logs_for_trace("t1").into_iter().map(|l| l.message).collect();
        assert_eq!(messages, vec!["m1", "m2"]);
    }

    #[test]
    fn test_trace_index_is_bounded_in_traces() {
        let (logs, _) = correlator(10);
        for trace in ["t1", "t2", "t3"] {
            logs.log(LogRecord::new(LogLevel::Info, "x").in_span(trace, None));
        }
        assert!(logs.logs_for_trace("t1").is_empty());
        assert_eq!(logs.logs_for_trace("t3").len(), 1);
        assert_eq!(logs.stats().correlated_traces, 2);
    }

    #[test]
    fn test_forget_trace_keeps_ring() {
        let (logs, _) = correlator(10);
        logs.log(LogRecord::new(LogLevel::Warn, "slow").in_span("t1", Some("s1")));
        logs.forget_trace("t1");

        assert!(logs.logs_for_trace("t1").is_empty());
        let recent = logs.recent(10, None);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].span_id.as_deref(), Some("s1"));
    }
}
