//! Log record types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trace::TraceContext;

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured exception attached to a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub stack_trace: Option<String>,
}

impl ExceptionInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }
}

/// A log line as submitted by a caller.
///
/// ```text
/// LogRecord::new(LogLevel::Error, "payment declined")
///     .with_context("order_id", "o-17")
///     .with_trace(&ctx)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: BTreeMap<String, String>,
    pub exception: Option<ExceptionInfo>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: BTreeMap::new(),
            exception: None,
            trace_id: None,
            span_id: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Link to an explicit trace and optional span.
    pub fn in_span(mut self, trace_id: impl Into<String>, span_id: Option<&str>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = span_id.map(str::to_string);
        self
    }

    /// Link to the span identified by `ctx`.
    pub fn with_trace(self, ctx: &TraceContext) -> Self {
        let span_id = ctx.span_id.clone();
        self.in_span(ctx.trace_id.clone(), Some(&span_id))
    }
}

/// A stored log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedLog {
    pub timestamp_ms: f64,
    pub level: LogLevel,
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub context: BTreeMap<String, String>,
    pub exception: Option<ExceptionInfo>,
}

impl CorrelatedLog {
    pub(crate) fn from_record(record: LogRecord, timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            level: record.level,
            message: record.message,
            trace_id: record.trace_id,
            span_id: record.span_id,
            context: record.context,
            exception: record.exception,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
        let level: LogLevel = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(level, LogLevel::Critical);
    }

    #[test]
    fn test_builder_links_trace() {
        let ctx = TraceContext::new_root(true);
        let record = LogRecord::new(LogLevel::Info, "hello")
            .with_context("user", "42")
            .with_trace(&ctx);

        assert_eq!(record.trace_id.as_deref(), Some(ctx.trace_id.as_str()));
        assert_eq!(record.span_id.as_deref(), Some(ctx.span_id.as_str()));
        assert_eq!(record.context["user"], "42");
    }

    #[test]
    fn test_exception_type_field_name() {
        let exception = ExceptionInfo::new("TimeoutError", "upstream timed out")
            .with_stack_trace("at call()");
        let json = serde_json::to_value(&exception).unwrap();
        assert_eq!(json["type"], "TimeoutError");
        assert_eq!(json["stack_trace"], "at call()");
    }
}
