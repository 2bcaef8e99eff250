//! Criteria for searching completed traces.

use serde::Deserialize;

use crate::trace::Trace;

pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Filters applied to completed traces. Unset criteria match everything.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraceQuery {
    /// Minimum total duration in milliseconds (inclusive).
    pub min_duration_ms: Option<f64>,
    /// `Some(true)` keeps only traces with errors, `Some(false)` only clean ones.
    pub has_errors: Option<bool>,
    /// Exact root operation name.
    #[serde(alias = "operation")]
    pub operation_name: Option<String>,
    /// Maximum number of traces returned.
    pub limit: usize,
}

impl Default for TraceQuery {
    fn default() -> Self {
        Self {
            min_duration_ms: None,
            has_errors: None,
            operation_name: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl TraceQuery {
    pub fn matches(&self, trace: &Trace) -> bool {
        if let Some(min) = self.min_duration_ms {
            if trace.total_duration_ms < min {
                return false;
            }
        }
        if let Some(has_errors) = self.has_errors {
            if trace.has_errors() != has_errors {
                return false;
            }
        }
        if let Some(operation) = &self.operation_name {
            if &trace.operation_name != operation {
                return false;
            }
        }
        true
    }
}
