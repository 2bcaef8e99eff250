//! Read-only admin HTTP API over a running engine.
//!
//! # Routes
//! ```text
//! GET  /metrics                       counters and gauges, text exposition
//! GET  /api/status                    version and liveness
//! GET  /api/stats                     engine statistics
//! GET  /api/traces                    ?min_duration_ms= &has_errors= &operation= &limit=
//! GET  /api/traces/{trace_id}         trace with correlated logs and metrics
//! GET  /api/golden-signals            ?window= (seconds)
//! GET  /api/sla                       ?window= (seconds)
//! GET  /api/anomalies                 ?active=true for unresolved only
//! POST /api/anomalies/{id}/resolve
//! GET  /api/dependencies              service → services
//! GET  /api/logs                      ?limit= &level=
//! ```

pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::engine::ObservabilityEngine;

pub use server::{AdminServer, ServerError};

/// Admin routes without middleware.
pub fn router(engine: Arc<ObservabilityEngine>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/api/status", get(get_status))
        .route("/api/stats", get(get_stats))
        .route("/api/traces", get(list_traces))
        .route("/api/traces/{trace_id}", get(get_trace))
        .route("/api/golden-signals", get(get_golden_signals))
        .route("/api/sla", get(get_sla))
        .route("/api/anomalies", get(list_anomalies))
        .route("/api/anomalies/{id}/resolve", post(resolve_anomaly))
        .route("/api/dependencies", get(get_dependencies))
        .route("/api/logs", get(list_logs))
        .with_state(AdminState { engine })
}
