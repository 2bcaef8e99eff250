use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnomalyAlert, GoldenSignals, ServiceDependencies, SlaReport};
use crate::engine::{CorrelatedTrace, EngineStatistics, ObservabilityEngine};
use crate::logs::{CorrelatedLog, LogLevel};
use crate::trace::{Trace, TraceQuery};

const DEFAULT_LOG_LIMIT: usize = 100;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<ObservabilityEngine>,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub service_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    /// Seconds; defaults to the anomaly window.
    pub window: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertParams {
    /// Only unresolved alerts.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
    pub limit: Option<usize>,
    pub level: Option<LogLevel>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        service_name: state.engine.service_name().to_string(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.engine.export_prometheus_metrics(),
    )
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<EngineStatistics> {
    Json(state.engine.get_statistics())
}

pub async fn list_traces(
    State(state): State<AdminState>,
    Query(query): Query<TraceQuery>,
) -> Json<Vec<Trace>> {
    Json(state.engine.find_traces_by_criteria(&query))
}

pub async fn get_trace(
    State(state): State<AdminState>,
    Path(trace_id): Path<String>,
) -> Result<Json<CorrelatedTrace>, StatusCode> {
    state
        .engine
        .get_trace_with_correlation(&trace_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

fn window_or_default(state: &AdminState, params: &WindowParams) -> u64 {
    params
        .window
        .unwrap_or_else(|| state.engine.anomaly_config().window_secs)
}

pub async fn get_golden_signals(
    State(state): State<AdminState>,
    Query(params): Query<WindowParams>,
) -> Json<GoldenSignals> {
    let window = window_or_default(&state, &params);
    Json(state.engine.get_golden_signals(window))
}

pub async fn get_sla(
    State(state): State<AdminState>,
    Query(params): Query<WindowParams>,
) -> Json<SlaReport> {
    let window = window_or_default(&state, &params);
    Json(state.engine.check_sla(window))
}

pub async fn list_anomalies(
    State(state): State<AdminState>,
    Query(params): Query<AlertParams>,
) -> Json<Vec<AnomalyAlert>> {
    if params.active {
        Json(state.engine.active_alerts())
    } else {
        Json(state.engine.alerts())
    }
}

pub async fn resolve_anomaly(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.engine.resolve_alert(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn get_dependencies(State(state): State<AdminState>) -> Json<ServiceDependencies> {
    Json(state.engine.get_service_dependencies())
}

pub async fn list_logs(
    State(state): State<AdminState>,
    Query(params): Query<LogParams>,
) -> Json<Vec<CorrelatedLog>> {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Json(state.engine.recent_logs(limit, params.level))
}
