//! Admin HTTP API tests, driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use observability_engine::admin::router;
use observability_engine::analysis::MonitoredSignal;
use observability_engine::{LogLevel, LogRecord, SpanStatus};

mod common;

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, "GET", uri).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (engine, _) = common::engine();
    engine.increment_counter("jobs_total", 3.0, &[("queue", "email")]);
    engine.set_gauge("workers", 4.0, &[]);

    let (status, body) = send(router(engine), "GET", "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "jobs_total{queue=\"email\"} 3\nworkers 4\n"
    );
}

#[tokio::test]
async fn test_trace_listing_and_lookup() {
    let (engine, clock) = common::engine();
    common::run_trace(&engine, &clock, "GET /", 10.0, SpanStatus::Ok);
    let slow = common::run_trace(&engine, &clock, "GET /report", 900.0, SpanStatus::Ok);
    engine.log(LogRecord::new(LogLevel::Info, "late note").with_trace(&slow));

    let (status, traces) = get_json(router(engine.clone()), "/api/traces?min_duration_ms=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(traces.as_array().unwrap().len(), 1);
    assert_eq!(traces[0]["operation_name"], "GET /report");

    let (_, by_operation) = get_json(router(engine.clone()), "/api/traces?operation=GET%20/&limit=5").await;
    assert_eq!(by_operation.as_array().unwrap().len(), 1);

    let uri = format!("/api/traces/{}", slow.trace_id);
    let (status, correlated) = get_json(router(engine.clone()), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(correlated["trace"]["total_duration_ms"], 900.0);
    assert_eq!(correlated["in_progress"], false);
    assert_eq!(correlated["logs"][0]["message"], "late note");

    let (status, _) = get_json(router(engine), "/api/traces/0af7651916cd43dd8448eb211c80319c").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_golden_signals_and_sla() {
    let (engine, clock) = common::engine();
    common::run_trace(&engine, &clock, "op", 40.0, SpanStatus::Ok);
    common::run_trace(&engine, &clock, "op", 60.0, SpanStatus::Error);

    let (status, signals) = get_json(router(engine.clone()), "/api/golden-signals?window=60").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signals["window_seconds"], 60);
    assert_eq!(signals["traffic"]["request_count"], 2);
    assert_eq!(signals["errors"]["error_rate"], 0.5);
    assert!(signals["latency"]["p99.9"].is_number());

    let (_, sla) = get_json(router(engine), "/api/sla").await;
    assert_eq!(sla["window_seconds"], 300);
    assert_eq!(sla["latency_compliant"], true);
    assert_eq!(sla["error_rate_compliant"], false);
    assert_eq!(sla["overall_compliant"], false);
}

#[tokio::test]
async fn test_anomaly_listing_and_resolution() {
    let (engine, clock) = common::engine();
    engine.anomaly_detector().seed_baseline(MonitoredSignal::LatencyP99, 10.0);
    common::run_trace(&engine, &clock, "op", 500.0, SpanStatus::Ok);
    let alert = engine.detect_anomalies().remove(0);

    let (_, alerts) = get_json(router(engine.clone()), "/api/anomalies?active=true").await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["type"], "latency_spike");

    let uri = format!("/api/anomalies/{}/resolve", alert.id);
    let (status, _) = send(router(engine.clone()), "POST", &uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        router(engine.clone()),
        "POST",
        "/api/anomalies/00000000-0000-4000-8000-000000000000/resolve",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, active) = get_json(router(engine.clone()), "/api/anomalies?active=true").await;
    assert!(active.as_array().unwrap().is_empty());
    let (_, all) = get_json(router(engine), "/api/anomalies").await;
    assert_eq!(all[0]["resolved"], true);
}

#[tokio::test]
async fn test_logs_stats_and_dependencies() {
    let (engine, clock) = common::engine();
    engine.log(LogRecord::new(LogLevel::Debug, "noise"));
    engine.log(LogRecord::new(LogLevel::Error, "disk full"));
    common::run_trace(&engine, &clock, "op", 1.0, SpanStatus::Ok);

    let (_, logs) = get_json(router(engine.clone()), "/api/logs?limit=10&level=WARN").await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["level"], "ERROR");

    let (_, stats) = get_json(router(engine.clone()), "/api/stats").await;
    assert_eq!(stats["traces"]["traces_retained"], 1);
    assert_eq!(stats["logs"]["total_logs"], 2);

    let (status, deps) = get_json(router(engine.clone()), "/api/dependencies").await;
    assert_eq!(status, StatusCode::OK);
    assert!(deps.as_object().unwrap().is_empty());

    let (_, status_body) = get_json(router(engine), "/api/status").await;
    assert_eq!(status_body["status"], "operational");
}
