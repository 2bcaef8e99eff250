//! Observability engine service.
//!
//! Runs one engine instance with its periodic anomaly detection and a
//! read-only admin API, reloading policy from the config file on change.
//!
//! ```text
//!   instrumented code ──▶ ┌──────────────────────────────┐ ◀── admin API (axum)
//!   (TelemetrySink)       │      ObservabilityEngine     │
//!                         │ traces │ metrics │ logs      │ ◀── AnalysisMonitor
//!                         └──────────────────────────────┘      (interval)
//!                                        ▲
//!                         config file ───┘ notify → apply_config
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use observability_engine::admin::AdminServer;
use observability_engine::analysis::AnalysisMonitor;
use observability_engine::config::{load_config, watcher::ConfigWatcher, EngineConfig};
use observability_engine::lifecycle::{shutdown_signal, Shutdown};
use observability_engine::observability::{logging, metrics};
use observability_engine::ObservabilityEngine;

#[derive(Parser)]
#[command(name = "observability-engine")]
#[command(about = "In-process tracing, metrics and log correlation engine", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service_name = %config.service_name,
        config_file = ?cli.config,
        "observability-engine starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let engine = Arc::new(ObservabilityEngine::new(config.clone()));
    let shutdown = Arc::new(Shutdown::new());
    let mut tasks = Vec::new();

    let monitor = AnalysisMonitor::new(Arc::clone(&engine));
    tasks.push(tokio::spawn(monitor.run(shutdown.subscribe())));

    // Dropping the watcher stops notifications, so it lives until main returns
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let engine = Arc::clone(&engine);
            let mut stop = shutdown.subscribe();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        update = updates.recv() => match update {
                            Some(new_config) => engine.apply_config(&new_config),
                            None => break,
                        },
                        _ = stop.recv() => break,
                    }
                }
            }));
            Some(watcher)
        }
        None => None,
    };

    let admin = if config.admin.enabled {
        let server = AdminServer::new(Arc::clone(&engine), config.admin.clone());
        let listener = server.bind().await?;
        Some(tokio::spawn(server.run(listener, shutdown.subscribe())))
    } else {
        tracing::info!("Admin API disabled");
        None
    };

    shutdown_signal().await;
    shutdown.trigger();

    if let Some(admin) = admin {
        match admin.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin server failed"),
            Err(e) => tracing::error!(error = %e, "Admin server task panicked"),
            Ok(Ok(())) => {}
        }
    }
    for task in tasks {
        let _ = task.await;
    }

    let stats = engine.get_statistics();
    tracing::info!(
        spans_started = stats.traces.spans_started,
        traces_retained = stats.traces.traces_retained,
        logs = stats.logs.total_logs,
        "Shutdown complete"
    );
    Ok(())
}
