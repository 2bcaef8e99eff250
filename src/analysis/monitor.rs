//! Periodic anomaly detection.
//!
//! # Responsibilities
//! - Run `detect_anomalies` on a fixed interval
//! - Stop cleanly on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::engine::ObservabilityEngine;

pub struct AnalysisMonitor {
    engine: Arc<ObservabilityEngine>,
    interval: Duration,
    enabled: bool,
}

impl AnalysisMonitor {
    pub fn new(engine: Arc<ObservabilityEngine>) -> Self {
        let config = engine.anomaly_config();
        Self {
            interval: Duration::from_secs(config.interval_secs.max(1)),
            enabled: config.enabled,
            engine,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            tracing::info!("Periodic anomaly detection disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            window_secs = self.engine.anomaly_config().window_secs,
            "Analysis monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so the first run sees a full interval
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let alerts = self.engine.detect_anomalies();
                    tracing::debug!(raised = alerts.len(), "Anomaly detection pass complete");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Analysis monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[tokio::test]
    async fn test_monitor_stops_on_shutdown() {
        let engine = Arc::new(ObservabilityEngine::default());
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(AnalysisMonitor::new(engine).run(rx));

        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_monitor_returns_immediately() {
        let mut config = EngineConfig::default();
        config.anomaly.enabled = false;
        let engine = Arc::new(ObservabilityEngine::new(config));
        let (_tx, rx) = broadcast::channel(1);

        time::timeout(Duration::from_secs(5), AnalysisMonitor::new(engine).run(rx))
            .await
            .expect("disabled monitor should not loop");
    }
}
