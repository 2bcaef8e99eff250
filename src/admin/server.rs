//! Admin HTTP server.
//!
//! # Responsibilities
//! - Bind the configured address
//! - Wire up middleware (tracing, request timeout)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::router;
use crate::config::AdminConfig;
use crate::engine::ObservabilityEngine;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind admin server to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("admin server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub struct AdminServer {
    router: Router,
    config: AdminConfig,
}

impl AdminServer {
    pub fn new(engine: Arc<ObservabilityEngine>, config: AdminConfig) -> Self {
        let router = Self::build_router(&config, engine);
        Self { router, config }
    }

    #[allow(deprecated)]
    fn build_router(config: &AdminConfig, engine: Arc<ObservabilityEngine>) -> Router {
        router(engine)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Admin server stopped");
        Ok(())
    }
}
