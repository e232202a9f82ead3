//! API server: HTTP routes plus the Prometheus exporter.

use crate::rest::{self, AppState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use cac_cache::UploadCache;
use cac_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router over shared state.
pub fn router(state: AppState) -> Router {
    // Multipart framing needs headroom beyond the raw file limit.
    let body_limit = state.upload.max_file_bytes + 64 * 1024;

    Router::new()
        // Analysis endpoints
        .route("/v1/analyze", post(rest::handle_analyze))
        .route("/v1/analyze-cac", post(rest::handle_analyze_cac))
        .route("/v1/upload", post(rest::handle_upload))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server.
pub struct ApiServer {
    config: AppConfig,
    cache: Arc<UploadCache>,
}

impl ApiServer {
    pub fn new(config: AppConfig, cache: Arc<UploadCache>) -> Self {
        Self { config, cache }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            cache: self.cache.clone(),
            upload: self.config.upload.clone(),
            start_time: Instant::now(),
        };
        let app = router(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
