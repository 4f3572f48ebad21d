// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::detect::detect_handler;
use super::handlers::{health_handler, models_handler, version_handler};
use crate::config::AppConfig;
use crate::detection::ModelHost;

/// Multipart framing on top of the raw upload limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub model_host: Arc<ModelHost>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(model_host: Arc<ModelHost>, config: AppConfig) -> Self {
        Self {
            model_host,
            config: Arc::new(config),
        }
    }

    /// State with default config around the given host
    pub fn new_for_test(model_host: ModelHost) -> Self {
        Self::new(Arc::new(model_host), AppConfig::default())
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .config
        .server
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Build information
        .route("/v1/version", get(version_handler))
        // Loaded model description
        .route("/v1/models", get(models_handler))
        // Object detection
        .route("/detect", post(detect_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.listen_addr()?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
