// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use std::{env, sync::Arc};
use tracing::{info, warn};
use yolo_detection_node::{
    api::{start_server, AppState},
    config::AppConfig,
    detection::ModelHost,
    version,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting {}", version::get_version_string());
    info!("📦 BUILD VERSION: {}", version::VERSION);

    let config = AppConfig::load()?;
    info!(
        "Model: {}, thresholds: conf={} iou={}",
        config.detector.model_path.display(),
        config.detector.confidence_threshold,
        config.detector.iou_threshold
    );

    // Loading the model is blocking work
    let detector_config = config.detector.clone();
    let model_host = tokio::task::spawn_blocking(move || ModelHost::load(&detector_config)).await?;

    if !model_host.is_available() {
        warn!("⚠️  Serving without a model; /detect will return 503");
    }

    let state = AppState::new(Arc::new(model_host), config);
    start_server(state).await?;

    info!("👋 YOLO Detection Node shut down");
    Ok(())
}
