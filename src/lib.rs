// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod detection;
pub mod version;

pub use api::{create_app, AppState};
pub use config::{AppConfig, DetectorConfig, ServerConfig};
pub use detection::{
    handle_request, DetectionError, DetectionResponse, Detector, ModelHost, Prediction,
    YoloOnnxModel,
};
