// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::ApiError;
use super::http_server::AppState;
use crate::detection::DetectionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub path: String,
    pub input_size: u32,
    pub num_classes: usize,
    pub class_names: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescription>,
}

/// GET /health
///
/// Always 200; `status` is `degraded` while the model is unavailable.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let host = &state.model_host;
    let issues = host
        .load_error()
        .map(|reason| vec![format!("model unavailable: {}", reason)]);

    Json(HealthResponse {
        status: if host.is_available() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        model_loaded: host.is_available(),
        version: crate::version::VERSION_NUMBER.to_string(),
        issues,
    })
}

/// GET /v1/version
pub async fn version_handler() -> Json<serde_json::Value> {
    Json(crate::version::get_version_info())
}

/// GET /v1/models
pub async fn models_handler(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let info = state
        .model_host
        .info()
        .ok_or(DetectionError::ModelUnavailable)?;

    Ok(Json(ModelsResponse {
        models: vec![ModelDescription {
            name: info.name,
            path: state.config.detector.model_path.display().to_string(),
            input_size: info.input_size,
            num_classes: info.num_classes,
            class_names: info.class_names,
        }],
    }))
}
