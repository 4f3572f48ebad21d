// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::request::read_image_upload;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::detection::{handle_request, DetectionError, DetectionResponse};

/// POST /detect - Detect objects in an uploaded image
///
/// # Request
/// `multipart/form-data` with the image in a field named `file`.
///
/// # Response
/// `{"predictions": [{x1, y1, x2, y2, confidence, class_id, class_name}, ...]}`
/// with corners in source image pixels.
///
/// # Errors
/// - 400 Bad Request: body is not multipart, missing `file` field or undecodable image
/// - 413 Payload Too Large: upload exceeds the configured limit
/// - 503 Service Unavailable: detection model not loaded
/// - 500 Internal Server Error: inference failed
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResponse>, ApiError> {
    if !state.model_host.is_available() {
        warn!("Detection requested but model is not loaded");
        return Err(DetectionError::ModelUnavailable.into());
    }

    let multipart = multipart.map_err(|e| {
        ApiError::InvalidRequest(format!("expected multipart/form-data body: {}", e))
    })?;

    let upload = read_image_upload(multipart, state.config.server.max_upload_bytes).await?;
    debug!(
        "Detect request: {:?}, {} bytes",
        upload.file_name,
        upload.bytes.len()
    );

    let start = Instant::now();
    let host = state.model_host.clone();

    // Inference is CPU bound
    let result = tokio::task::spawn_blocking(move || handle_request(&host, &upload.bytes))
        .await
        .map_err(|e| ApiError::InternalError(format!("detection task failed: {}", e)))?;

    let response = result.map_err(|e| {
        if e.is_client_error() {
            warn!("Rejected upload: {}", e);
        } else {
            error!("Detection failed: {}", e);
        }
        ApiError::from(e)
    })?;

    info!(
        "Detection complete: {} predictions in {}ms",
        response.predictions.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(response))
}
