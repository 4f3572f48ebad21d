// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection adapter: bytes in, prediction list out
//!
//! `handle_request` is the transport-independent entry point shared by
//! the HTTP endpoint and the CLIs. It runs decode → infer → reshape.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DetectionError;
use super::image_utils::decode_image_bytes;
use super::labels::LabelTable;
use super::model::RawDetection;
use super::model_host::ModelHost;

/// One detected object in the wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
    pub class_name: String,
}

/// Response body of the detect endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub predictions: Vec<Prediction>,
}

/// Decode raw upload bytes into an RGB raster
pub fn decode(bytes: &[u8]) -> Result<RgbImage, DetectionError> {
    let (image, info) = decode_image_bytes(bytes)?;
    debug!(
        "Decoded {:?} image {}x{} ({} bytes)",
        info.format, info.width, info.height, info.size_bytes
    );
    Ok(image)
}

/// Convert raw detections into predictions, preserving order and count
pub fn reshape(detections: &[RawDetection], labels: &LabelTable) -> Vec<Prediction> {
    detections
        .iter()
        .map(|det| Prediction {
            x1: det.bbox[0],
            y1: det.bbox[1],
            x2: det.bbox[2],
            y2: det.bbox[3],
            confidence: det.confidence,
            class_id: det.class_id,
            class_name: labels.name(det.class_id),
        })
        .collect()
}

/// Run the full pipeline on one uploaded image
///
/// Availability is checked before decoding, so an unloaded model wins
/// over a bad upload.
pub fn handle_request(host: &ModelHost, bytes: &[u8]) -> Result<DetectionResponse, DetectionError> {
    let detector = host.detector()?;
    let image = decode(bytes)?;
    let detections = detector.infer(&image)?;
    let predictions = reshape(&detections, detector.labels());

    debug!("Detection produced {} predictions", predictions.len());

    Ok(DetectionResponse { predictions })
}
