// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error taxonomy for the detection pipeline

use thiserror::Error;

use super::image_utils::ImageError;

/// Errors produced by the decode → infer → reshape pipeline
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The model host has no loaded detector
    #[error("Model not loaded")]
    ModelUnavailable,

    /// Loading the model weights failed
    #[error("Failed to load model: {0}")]
    ModelLoadFailure(String),

    /// The uploaded bytes are not a decodable image
    #[error("Invalid image file: {0}")]
    InvalidImage(#[from] ImageError),

    /// Any other failure inside the inference backend
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
}

impl DetectionError {
    pub fn inference(msg: impl std::fmt::Display) -> Self {
        DetectionError::InferenceFailure(msg.to_string())
    }

    /// True for errors caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, DetectionError::InvalidImage(_))
    }
}
