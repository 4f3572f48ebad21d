// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model host: owns the detector loaded at startup
//!
//! The host is created once and shared behind an `Arc` by the HTTP
//! server and the CLIs. A failed load does not stop the process; the
//! host stays in the unavailable state and every request reports
//! `ModelUnavailable`.

use std::sync::Arc;
use tracing::{info, warn};

use super::error::DetectionError;
use super::model::{Detector, ModelInfo, RawDetection, YoloOnnxModel};
use crate::config::DetectorConfig;
use image::RgbImage;

pub struct ModelHost {
    detector: Option<Arc<dyn Detector>>,
    load_error: Option<String>,
}

impl std::fmt::Debug for ModelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHost")
            .field("available", &self.is_available())
            .field("load_error", &self.load_error)
            .finish()
    }
}

impl ModelHost {
    /// Load the configured model, falling back to an unavailable host
    pub fn load(config: &DetectorConfig) -> Self {
        match Self::try_load(config) {
            Ok(host) => host,
            Err(e) => {
                warn!("⚠️  Detection model unavailable: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Load the configured model, surfacing the failure to the caller
    pub fn try_load(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let model = YoloOnnxModel::load_with_config(config)?;
        info!(
            "Model host ready: {} classes at {}px",
            model.labels().len(),
            model.input_size()
        );
        Ok(Self::with_detector(Arc::new(model)))
    }

    pub fn with_detector(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector: Some(detector),
            load_error: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            detector: None,
            load_error: Some(reason.into()),
        }
    }

    /// The loaded detector, or `ModelUnavailable`
    pub fn detector(&self) -> Result<&Arc<dyn Detector>, DetectionError> {
        self.detector.as_ref().ok_or(DetectionError::ModelUnavailable)
    }

    /// Run the loaded detector on a decoded image
    pub fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, DetectionError> {
        self.detector()?.infer(image)
    }

    pub fn is_available(&self) -> bool {
        self.detector.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn info(&self) -> Option<ModelInfo> {
        self.detector.as_ref().map(|d| d.info())
    }
}
