// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Standalone detection tools that run against a local image file

pub mod detect_image;
pub mod quick_run;

use clap::Args;
use std::path::PathBuf;

use crate::config::{DetectorConfig, DEFAULT_MODEL_PATH};

pub const DEFAULT_IMAGE_PATH: &str = "Untitled.jpg";

/// Arguments shared by the detection CLIs
#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// Path to the YOLO ONNX model
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Image to run detection on
    #[arg(long, default_value = DEFAULT_IMAGE_PATH)]
    pub image: PathBuf,

    /// Labels file overriding the model's class names (.txt or .json)
    #[arg(long, env = "LABELS_PATH")]
    pub labels: Option<PathBuf>,

    /// Minimum confidence for a detection to be reported
    #[arg(long, default_value_t = 0.25)]
    pub confidence: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,
}

impl DetectArgs {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            model_path: self.model.clone(),
            labels_path: self.labels.clone(),
            confidence_threshold: self.confidence.clamp(0.0, 1.0),
            iou_threshold: self.iou.clamp(0.0, 1.0),
            ..DetectorConfig::default()
        }
    }
}

/// Initialize logging for CLI binaries
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
}
