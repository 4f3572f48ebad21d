// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Values come from, lowest to highest priority: built-in defaults, an
//! optional TOML file (`CONFIG_FILE`), then environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::detection::PostprocessOptions;

pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Model loading and postprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// Overrides the class names embedded in the model
    pub labels_path: Option<PathBuf>,
    /// Square input size; read from the model metadata when unset
    pub input_size: Option<u32>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let options = PostprocessOptions::default();
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            input_size: None,
            confidence_threshold: options.confidence_threshold,
            iou_threshold: options.iou_threshold,
            max_detections: options.max_detections,
            intra_threads: 4,
        }
    }
}

impl DetectorConfig {
    pub fn postprocess_options(&self) -> PostprocessOptions {
        PostprocessOptions {
            confidence_threshold: self.confidence_threshold.clamp(0.0, 1.0),
            iou_threshold: self.iou_threshold.clamp(0.0, 1.0),
            max_detections: self.max_detections,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file with `[server]` and `[detector]` tables
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        config.clamp_thresholds();
        Ok(config)
    }

    /// Reject values the detector cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.detector.input_size == Some(0) {
            anyhow::bail!("detector.input_size must be greater than zero");
        }
        Ok(())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load the file named by `CONFIG_FILE` if set, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                info!("Loading configuration from {}", path);
                Self::from_file(&path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        override_parsed(&lookup, "API_PORT", &mut self.server.port);
        override_parsed(&lookup, "MAX_UPLOAD_BYTES", &mut self.server.max_upload_bytes);

        if let Some(path) = lookup("MODEL_PATH") {
            self.detector.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("LABELS_PATH") {
            self.detector.labels_path = Some(PathBuf::from(path));
        }
        override_parsed(
            &lookup,
            "CONFIDENCE_THRESHOLD",
            &mut self.detector.confidence_threshold,
        );
        override_parsed(&lookup, "IOU_THRESHOLD", &mut self.detector.iou_threshold);
        override_parsed(&lookup, "MAX_DETECTIONS", &mut self.detector.max_detections);
        override_parsed(&lookup, "INTRA_THREADS", &mut self.detector.intra_threads);

        self.clamp_thresholds();
    }

    fn clamp_thresholds(&mut self) {
        self.detector.confidence_threshold = self.detector.confidence_threshold.clamp(0.0, 1.0);
        self.detector.iou_threshold = self.detector.iou_threshold.clamp(0.0, 1.0);
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring invalid {}={:?}", key, raw),
        }
    }
}
