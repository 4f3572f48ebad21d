// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO detector backed by ONNX Runtime

use image::RgbImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::error::DetectionError;
use super::labels::LabelTable;
use super::postprocess::{decode_output, PostprocessOptions};
use super::preprocess::{preprocess, DEFAULT_INPUT_SIZE};
use crate::config::DetectorConfig;

/// One model-reported object before label resolution
///
/// `bbox` is `[x1, y1, x2, y2]` in source image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: u32,
}

/// Summary of a loaded detector, exposed on `/v1/models`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub input_size: u32,
    pub num_classes: usize,
    pub class_names: BTreeMap<u32, String>,
}

/// Capability offered by the model host: image in, raw detections out
///
/// Implementations are shared read-only across concurrent requests.
pub trait Detector: Send + Sync {
    fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, DetectionError>;

    fn labels(&self) -> &LabelTable;

    fn info(&self) -> ModelInfo;
}

/// Ultralytics YOLO model exported to ONNX
///
/// Runs on the CPU execution provider. NMS is applied inside `infer`
/// for raw-head exports.
#[derive(Clone)]
pub struct YoloOnnxModel {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    labels: LabelTable,
    options: PostprocessOptions,
    name: String,
}

impl std::fmt::Debug for YoloOnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxModel")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("num_classes", &self.labels.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl YoloOnnxModel {
    /// Load a model file with default thresholds
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, DetectionError> {
        let config = DetectorConfig {
            model_path: model_path.as_ref().to_path_buf(),
            ..DetectorConfig::default()
        };
        Self::load_with_config(&config)
    }

    /// Load the model described by `config`
    ///
    /// # Errors
    /// Returns `ModelLoadFailure` if:
    /// - the configured input size is zero
    /// - the model file is missing
    /// - ONNX Runtime cannot build a session from it
    /// - an explicit labels file cannot be read
    pub fn load_with_config(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let model_path = config.model_path.as_path();

        if config.input_size == Some(0) {
            return Err(DetectionError::ModelLoadFailure(
                "input_size must be greater than zero".to_string(),
            ));
        }

        if !model_path.exists() {
            return Err(DetectionError::ModelLoadFailure(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        info!("Loading YOLO model from {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| load_err("failed to create session builder", e))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| load_err("failed to set CPU execution provider", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err("failed to set optimization level", e))?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| load_err("failed to set intra threads", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                load_err(
                    format!("failed to load model from {}", model_path.display()),
                    e,
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let metadata_size = read_metadata(&session, "imgsz").and_then(|v| parse_imgsz(&v));
        let input_size = config
            .input_size
            .or(metadata_size)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let labels = match &config.labels_path {
            Some(path) => LabelTable::from_file(path)
                .map_err(|e| DetectionError::ModelLoadFailure(format!("{:#}", e)))?,
            None => match read_metadata(&session, "names")
                .and_then(|v| LabelTable::from_ultralytics_metadata(&v))
            {
                Some(labels) => labels,
                None => {
                    warn!("Model carries no class names, using the COCO label set");
                    LabelTable::coco()
                }
            },
        };

        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());

        debug!(
            "Model input: {} ({}x{}), {} classes",
            input_name,
            input_size,
            input_size,
            labels.len()
        );
        info!("✅ YOLO model '{}' loaded successfully (CPU)", name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size,
            labels,
            options: config.postprocess_options(),
            name,
        })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}

impl Detector for YoloOnnxModel {
    fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, DetectionError> {
        let (tensor, letterbox) = preprocess(image, self.input_size);

        let input_value = Value::from_array(tensor)
            .map_err(|e| DetectionError::inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectionError::inference("model session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(|e| DetectionError::inference(format!("model run failed: {}", e)))?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::inference(format!("failed to extract output tensor: {}", e)))?;

        debug!("Model output shape: {:?}", output_tensor.shape());

        decode_output(
            output_tensor.view(),
            &letterbox,
            &self.options,
            self.labels.len(),
        )
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            input_size: self.input_size,
            num_classes: self.labels.len(),
            class_names: self.labels.as_map().clone(),
        }
    }
}

fn load_err(stage: impl std::fmt::Display, err: impl std::fmt::Display) -> DetectionError {
    DetectionError::ModelLoadFailure(format!("{}: {}", stage, err))
}

fn read_metadata(session: &Session, key: &str) -> Option<String> {
    let metadata = session.metadata().ok()?;
    metadata.custom(key).ok().flatten()
}

/// Parse the Ultralytics `imgsz` metadata (`[640, 640]`) into a square size
fn parse_imgsz(value: &str) -> Option<u32> {
    let sizes: Vec<u32> = value
        .trim_matches(|c| c == '[' || c == ']' || c == '(' || c == ')')
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .filter(|size| *size > 0)
        .collect();

    match sizes.as_slice() {
        [size] => Some(*size),
        [h, w] if h == w => Some(*h),
        [h, w] => {
            warn!("Non-square model input {}x{}, using {}", h, w, h.max(w));
            Some(*h.max(w))
        }
        _ => None,
    }
}
