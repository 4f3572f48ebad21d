// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection pipeline
//!
//! - `model_host`: loads the YOLO model once and exposes inference
//! - `adapter`: decode → infer → reshape for a single upload
//! - `preprocess` / `postprocess`: letterbox and output tensor decoding
//! - `labels`: class id → name table

pub mod adapter;
pub mod error;
pub mod image_utils;
pub mod labels;
pub mod model;
pub mod model_host;
pub mod postprocess;
pub mod preprocess;

pub use adapter::{decode, handle_request, reshape, DetectionResponse, Prediction};
pub use error::DetectionError;
pub use image_utils::{decode_image_bytes, read_image_file, ImageError, ImageInfo};
pub use labels::{LabelTable, COCO_CLASSES};
pub use model::{Detector, ModelInfo, RawDetection, YoloOnnxModel};
pub use model_host::ModelHost;
pub use postprocess::{OutputLayout, PostprocessOptions};
pub use preprocess::{Letterbox, DEFAULT_INPUT_SIZE};
