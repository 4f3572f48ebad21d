// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of YOLO output tensors into raw detections
//!
//! Two export layouts are understood:
//! - raw head `[1, 4 + nc, anchors]` (YOLOv8/YOLO11), which needs
//!   thresholding and class-wise NMS here
//! - end-to-end `[1, N, 6]` rows of `x1, y1, x2, y2, score, class`
//!   (NMS-free exports), which only need thresholding
//!
//! A `[1, 6, 6]` tensor fits both; it is read as a raw head only when
//! the model has exactly two classes.

use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use std::cmp::Ordering;
use tracing::debug;

use super::error::DetectionError;
use super::model::RawDetection;
use super::preprocess::Letterbox;

/// Thresholds applied while decoding model output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostprocessOptions {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for PostprocessOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

/// Output tensor layouts understood by `decode_output`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    RawHead,
    EndToEnd,
}

/// Pick the layout of a `[1, C, N]` output for a model with `num_classes` classes
pub fn detect_layout(shape: &[usize], num_classes: usize) -> Option<OutputLayout> {
    if shape.len() != 3 || shape[0] != 1 {
        return None;
    }
    if shape[2] == 6 && shape[1] != 4 + num_classes {
        Some(OutputLayout::EndToEnd)
    } else if shape[1] > 4 {
        Some(OutputLayout::RawHead)
    } else {
        None
    }
}

/// Decode a model output tensor into detections in source pixel space
pub fn decode_output(
    output: ArrayViewD<'_, f32>,
    letterbox: &Letterbox,
    options: &PostprocessOptions,
    num_classes: usize,
) -> Result<Vec<RawDetection>, DetectionError> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectionError::inference(format!(
            "unexpected output shape {:?}, expected [1, C, N]",
            shape
        )));
    }

    let rows = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .map_err(DetectionError::inference)?;

    let mut detections = match detect_layout(&shape, num_classes) {
        Some(OutputLayout::EndToEnd) => {
            debug!("Decoding end-to-end output with {} rows", shape[1]);
            decode_end_to_end(rows, options)
        }
        Some(OutputLayout::RawHead) => {
            debug!(
                "Decoding raw head output: {} classes, {} anchors",
                shape[1] - 4,
                shape[2]
            );
            let candidates = decode_raw_head(rows, options);
            non_max_suppression(candidates, options.iou_threshold, options.max_detections)
        }
        None => {
            return Err(DetectionError::inference(format!(
                "output shape {:?} has no class channels",
                shape
            )));
        }
    };

    for det in &mut detections {
        det.bbox = letterbox.to_source(det.bbox);
    }

    Ok(detections)
}

fn decode_end_to_end(
    rows: ArrayView2<'_, f32>,
    options: &PostprocessOptions,
) -> Vec<RawDetection> {
    rows.axis_iter(Axis(0))
        .filter_map(|row| {
            let score = row[4];
            if score < options.confidence_threshold {
                return None;
            }
            Some(RawDetection {
                bbox: [row[0], row[1], row[2], row[3]],
                confidence: score,
                class_id: row[5].max(0.0) as u32,
            })
        })
        .take(options.max_detections)
        .collect()
}

fn decode_raw_head(
    channels: ArrayView2<'_, f32>,
    options: &PostprocessOptions,
) -> Vec<RawDetection> {
    let (num_channels, num_anchors) = channels.dim();
    let mut candidates = Vec::new();

    for a in 0..num_anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for c in 4..num_channels {
            let score = channels[[c, a]];
            if score > best_score {
                best_score = score;
                best_class = c - 4;
            }
        }

        if best_score < options.confidence_threshold {
            continue;
        }

        let cx = channels[[0, a]];
        let cy = channels[[1, a]];
        let w = channels[[2, a]];
        let h = channels[[3, a]];

        candidates.push(RawDetection {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence: best_score,
            class_id: best_class as u32,
        });
    }

    candidates
}

/// Intersection over union of two corner-format boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix1 = a[0].max(b[0]);
    let iy1 = a[1].max(b[1]);
    let ix2 = a[2].min(b[2]);
    let iy2 = a[3].min(b[3]);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy class-wise NMS, highest score first
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }

    kept
}
