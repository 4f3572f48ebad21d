// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `detect-image`: log every detection found in a local image

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use super::DetectArgs;
use crate::detection::{handle_request, read_image_file, DetectionError, ModelHost, Prediction};

#[derive(Parser, Debug)]
#[command(name = "detect-image")]
#[command(about = "Run YOLO object detection on a local image and log the results", long_about = None)]
pub struct DetectImageCli {
    #[command(flatten)]
    pub args: DetectArgs,
}

/// Log line for one detection, corners truncated to whole pixels
pub fn format_detection_line(prediction: &Prediction) -> String {
    format!(
        "Detection: Class='{}', Confidence={:.2}, Box=({}, {}, {}, {})",
        prediction.class_name,
        prediction.confidence,
        prediction.x1 as i64,
        prediction.y1 as i64,
        prediction.x2 as i64,
        prediction.y2 as i64
    )
}

/// Load the model, then run detection on the image
///
/// Only a model load failure is returned as an error. Failures while
/// reading or detecting are logged.
pub fn run(args: &DetectArgs) -> Result<()> {
    let host = ModelHost::try_load(&args.detector_config()).context("Error loading model")?;
    info!("Model loaded successfully");

    if let Err(e) = detect_and_log(&host, args) {
        error!("Error during detection: {}", e);
    }

    Ok(())
}

fn detect_and_log(host: &ModelHost, args: &DetectArgs) -> Result<(), DetectionError> {
    let bytes = read_image_file(&args.image)?;
    info!("Image loaded successfully from {}", args.image.display());

    info!("Running object detection...");
    let response = handle_request(host, &bytes)?;

    info!("Processing detection results...");
    for prediction in &response.predictions {
        info!("{}", format_detection_line(prediction));
    }

    info!("Object detection completed successfully.");
    Ok(())
}
