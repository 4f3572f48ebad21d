// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `quick-run`: print the detection response for a local image as JSON

use anyhow::{Context, Result};
use clap::Parser;

use super::DetectArgs;
use crate::detection::{handle_request, read_image_file, DetectionResponse, ModelHost};

#[derive(Parser, Debug)]
#[command(name = "quick-run")]
#[command(about = "Run YOLO object detection on a local image and print the results", long_about = None)]
pub struct QuickRunCli {
    #[command(flatten)]
    pub args: DetectArgs,
}

pub fn detect_file(host: &ModelHost, args: &DetectArgs) -> Result<DetectionResponse> {
    let bytes = read_image_file(&args.image)?;
    let response = handle_request(host, &bytes)
        .with_context(|| format!("Detection failed for {}", args.image.display()))?;
    Ok(response)
}

pub fn run(args: &DetectArgs) -> Result<String> {
    let host = ModelHost::try_load(&args.detector_config()).context("Error loading model")?;
    let response = detect_file(&host, args)?;
    Ok(serde_json::to_string_pretty(&response)?)
}
