// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use tracing::error;
use yolo_detection_node::cli::{detect_image, init_logging};

fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let cli = detect_image::DetectImageCli::parse();

    if let Err(e) = detect_image::run(&cli.args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
