// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use yolo_detection_node::cli::{init_logging, quick_run};

fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let cli = quick_run::QuickRunCli::parse();

    match quick_run::run(&cli.args) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
