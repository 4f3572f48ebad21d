// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! TOML configuration loading

use std::io::Write;
use std::path::PathBuf;
use yolo_detection_node::config::AppConfig;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 9000
max_upload_bytes = 2048

[detector]
model_path = "models/yolo11n.onnx"
labels_path = "models/labels.txt"
input_size = 320
confidence_threshold = 0.4
iou_threshold = 0.6
max_detections = 20
intra_threads = 2
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.max_upload_bytes, 2048);
    assert_eq!(config.detector.model_path, PathBuf::from("models/yolo11n.onnx"));
    assert_eq!(
        config.detector.labels_path,
        Some(PathBuf::from("models/labels.txt"))
    );
    assert_eq!(config.detector.input_size, Some(320));
    assert_eq!(config.detector.max_detections, 20);

    let options = config.detector.postprocess_options();
    assert_eq!(options.confidence_threshold, 0.4);
    assert_eq!(options.iou_threshold, 0.6);
}

#[test]
fn test_partial_config_uses_defaults() {
    let file = write_config("[detector]\nmodel_path = \"custom.onnx\"\n");

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.detector.model_path, PathBuf::from("custom.onnx"));
    assert_eq!(config.detector.confidence_threshold, 0.25);
    assert!(config.detector.labels_path.is_none());
}

#[test]
fn test_out_of_range_thresholds_clamped() {
    let file = write_config("[detector]\nconfidence_threshold = 2.5\n");
    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.detector.confidence_threshold, 1.0);
}

#[test]
fn test_zero_input_size_rejected() {
    let file = write_config("[detector]\ninput_size = 0\n");
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("input_size"));
}

#[test]
fn test_invalid_toml_is_error() {
    let file = write_config("[server\nport = ");
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_missing_file_is_error() {
    assert!(AppConfig::from_file("/nonexistent/node.toml").is_err());
}
