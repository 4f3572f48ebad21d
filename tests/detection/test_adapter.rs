// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection adapter tests: decode → infer → reshape without HTTP

use image::ImageFormat;
use std::sync::Arc;
use yolo_detection_node::detection::{
    handle_request, reshape, DetectionError, LabelTable, ModelHost, RawDetection,
};

use crate::support::{car_detection, encode_image, FixedDetector};

fn detections(n: usize) -> Vec<RawDetection> {
    (0..n)
        .map(|i| RawDetection {
            bbox: [i as f32, i as f32, i as f32 + 10.0, i as f32 + 10.0],
            confidence: 0.5 + i as f32 / 100.0,
            class_id: (i % 80) as u32,
        })
        .collect()
}

#[test]
fn test_prediction_count_matches_raw_detections() {
    let image = encode_image(48, 32, ImageFormat::Png);
    for n in [0, 1, 7, 120] {
        let host = ModelHost::with_detector(Arc::new(FixedDetector::new(detections(n))));
        let response = handle_request(&host, &image).unwrap();
        assert_eq!(response.predictions.len(), n);
    }
}

#[test]
fn test_car_scenario() {
    let host = ModelHost::with_detector(Arc::new(FixedDetector::new(vec![car_detection()])));
    let image = encode_image(640, 480, ImageFormat::Jpeg);

    let response = handle_request(&host, &image).unwrap();
    assert_eq!(response.predictions.len(), 1);

    let p = &response.predictions[0];
    assert_eq!((p.x1, p.y1, p.x2, p.y2), (10.0, 20.0, 200.0, 300.0));
    assert_eq!(p.confidence, 0.87);
    assert_eq!(p.class_id, 2);
    assert_eq!(p.class_name, "car");
}

#[test]
fn test_decode_failures_are_invalid_image() {
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let host = ModelHost::with_detector(detector.clone());

    let mut truncated = encode_image(64, 64, ImageFormat::Png);
    truncated.truncate(40);

    let cases: [&[u8]; 3] = [b"", &truncated, b"GIF89a but not really a gif"];
    for bytes in cases {
        let err = handle_request(&host, bytes).unwrap_err();
        assert!(
            matches!(err, DetectionError::InvalidImage(_)),
            "expected InvalidImage, got {:?}",
            err
        );
    }
    assert_eq!(detector.calls(), 0);
}

#[test]
fn test_unavailable_host_skips_decode() {
    let host = ModelHost::unavailable("load failed");
    let image = encode_image(8, 8, ImageFormat::Png);

    let inputs: [&[u8]; 3] = [&image, b"", b"garbage"];
    for bytes in inputs {
        assert!(matches!(
            handle_request(&host, bytes),
            Err(DetectionError::ModelUnavailable)
        ));
    }
}

#[test]
fn test_class_names_deterministic() {
    let labels = LabelTable::from_names(["helmet", "vest"]);
    let raw = vec![
        RawDetection {
            bbox: [0.0, 0.0, 1.0, 1.0],
            confidence: 0.9,
            class_id: 1,
        },
        RawDetection {
            bbox: [2.0, 2.0, 3.0, 3.0],
            confidence: 0.4,
            class_id: 1,
        },
        RawDetection {
            bbox: [4.0, 4.0, 5.0, 5.0],
            confidence: 0.4,
            class_id: 9,
        },
    ];

    let first = reshape(&raw, &labels);
    let second = reshape(&raw, &labels);
    assert_eq!(first, second);
    assert_eq!(first[0].class_name, first[1].class_name);
    assert_eq!(first[0].class_name, "vest");
    assert_eq!(first[2].class_name, "class_9");
}

#[test]
fn test_reshape_keeps_low_confidence_and_duplicates() {
    let duplicate = RawDetection {
        bbox: [5.0, 5.0, 50.0, 50.0],
        confidence: 0.01,
        class_id: 0,
    };
    let predictions = reshape(&[duplicate.clone(), duplicate], &LabelTable::coco());
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0], predictions[1]);
}
