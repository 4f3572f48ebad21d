// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect tests
//!
//! These tests verify that:
//! - A decodable upload returns one prediction per raw detection
//! - Undecodable uploads (empty, corrupt) are 400 and never reach the model
//! - An unloaded model is 503, a failing backend is 500
//! - Multipart framing problems are client errors
//! - Files over the configured limit are 413 even inside the body limit

use axum::http::StatusCode;
use image::ImageFormat;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use yolo_detection_node::{
    api::{create_app, AppState},
    config::AppConfig,
    detection::{DetectionResponse, ModelHost, Prediction},
};

use crate::support::{
    body_json, car_detection, detect_request, encode_image, file_part, FailingDetector,
    FixedDetector, Part,
};

fn state_with(detector: Arc<FixedDetector>) -> AppState {
    AppState::new_for_test(ModelHost::with_detector(detector))
}

#[tokio::test]
async fn test_car_detection_response() {
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let app = create_app(state_with(detector.clone()));

    let image = encode_image(640, 480, ImageFormat::Jpeg);
    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: DetectionResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(
        body.predictions,
        vec![Prediction {
            x1: 10.0,
            y1: 20.0,
            x2: 200.0,
            y2: 300.0,
            confidence: 0.87,
            class_id: 2,
            class_name: "car".to_string(),
        }]
    );
    assert_eq!(detector.calls(), 1);
}

#[tokio::test]
async fn test_no_objects_returns_empty_list() {
    let app = create_app(state_with(Arc::new(FixedDetector::new(vec![]))));

    let image = encode_image(32, 32, ImageFormat::Png);
    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!({ "predictions": [] }));
}

#[tokio::test]
async fn test_zero_byte_upload_is_bad_request() {
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let app = create_app(state_with(detector.clone()));

    let response = app.oneshot(detect_request(&[file_part(&[])])).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "invalid_image");
    assert_eq!(detector.calls(), 0, "model must not run on an undecodable upload");
}

#[tokio::test]
async fn test_corrupt_upload_is_bad_request() {
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let app = create_app(state_with(detector.clone()));

    let mut image = encode_image(64, 64, ImageFormat::Png);
    image.truncate(image.len() / 2);
    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_model_is_service_unavailable() {
    let app = create_app(AppState::new_for_test(ModelHost::unavailable(
        "model file not found: best.onnx",
    )));

    let image = encode_image(32, 32, ImageFormat::Png);
    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "service_unavailable");
    assert_eq!(body["message"], "Model not loaded");
}

#[tokio::test]
async fn test_unavailable_model_wins_over_bad_upload() {
    let app = create_app(AppState::new_for_test(ModelHost::unavailable("no model")));

    let response = app.oneshot(detect_request(&[file_part(&[])])).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_inference_failure_is_internal_error() {
    let app = create_app(AppState::new_for_test(ModelHost::with_detector(Arc::new(
        FailingDetector::new(),
    ))));

    let image = encode_image(32, 32, ImageFormat::Png);
    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "internal_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("output tensor missing"));
}

#[tokio::test]
async fn test_missing_file_field_is_invalid_request() {
    let app = create_app(state_with(Arc::new(FixedDetector::new(vec![]))));

    let parts = [Part {
        name: "image",
        filename: Some("Untitled.jpg"),
        data: b"irrelevant",
    }];
    let response = app.oneshot(detect_request(&parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_other_fields_are_skipped() {
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let app = create_app(state_with(detector.clone()));

    let image = encode_image(16, 16, ImageFormat::Png);
    let parts = [
        Part {
            name: "note",
            filename: None,
            data: b"front camera",
        },
        file_part(&image),
    ];
    let response = app.oneshot(detect_request(&parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(detector.calls(), 1);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let app = create_app(state_with(Arc::new(FixedDetector::new(vec![]))));

    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/detect")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"file": "abc"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = 1024;
    let state = AppState::new(
        Arc::new(ModelHost::with_detector(Arc::new(FixedDetector::new(vec![])))),
        config,
    );
    let app = create_app(state);

    let large = vec![0u8; 256 * 1024];
    let response = app.oneshot(detect_request(&[file_part(&large)])).await.unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_file_over_limit_is_payload_too_large() {
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = 1024;
    let detector = Arc::new(FixedDetector::new(vec![car_detection()]));
    let state = AppState::new(Arc::new(ModelHost::with_detector(detector.clone())), config);
    let app = create_app(state);

    // Inside the body limit, so only the per-file check can reject it
    let data = vec![0u8; 2000];
    let response = app.oneshot(detect_request(&[file_part(&data)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "payload_too_large");
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_file_at_limit_reaches_decoder() {
    let image = encode_image(8, 8, ImageFormat::Png);
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = image.len();
    let detector = Arc::new(FixedDetector::new(vec![]));
    let state = AppState::new(Arc::new(ModelHost::with_detector(detector.clone())), config);
    let app = create_app(state);

    let response = app.oneshot(detect_request(&[file_part(&image)])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(detector.calls(), 1);
}
