// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use detect::{detect_handler, read_image_upload, ImageUpload};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    health_handler, models_handler, version_handler, HealthResponse, ModelDescription,
    ModelsResponse,
};
pub use http_server::{create_app, start_server, AppState};
