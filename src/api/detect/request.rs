// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload parsing for the detect endpoint

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};
use tracing::{debug, warn};

use crate::api::errors::ApiError;

/// Name of the multipart field holding the image
pub const UPLOAD_FIELD: &str = "file";

/// Image file received in a multipart request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pull the `file` field out of a multipart body
///
/// Other fields are skipped. A file larger than `max_upload_bytes` is
/// rejected with 413; otherwise the bytes are returned as-is and an
/// empty file is left for the decoder to reject.
pub async fn read_image_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes))?;

        debug!(
            "Received upload {:?} ({:?}, {} bytes)",
            file_name,
            content_type,
            bytes.len()
        );

        if bytes.len() > max_upload_bytes {
            warn!(
                "Upload of {} bytes exceeds limit of {} bytes",
                bytes.len(),
                max_upload_bytes
            );
            return Err(ApiError::payload_too_large(max_upload_bytes));
        }

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::InvalidRequest(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(max_upload_bytes)
    } else {
        ApiError::InvalidRequest(format!("malformed multipart body: {}", err.body_text()))
    }
}
