// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO models

use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size of Ultralytics exports
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Gray value used for letterbox padding
pub const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox transform, used to map boxes back to the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the source image
    pub scale: f32,
    /// Left padding in model input pixels
    pub pad_x: f32,
    /// Top padding in model input pixels
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
    pub input_size: u32,
}

impl Letterbox {
    pub fn new(source_width: u32, source_height: u32, input_size: u32) -> Self {
        let scale = (input_size as f32 / source_width as f32)
            .min(input_size as f32 / source_height as f32);

        let new_w = ((source_width as f32 * scale).round() as u32).clamp(1, input_size);
        let new_h = ((source_height as f32 * scale).round() as u32).clamp(1, input_size);

        Self {
            scale,
            pad_x: ((input_size - new_w) / 2) as f32,
            pad_y: ((input_size - new_h) / 2) as f32,
            source_width,
            source_height,
            input_size,
        }
    }

    /// Size of the resized image inside the padded square
    pub fn resized_dims(&self) -> (u32, u32) {
        let w = ((self.source_width as f32 * self.scale).round() as u32).clamp(1, self.input_size);
        let h = ((self.source_height as f32 * self.scale).round() as u32).clamp(1, self.input_size);
        (w, h)
    }

    /// Map a box in model input space to source pixel space, clamped to the image
    pub fn to_source(&self, bbox: [f32; 4]) -> [f32; 4] {
        let max_x = self.source_width as f32;
        let max_y = self.source_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, max_y),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, max_y),
        ]
    }
}

/// Letterbox an RGB image into a `[1, 3, S, S]` tensor scaled to [0, 1]
pub fn preprocess(image: &RgbImage, input_size: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::new(image.width(), image.height(), input_size);
    let (new_w, new_h) = letterbox.resized_dims();

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(input_size, input_size, Rgb([PAD_VALUE; 3]));
    image::imageops::replace(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );

    let size = input_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}
