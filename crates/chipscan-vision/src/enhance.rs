// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessor: the optional high-contrast pass applied to the ROI before
// recognition. Laser-etched markings on dark packages read far better as a
// stretched grayscale image than as the raw colour crop.

use chipscan_core::config::PreprocessConfig;
use chipscan_core::types::Frame;
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Grayscale + contrast/brightness transform.
///
/// Pure and synchronous; the curve is fixed at construction and the
/// user-facing toggle is passed per call.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Output level for each input luma value.
    curve: [u8; 256],
    denoise_sigma: Option<f32>,
}

impl Preprocessor {
    /// Build the tone curve `factor * (v - 128) + 128 + brightness`, clamped.
    pub fn new(contrast_factor: f32, brightness: i32, denoise_sigma: Option<f32>) -> Self {
        let brightness = brightness.clamp(-255, 255) as f32;
        let mut curve = [0u8; 256];
        for (value, out) in curve.iter_mut().enumerate() {
            let stretched = contrast_factor * (value as f32 - 128.0) + 128.0 + brightness;
            *out = stretched.clamp(0.0, 255.0) as u8;
        }
        Self {
            curve,
            denoise_sigma,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new(
            config.contrast_factor,
            config.brightness,
            config.denoise_sigma,
        )
    }

    /// Apply the high-contrast pass when `high_contrast` is set; otherwise
    /// hand the frame back untouched.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub fn enhance(&self, frame: Frame, high_contrast: bool) -> Frame {
        if !high_contrast || frame.is_empty() {
            return frame;
        }

        let mut gray: GrayImage = image::imageops::grayscale(frame.as_image());
        if let Some(sigma) = self.denoise_sigma {
            debug!(sigma, "Denoising before contrast stretch");
            gray = gaussian_blur_f32(&gray, sigma);
        }

        let curve = &self.curve;
        let enhanced = RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = curve[gray.get_pixel(x, y).0[0] as usize];
            Rgba([v, v, v, 255])
        });

        debug!("High-contrast pass applied");
        frame.derive(enhanced)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}
