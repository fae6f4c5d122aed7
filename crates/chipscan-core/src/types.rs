// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Chipscan pipeline.

use std::time::Instant;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScanError};

/// Unique identifier for one scanner view lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable RGBA snapshot of the video source at one instant.
///
/// Frames derived from another frame (crops, enhanced copies) keep the
/// original capture timestamp.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
    captured_at: Instant,
}

impl Frame {
    /// Wrap an RGBA buffer captured now.
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }

    /// Build a frame from raw RGBA8 pixels (4 bytes per pixel, row-major).
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self::from_image)
            .ok_or_else(|| {
                ScanError::ImageError(format!(
                    "pixel buffer of {actual} bytes does not fit {width}x{height} RGBA ({expected} bytes)"
                ))
            })
    }

    /// A zero-area frame.
    pub fn empty() -> Self {
        Self::from_image(RgbaImage::new(0, 0))
    }

    /// Replace the pixels while keeping the capture timestamp.
    pub fn derive(&self, image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: self.captured_at,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True when the frame has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// Normalized rectangle describing the aiming box on screen.
///
/// All values are fractions of the frame: `width`/`height` in `(0, 1]`,
/// `center_x`/`center_y` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiSpec {
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl RoiSpec {
    /// A box of the given fractional size centred in the frame.
    pub fn centered(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            center_x: 0.5,
            center_y: 0.5,
        }
    }

    /// Reject fractions outside the unit square.
    pub fn validate(&self) -> Result<()> {
        let sizes_ok = [self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0 && *v <= 1.0);
        let centers_ok = [self.center_x, self.center_y]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v));
        if sizes_ok && centers_ok {
            Ok(())
        } else {
            Err(ScanError::InvalidConfig(format!(
                "ROI {}x{} at ({}, {}) is outside the unit square",
                self.width, self.height, self.center_x, self.center_y
            )))
        }
    }
}

impl Default for RoiSpec {
    fn default() -> Self {
        Self::centered(0.6, 0.3)
    }
}

/// Coarse state of the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    /// Waiting for the next timer tick or a manual trigger.
    Idle,
    /// Pulling a frame from the camera.
    Capturing,
    /// Waiting on the recognition engine.
    Recognizing,
}

/// Which camera the scanner prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Rear camera, pointed at the component.
    Environment,
    /// Front camera.
    User,
}

/// Pixel dimensions of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `(width, height)` fits inside this resolution.
    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

/// Constraints handed to the platform camera when the stream is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub facing: Facing,
    pub ideal: Resolution,
    pub min: Resolution,
    pub max: Resolution,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal: Resolution::new(1280, 720),
            min: Resolution::new(640, 480),
            max: Resolution::new(1920, 1080),
        }
    }
}

/// The raw text of one finished recognition, kept for on-screen feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Recognized text, whitespace-trimmed.
    pub raw_text: String,
    /// The chip code selected from `raw_text`, if any.
    pub candidate: Option<String>,
    pub detected_at: DateTime<Utc>,
}

impl Detection {
    pub fn new(raw_text: &str, candidate: Option<String>) -> Self {
        Self {
            raw_text: raw_text.trim().to_string(),
            candidate,
            detected_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_from_rgba_checks_buffer_length() {
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_ok());
        let err = Frame::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, ScanError::ImageError(_)));
    }

    #[test]
    fn empty_frame_has_no_area() {
        let frame = Frame::empty();
        assert!(frame.is_empty());
        assert_eq!(frame.dimensions(), (0, 0));
    }

    #[test]
    fn derived_frame_keeps_timestamp() {
        let frame = Frame::from_image(RgbaImage::new(4, 4));
        let derived = frame.derive(RgbaImage::new(2, 2));
        assert_eq!(derived.captured_at(), frame.captured_at());
        assert_eq!(derived.dimensions(), (2, 2));
    }

    #[test]
    fn default_roi_is_centered_box() {
        let roi = RoiSpec::default();
        assert_eq!(roi, RoiSpec::centered(0.6, 0.3));
        assert!(roi.validate().is_ok());
    }

    #[test]
    fn roi_rejects_out_of_range_fractions() {
        assert!(RoiSpec::centered(0.0, 0.3).validate().is_err());
        assert!(RoiSpec::centered(1.2, 0.3).validate().is_err());
        assert!(RoiSpec::centered(f32::NAN, 0.3).validate().is_err());
        let off_frame = RoiSpec {
            center_x: 1.5,
            ..RoiSpec::default()
        };
        assert!(off_frame.validate().is_err());
    }

    #[test]
    fn detection_trims_raw_text() {
        let detection = Detection::new("  KLM31AAA \n", Some("KLM31AAA".into()));
        assert_eq!(detection.raw_text, "KLM31AAA");
    }
}
