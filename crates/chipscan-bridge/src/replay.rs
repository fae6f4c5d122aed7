// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replay source: plays back still images as if they were a live stream.
//
// Used on desktop, where there is no native camera backend, and by tests.
// Frames are decoded once up front and served in order, wrapping around at
// the end. Frames larger than the `max` constraint are downscaled the way a
// camera would deliver them.

use std::path::Path;

use chipscan_core::error::{CaptureFailure, Result, ScanError};
use chipscan_core::types::{CameraConstraints, Frame};
use image::RgbaImage;
use image::imageops::FilterType;
use tracing::{debug, info, instrument, warn};

use crate::traits::FrameSource;

/// Plays a fixed list of images in a loop.
pub struct ReplaySource {
    frames: Vec<RgbaImage>,
    cursor: usize,
    constraints: CameraConstraints,
    name: String,
}

impl ReplaySource {
    // -- Construction -------------------------------------------------------

    /// Replay already-decoded images.
    pub fn from_images(images: Vec<RgbaImage>, constraints: CameraConstraints) -> Self {
        let frames: Vec<RgbaImage> = images
            .into_iter()
            .map(|image| fit_within(image, &constraints))
            .collect();
        let name = format!("replay ({} frames)", frames.len());
        Self {
            frames,
            cursor: 0,
            constraints,
            name,
        }
    }

    /// Decode encoded images (JPEG, PNG, ...) and replay them.
    pub fn from_encoded<B: AsRef<[u8]>>(
        encoded: &[B],
        constraints: CameraConstraints,
    ) -> Result<Self> {
        let images = encoded
            .iter()
            .map(|bytes| {
                image::load_from_memory(bytes.as_ref())
                    .map(|img| img.to_rgba8())
                    .map_err(|err| ScanError::ImageError(format!("failed to decode frame: {err}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_images(images, constraints))
    }

    /// Load image files from disk and replay them in the given order.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], constraints: CameraConstraints) -> Result<Self> {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let img = image::open(path).map_err(|err| {
                ScanError::ImageError(format!("failed to open {}: {err}", path.display()))
            })?;
            debug!(path = %path.display(), width = img.width(), height = img.height(), "Loaded frame");
            images.push(img.to_rgba8());
        }
        info!(frames = images.len(), "Replay source ready");
        Ok(Self::from_images(images, constraints))
    }

    // -- Queries ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn capture_frame(&mut self) -> Result<Frame> {
        let Some(image) = self.frames.get(self.cursor) else {
            return Err(ScanError::CaptureUnavailable(CaptureFailure::NotReady));
        };
        let frame = Frame::from_image(image.clone());
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame)
    }

    fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Downscale `image` to fit `constraints.max`, keeping its aspect ratio.
fn fit_within(image: RgbaImage, constraints: &CameraConstraints) -> RgbaImage {
    let (width, height) = image.dimensions();
    let max = constraints.max;
    if max.contains(width, height) {
        // A real camera would refuse to open below `min`; a replay frame is
        // still served.
        if width < constraints.min.width || height < constraints.min.height {
            warn!(width, height, "Replay frame is below the minimum resolution");
        }
        return image;
    }

    let scale = f64::min(
        max.width as f64 / width as f64,
        max.height as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max.width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max.height);
    debug!(width, height, new_width, new_height, "Downscaling replay frame");
    image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}
