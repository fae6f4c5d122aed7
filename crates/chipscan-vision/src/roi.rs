// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ROI cropper: cuts the aiming-box region out of a camera frame.
//
// The box is described in fractions of the frame, so the same `RoiSpec` selects
// the same part of the scene at any camera resolution.

use chipscan_core::types::{Frame, RoiSpec};
use image::RgbaImage;
use tracing::{debug, instrument};

/// A pixel-space rectangle inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resolve a fractional ROI against concrete frame dimensions.
///
/// The rectangle always lies inside the frame and is at least one pixel in
/// each direction, unless the frame itself has zero area.
pub fn roi_rect(frame_width: u32, frame_height: u32, spec: &RoiSpec) -> PixelRect {
    if frame_width == 0 || frame_height == 0 {
        return PixelRect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let (x, width) = span(frame_width, spec.width, spec.center_x);
    let (y, height) = span(frame_height, spec.height, spec.center_y);
    PixelRect {
        x,
        y,
        width,
        height,
    }
}

/// Offset and length of one axis of the ROI, clamped to `[0, extent)`.
fn span(extent: u32, fraction: f32, center: f32) -> (u32, u32) {
    let length = ((extent as f32 * fraction).round() as u32).clamp(1, extent);
    let start = (center * extent as f32 - length as f32 / 2.0).round().max(0.0) as u32;
    (start.min(extent - length), length)
}

/// Crop `frame` to the region described by `spec`.
///
/// A zero-area frame produces an empty frame rather than an error; the
/// pipeline reads that as "nothing to recognize".
#[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
pub fn crop(frame: &Frame, spec: &RoiSpec) -> Frame {
    if frame.is_empty() {
        debug!("Empty frame; returning empty crop");
        return frame.derive(RgbaImage::new(0, 0));
    }

    let rect = roi_rect(frame.width(), frame.height(), spec);
    debug!(
        x = rect.x,
        y = rect.y,
        crop_w = rect.width,
        crop_h = rect.height,
        "Cropping to ROI"
    );
    let cropped =
        image::imageops::crop_imm(frame.as_image(), rect.x, rect.y, rect.width, rect.height)
            .to_image();
    frame.derive(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_frame(width: u32, height: u32) -> Frame {
        Frame::from_image(RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255])))
    }

    #[test]
    fn default_roi_is_centered() {
        let rect = roi_rect(1000, 500, &RoiSpec::default());
        assert_eq!(
            rect,
            PixelRect {
                x: 200,
                y: 175,
                width: 600,
                height: 150
            }
        );
    }

    #[test]
    fn crop_proportions_are_resolution_independent() {
        let spec = RoiSpec::default();
        let mut ratios = Vec::new();
        for (w, h) in [(1920u32, 1080u32), (640, 480)] {
            let cropped = crop(&solid_frame(w, h), &spec);
            ratios.push((
                cropped.width() as f32 / w as f32,
                cropped.height() as f32 / h as f32,
                1.0 / w.min(h) as f32,
            ));
        }
        let (wa, ha, tol_a) = ratios[0];
        let (wb, hb, tol_b) = ratios[1];
        let tolerance = tol_a.max(tol_b);
        assert!((wa - wb).abs() <= tolerance, "width ratios {wa} vs {wb}");
        assert!((ha - hb).abs() <= tolerance, "height ratios {ha} vs {hb}");
    }

    #[test]
    fn crop_copies_the_right_pixels() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        img.put_pixel(5, 5, Rgba([255, 0, 0, 255]));
        let frame = Frame::from_image(img);

        let cropped = crop(&frame, &RoiSpec::centered(0.2, 0.2));
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.as_image().get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn roi_near_edge_stays_inside_frame() {
        let spec = RoiSpec {
            width: 0.5,
            height: 0.5,
            center_x: 1.0,
            center_y: 0.0,
        };
        let rect = roi_rect(100, 80, &spec);
        assert!(rect.x + rect.width <= 100);
        assert!(rect.y + rect.height <= 80);
        assert_eq!((rect.width, rect.height), (50, 40));
        assert_eq!((rect.x, rect.y), (50, 0));
    }

    #[test]
    fn tiny_frame_yields_at_least_one_pixel() {
        let cropped = crop(&solid_frame(1, 1), &RoiSpec::centered(0.1, 0.1));
        assert_eq!(cropped.dimensions(), (1, 1));
    }

    #[test]
    fn zero_area_frame_yields_empty_crop() {
        let cropped = crop(&Frame::empty(), &RoiSpec::default());
        assert!(cropped.is_empty());
    }
}
