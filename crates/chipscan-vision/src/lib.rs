// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// chipscan-vision — Image side of the scan pipeline.
//
// Provides the ROI cropper (aiming box → sub-frame), the high-contrast
// preprocessor, and the recognition seam with an optional `ocrs` engine.

pub mod enhance;
pub mod recognize;
pub mod roi;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use enhance::Preprocessor;
pub use recognize::{ProgressReporter, RecognitionResult, Recognizer};
pub use roi::{PixelRect, crop, roi_rect};

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;
