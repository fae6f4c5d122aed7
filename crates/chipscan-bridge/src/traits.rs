// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic camera abstraction.

use chipscan_core::error::Result;
use chipscan_core::types::{CameraConstraints, Frame};

/// A live video stream the scanner can sample.
///
/// The stream is opened once per scanner view and only ever read. A source
/// that cannot deliver (not started, permission denied or revoked, device
/// busy) fails with
/// [`ScanError::CaptureUnavailable`](chipscan_core::ScanError::CaptureUnavailable).
pub trait FrameSource: Send + 'static {
    /// Snapshot the stream as it is right now.
    fn capture_frame(&mut self) -> Result<Frame>;

    /// Constraints the stream was opened with.
    fn constraints(&self) -> &CameraConstraints;

    /// Human-readable source name for logs (e.g. "replay (3 frames)").
    fn name(&self) -> &str;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn capture_frame(&mut self) -> Result<Frame> {
        (**self).capture_frame()
    }

    fn constraints(&self) -> &CameraConstraints {
        (**self).constraints()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
