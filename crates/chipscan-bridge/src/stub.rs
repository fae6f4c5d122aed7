// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub camera for builds without a native camera backend.
//
// Every capture fails with `CaptureUnavailable(Unsupported)`, which the scan
// loop treats as terminal, so a session over the stub shows the "no camera"
// message once and goes quiet.

use chipscan_core::error::{CaptureFailure, Result, ScanError};
use chipscan_core::types::{CameraConstraints, Frame};

use crate::traits::FrameSource;

/// Camera that is never available.
pub struct StubCamera {
    constraints: CameraConstraints,
}

impl StubCamera {
    pub fn new(constraints: CameraConstraints) -> Self {
        Self { constraints }
    }
}

impl FrameSource for StubCamera {
    fn capture_frame(&mut self) -> Result<Frame> {
        tracing::warn!("FrameSource::capture_frame called on stub camera");
        Err(ScanError::CaptureUnavailable(CaptureFailure::Unsupported))
    }

    fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    fn name(&self) -> &str {
        "stub camera"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_reports_unsupported() {
        let mut camera = StubCamera::new(CameraConstraints::default());
        let err = camera.capture_frame().unwrap_err();
        assert!(matches!(
            err,
            ScanError::CaptureUnavailable(CaptureFailure::Unsupported)
        ));
        assert!(err.is_terminal());
    }
}
