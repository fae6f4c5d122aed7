// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Chipscan.

use std::time::Duration;

use thiserror::Error;

/// Why the camera could not deliver a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    /// The stream has not produced its first frame yet.
    #[error("camera stream not ready")]
    NotReady,
    /// The user or the OS denied (or revoked) camera access.
    #[error("camera permission denied")]
    PermissionDenied,
    /// Another application holds the device.
    #[error("camera is in use by another application")]
    DeviceBusy,
    /// No camera exists on this platform, or none satisfies the constraints.
    #[error("no usable camera")]
    Unsupported,
}

/// Top-level error type for all Chipscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Capture errors --
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(CaptureFailure),

    // -- Recognition errors --
    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("text recognition timed out after {}ms", elapsed.as_millis())]
    RecognitionTimeout { elapsed: Duration },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Session --
    #[error("scan session is closed")]
    SessionClosed,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether this error ends the scan session.
    ///
    /// Only capture failures are terminal: the camera is the one resource the
    /// session cannot recover by waiting for the next cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CaptureUnavailable(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_capture_failures_are_terminal() {
        assert!(ScanError::CaptureUnavailable(CaptureFailure::PermissionDenied).is_terminal());
        assert!(ScanError::CaptureUnavailable(CaptureFailure::NotReady).is_terminal());
        assert!(!ScanError::Recognition("corrupt image".into()).is_terminal());
        assert!(
            !ScanError::RecognitionTimeout {
                elapsed: Duration::from_secs(15)
            }
            .is_terminal()
        );
    }

    #[test]
    fn timeout_message_reports_millis() {
        let err = ScanError::RecognitionTimeout {
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "text recognition timed out after 1500ms");
    }

    #[test]
    fn capture_failure_message_is_nested() {
        let err = ScanError::CaptureUnavailable(CaptureFailure::DeviceBusy);
        assert_eq!(
            err.to_string(),
            "capture unavailable: camera is in use by another application"
        );
        assert_eq!(CaptureFailure::NotReady.to_string(), "camera stream not ready");
    }
}
