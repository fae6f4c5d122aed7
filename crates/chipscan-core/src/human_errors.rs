// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanner view.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives whether the UI blocks the viewfinder or just keeps scanning.

use serde::{Deserialize, Serialize};

use crate::error::{CaptureFailure, ScanError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// A bad frame or a slow engine; the next cycle will try again.
    Transient,
    /// User must do something (grant permission, close another app).
    ActionRequired,
    /// Cannot be fixed by retrying or user action on this device.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether scanning continues on its own.
    pub retriable: bool,
    /// Severity level (drives the overlay style in the UI).
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError` for the scanner overlay.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::CaptureUnavailable(failure) => humanize_capture(*failure),

        ScanError::Recognition(_) => HumanError {
            message: "We couldn't read that frame.".into(),
            suggestion: "Hold the chip steady inside the box. We'll try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::RecognitionTimeout { .. } => HumanError {
            message: "Reading the code is taking too long.".into(),
            suggestion: "Try moving closer or turning on high contrast. We'll keep trying.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::ImageError(_) => HumanError {
            message: "The camera picture couldn't be processed.".into(),
            suggestion: "We'll try the next picture automatically.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::InvalidConfig(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Reset the scanner settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::SessionClosed => HumanError {
            message: "The scanner is closed.".into(),
            suggestion: "Open the scanner again to keep scanning.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file the scanner needs couldn't be found.".into(),
                    suggestion: "Check the scanner settings point at files that exist.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanError::Serialization(_) => HumanError {
            message: "The saved scanner settings are damaged.".into(),
            suggestion: "Delete the settings file to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_capture(failure: CaptureFailure) -> HumanError {
    match failure {
        CaptureFailure::PermissionDenied => HumanError {
            message: "Camera permission denied.".into(),
            suggestion: "Allow camera access for this app, then close the scanner and open it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        CaptureFailure::DeviceBusy => HumanError {
            message: "The camera is being used by another app.".into(),
            suggestion: "Close the other app, then close the scanner and open it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        CaptureFailure::NotReady => HumanError {
            message: "The camera didn't start.".into(),
            suggestion: "Close the scanner and open it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        CaptureFailure::Unsupported => HumanError {
            message: "No camera was found.".into(),
            suggestion: "Connect a camera, or type the chip code into the search box instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_blocks_scanning() {
        let human = humanize_error(&ScanError::CaptureUnavailable(
            CaptureFailure::PermissionDenied,
        ));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
        assert_eq!(human.message, "Camera permission denied.");
    }

    #[test]
    fn recognition_failure_is_transient() {
        let human = humanize_error(&ScanError::Recognition("engine fault".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn missing_camera_is_permanent() {
        let human = humanize_error(&ScanError::CaptureUnavailable(CaptureFailure::Unsupported));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn every_terminal_error_is_not_retriable() {
        for failure in [
            CaptureFailure::NotReady,
            CaptureFailure::PermissionDenied,
            CaptureFailure::DeviceBusy,
            CaptureFailure::Unsupported,
        ] {
            let err = ScanError::CaptureUnavailable(failure);
            assert!(err.is_terminal());
            assert!(!humanize_error(&err).retriable, "{failure} should not auto-retry");
        }
    }
}
