// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consumer callbacks for a scan session.

use chipscan_core::human_errors::HumanError;
use chipscan_core::types::Detection;
use tokio::sync::mpsc;

/// Receives the outcome of scan cycles.
///
/// Callbacks run on the session task; keep them short. None of them is ever
/// invoked after the session has been closed.
pub trait ScanObserver: Send + 'static {
    /// A cycle produced a chip code. Called at most once per cycle.
    fn on_scan_result(&self, code: &str);

    /// A recognition finished, whether or not it yielded a code.
    fn on_detection(&self, _detection: &Detection) {}

    /// The camera failed; the session will not capture again.
    fn on_camera_error(&self, _error: &HumanError) {}

    /// A recognition failed or timed out; scanning continues.
    fn on_recognition_failed(&self, _error: &HumanError) {}
}

/// Everything a session reports, as a single event type.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Result(String),
    Detection(Detection),
    CameraError(HumanError),
    RecognitionFailed(HumanError),
}

/// Forward every callback into a channel. A closed receiver is ignored.
impl ScanObserver for mpsc::UnboundedSender<ScanEvent> {
    fn on_scan_result(&self, code: &str) {
        let _ = self.send(ScanEvent::Result(code.to_string()));
    }

    fn on_detection(&self, detection: &Detection) {
        let _ = self.send(ScanEvent::Detection(detection.clone()));
    }

    fn on_camera_error(&self, error: &HumanError) {
        let _ = self.send(ScanEvent::CameraError(error.clone()));
    }

    fn on_recognition_failed(&self, error: &HumanError) {
        let _ = self.send(ScanEvent::RecognitionFailed(error.clone()));
    }
}
