// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition seam. The contract between the scan loop and whichever OCR
// engine is plugged in is "give image, stream progress, return text".

use std::future::Future;

use chipscan_core::error::Result;
use chipscan_core::types::Frame;
use tokio::sync::watch;

/// Text produced by one recognition pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub text: String,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Write side of a recognition's progress stream.
///
/// Values are percentages in `0..=100` and never go backwards: a report
/// lower than the current value is ignored.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<u8>,
}

impl ProgressReporter {
    /// Create a reporter starting at 0 and the receiver that observes it.
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// Report progress as a percentage.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// Report progress as a fraction in `0.0..=1.0`, the unit most engines use.
    pub fn report_fraction(&self, fraction: f32) {
        if fraction.is_finite() {
            self.report((fraction.clamp(0.0, 1.0) * 100.0).round() as u8);
        }
    }

    /// Whether the scan loop has stopped listening to this run.
    ///
    /// Blocking engines should check this between stages and bail out.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolve once the scan loop has stopped listening to this run.
    pub async fn abandoned(&self) {
        self.tx.closed().await;
    }
}

/// An OCR engine the scan loop can drive.
///
/// Implementations may run the heavy work on a worker thread but must not
/// block the caller. Engine faults are reported as
/// [`ScanError::Recognition`](chipscan_core::ScanError::Recognition).
///
/// The returned future must not resolve before the engine has stopped
/// working on `image`: the scan loop waits on it to keep a single run in
/// flight. When the loop gives up on a run (timeout, teardown) it drops the
/// progress receiver; engines should then stop early, see
/// [`ProgressReporter::is_abandoned`].
pub trait Recognizer: Send + Sync + 'static {
    fn recognize(
        &self,
        image: Frame,
        progress: ProgressReporter,
    ) -> impl Future<Output = Result<RecognitionResult>> + Send;
}
