// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session handle and the state it publishes.
//
// A session lives exactly as long as its `ScannerHandle`. Closing (or
// dropping) the handle cancels the timer and abandons any in-flight
// recognition; the session task exits and nothing is reported afterwards.

use chipscan_core::error::{Result, ScanError};
use chipscan_core::human_errors::HumanError;
use chipscan_core::types::{Detection, ScanState, SessionId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

/// Observable state of a scan session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: ScanState,
    /// Recognition progress in `0..=100`; reset to 0 between cycles.
    pub progress: u8,
    /// Text of the most recent finished recognition.
    pub last_detection: Option<Detection>,
    /// Set once the camera has failed. The session no longer captures.
    pub camera_error: Option<HumanError>,
    pub high_contrast: bool,
    /// Cycles that ran to completion (success, failure, or empty crop).
    pub cycles: u64,
}

impl SessionSnapshot {
    pub(crate) fn new(session_id: SessionId, high_contrast: bool) -> Self {
        Self {
            session_id,
            state: ScanState::Idle,
            progress: 0,
            last_detection: None,
            camera_error: None,
            high_contrast,
            cycles: 0,
        }
    }

    /// Whether the camera failed and the session stopped capturing.
    pub fn is_halted(&self) -> bool {
        self.camera_error.is_some()
    }

    /// Whether a cycle is currently running.
    pub fn is_busy(&self) -> bool {
        self.state != ScanState::Idle
    }
}

/// Owner-side handle to a running scan session.
pub struct ScannerHandle {
    session_id: SessionId,
    triggers: mpsc::Sender<Trigger>,
    high_contrast: watch::Sender<bool>,
    snapshot: watch::Receiver<SessionSnapshot>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ScannerHandle {
    pub(crate) fn new(
        session_id: SessionId,
        triggers: mpsc::Sender<Trigger>,
        high_contrast: watch::Sender<bool>,
        snapshot: watch::Receiver<SessionSnapshot>,
        shutdown: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            session_id,
            triggers,
            high_contrast,
            snapshot,
            shutdown,
            task: Some(task),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Request an immediate capture.
    ///
    /// The request is dropped, not queued, if a cycle is already running.
    pub fn capture_now(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(ScanError::SessionClosed);
        }
        match self.triggers.try_send(Trigger::Manual) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(session = %self.session_id, "Trigger queue full; manual capture dropped");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ScanError::SessionClosed),
        }
    }

    /// Switch the high-contrast pass on or off for subsequent cycles.
    pub fn set_high_contrast(&self, enabled: bool) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(ScanError::SessionClosed);
        }
        self.high_contrast.send_replace(enabled);
        Ok(())
    }

    /// Current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch the session state. The stream ends when the session task exits.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Tear the session down and wait for its task to exit.
    ///
    /// After this returns the session is inert: no captures, no callbacks.
    pub async fn close(mut self) {
        info!(session = %self.session_id, "Closing scan session");
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(session = %self.session_id, error = %err, "Scan session task failed");
            }
        }
    }
}

impl Drop for ScannerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_snapshot_is_idle() {
        let snapshot = SessionSnapshot::new(SessionId::new(), true);
        assert_eq!(snapshot.state, ScanState::Idle);
        assert!(!snapshot.is_busy());
        assert!(!snapshot.is_halted());
        assert!(snapshot.high_contrast);
        assert_eq!(snapshot.cycles, 0);
    }
}
