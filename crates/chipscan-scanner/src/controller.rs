// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan loop controller.
//
// One task per session owns the camera, the recognizer and the observer. The
// interval timer and manual triggers are events on the same loop, so the
// single-flight check needs no locking: a trigger that arrives while a cycle
// is running is dropped on the spot.
//
//   Idle -> Capturing -> Recognizing -> Idle
//
// Capture, crop and enhance run inline on the loop. Recognition runs on its
// own task so the loop keeps serving progress, toggles and shutdown.
//
// A recognition that times out is abandoned, not killed: engines may be busy
// on a blocking thread that cannot be interrupted. The loop drops the run's
// progress receiver, reports the timeout, and keeps dropping triggers until
// the abandoned run has actually finished.

use std::sync::Arc;
use std::time::Duration;

use chipscan_bridge::FrameSource;
use chipscan_core::config::ScannerConfig;
use chipscan_core::error::{Result, ScanError};
use chipscan_core::human_errors::humanize_error;
use chipscan_core::types::{Detection, RoiSpec, ScanState, SessionId};
use chipscan_extract::{Candidate, CandidateSelector};
use chipscan_vision::{Preprocessor, ProgressReporter, RecognitionResult, Recognizer, crop};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::observer::ScanObserver;
use crate::session::{ScannerHandle, SessionSnapshot, Trigger};

/// Pending manual triggers beyond this are dropped by the handle.
const TRIGGER_QUEUE_DEPTH: usize = 4;

type RecognitionTask = JoinHandle<Result<RecognitionResult>>;

/// Drives the capture → crop → enhance → recognize → select pipeline.
pub struct ScanController<S, R, O> {
    session_id: SessionId,
    source: S,
    recognizer: Arc<R>,
    observer: O,
    roi: RoiSpec,
    preprocessor: Preprocessor,
    selector: CandidateSelector,
    scan_interval: Duration,
    recognition_timeout: Option<Duration>,
    high_contrast: bool,
}

impl<S, R, O> ScanController<S, R, O>
where
    S: FrameSource,
    R: Recognizer,
    O: ScanObserver,
{
    /// Assemble a controller from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] if `config` fails validation or
    /// its prefix pattern does not compile.
    pub fn new(source: S, recognizer: R, observer: O, config: &ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session_id: SessionId::new(),
            source,
            recognizer: Arc::new(recognizer),
            observer,
            roi: config.roi,
            preprocessor: Preprocessor::from_config(&config.preprocess),
            selector: CandidateSelector::from_config(&config.selection)?,
            scan_interval: config.scan_interval(),
            recognition_timeout: config.recognition.timeout(),
            high_contrast: config.preprocess.high_contrast,
        })
    }

    /// Start the session on the current Tokio runtime.
    ///
    /// The first timer capture happens one interval from now; use
    /// [`ScannerHandle::capture_now`] for an immediate one.
    pub fn spawn(self) -> ScannerHandle {
        let session_id = self.session_id;
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_DEPTH);
        let (contrast_tx, contrast_rx) = watch::channel(self.high_contrast);
        let initial = SessionSnapshot::new(session_id, self.high_contrast);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let shutdown = CancellationToken::new();

        let session = Session {
            snapshot: initial,
            publisher: snapshot_tx,
            shutdown: shutdown.clone(),
            in_flight: None,
            draining: None,
        };
        let task = tokio::spawn(self.run(session, trigger_rx, contrast_rx));

        ScannerHandle::new(
            session_id,
            trigger_tx,
            contrast_tx,
            snapshot_rx,
            shutdown,
            task,
        )
    }

    // -- Event loop ---------------------------------------------------------

    #[instrument(skip_all, fields(session = %self.session_id, source = self.source.name()))]
    async fn run(
        mut self,
        mut session: Session,
        mut triggers: mpsc::Receiver<Trigger>,
        mut high_contrast: watch::Receiver<bool>,
    ) {
        info!(
            interval_ms = self.scan_interval.as_millis() as u64,
            "Scan session started"
        );
        let mut ticker = time::interval_at(Instant::now() + self.scan_interval, self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut toggle_live = true;

        loop {
            tokio::select! {
                biased;

                _ = session.shutdown.cancelled() => {
                    debug!("Shutdown requested");
                    break;
                }

                event = next_flight_event(&mut session.in_flight) => match event {
                    FlightEvent::Progress(percent) => {
                        session.update(|s| s.progress = percent);
                    }
                    FlightEvent::Finished(outcome) => {
                        session.in_flight = None;
                        self.finish_cycle(&mut session, outcome);
                    }
                    FlightEvent::TimedOut(limit) => {
                        if let Some(flight) = session.in_flight.take() {
                            session.draining = Some(flight.abandon());
                        }
                        warn!(
                            limit_ms = limit.as_millis() as u64,
                            "Recognition timed out; abandoning run"
                        );
                        self.finish_cycle(
                            &mut session,
                            Ok(Err(ScanError::RecognitionTimeout { elapsed: limit })),
                        );
                    }
                },

                _ = drained(&mut session.draining) => {
                    session.draining = None;
                    debug!("Abandoned recognition has stopped");
                }

                changed = high_contrast.changed(), if toggle_live => match changed {
                    Ok(()) => {
                        let enabled = *high_contrast.borrow_and_update();
                        debug!(enabled, "High contrast toggled");
                        session.update(|s| s.high_contrast = enabled);
                    }
                    Err(_) => toggle_live = false,
                },

                trigger = triggers.recv() => match trigger {
                    Some(trigger) => self.start_cycle(&mut session, trigger),
                    None => {
                        debug!("Trigger channel closed");
                        break;
                    }
                },

                _ = ticker.tick(), if !session.snapshot.is_halted() => {
                    self.start_cycle(&mut session, Trigger::Timer);
                }
            }
        }

        // At most one of these exists: no run starts while another drains.
        let pending = session
            .in_flight
            .take()
            .map(InFlight::abandon)
            .or_else(|| session.draining.take());
        if let Some(task) = pending {
            debug!("Waiting for abandoned recognition to stop");
            if let Err(err) = task.await {
                warn!(error = %err, "Abandoned recognition task failed");
            }
        }
        info!(cycles = session.snapshot.cycles, "Scan session closed");
    }

    // -- Cycle --------------------------------------------------------------

    fn start_cycle(&mut self, session: &mut Session, trigger: Trigger) {
        if session.snapshot.is_halted() {
            debug!(?trigger, "Camera unavailable; trigger ignored");
            return;
        }
        if session.in_flight.is_some() || session.snapshot.is_busy() {
            debug!(?trigger, state = ?session.snapshot.state, "Cycle in progress; trigger dropped");
            return;
        }
        if session.draining.is_some() {
            debug!(?trigger, "Abandoned recognition still running; trigger dropped");
            return;
        }

        session.update(|s| s.state = ScanState::Capturing);
        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.capture_failed(session, err);
                return;
            }
        };

        let region = crop(&frame, &self.roi);
        if region.is_empty() {
            debug!(?trigger, "Empty crop; skipping recognition");
            session.update(|s| {
                s.state = ScanState::Idle;
                s.cycles += 1;
                s.last_detection = Some(Detection::new("", None));
            });
            return;
        }
        let image = self
            .preprocessor
            .enhance(region, session.snapshot.high_contrast);
        let (width, height) = image.dimensions();

        let (reporter, progress) = ProgressReporter::channel();
        let recognizer = Arc::clone(&self.recognizer);
        let task = tokio::spawn(async move { recognizer.recognize(image, reporter).await });

        session.in_flight = Some(InFlight {
            task,
            progress,
            progress_live: true,
            deadline: self
                .recognition_timeout
                .map(|limit| (Instant::now() + limit, limit)),
        });
        session.update(|s| {
            s.state = ScanState::Recognizing;
            s.progress = 0;
        });
        debug!(?trigger, width, height, "Recognition started");
    }

    fn capture_failed(&self, session: &mut Session, err: ScanError) {
        if !err.is_terminal() {
            warn!(error = %err, "Capture failed; retrying next cycle");
            session.update(|s| s.state = ScanState::Idle);
            return;
        }

        error!(error = %err, "Camera unavailable; scan timer halted");
        let human = humanize_error(&err);
        session.update(|s| {
            s.state = ScanState::Idle;
            s.camera_error = Some(human.clone());
        });
        if !session.shutdown.is_cancelled() {
            self.observer.on_camera_error(&human);
        }
    }

    fn finish_cycle(
        &self,
        session: &mut Session,
        outcome: std::result::Result<Result<RecognitionResult>, JoinError>,
    ) {
        let outcome = outcome.unwrap_or_else(|err| {
            Err(ScanError::Recognition(format!("recognition task failed: {err}")))
        });

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Recognition failed; continuing");
                session.update(|s| {
                    s.state = ScanState::Idle;
                    s.progress = 0;
                    s.cycles += 1;
                });
                if !session.shutdown.is_cancelled() {
                    self.observer.on_recognition_failed(&humanize_error(&err));
                }
                return;
            }
        };

        let candidate = self.selector.select(&result.text);
        if let Some(code) = &candidate {
            info!(code = %code, prefix_match = code.prefix_match, "Chip code found");
        }
        let detection = Detection::new(&result.text, candidate.map(Candidate::into_string));
        session.update(|s| {
            s.state = ScanState::Idle;
            s.progress = 0;
            s.cycles += 1;
            s.last_detection = Some(detection.clone());
        });

        if session.shutdown.is_cancelled() {
            return;
        }
        self.observer.on_detection(&detection);
        match detection.candidate.as_deref() {
            Some(code) => self.observer.on_scan_result(code),
            None => debug!(raw = %detection.raw_text, "No candidate in recognized text"),
        }
    }
}

// -- Session state ----------------------------------------------------------

/// Mutable state owned by the session task.
struct Session {
    snapshot: SessionSnapshot,
    publisher: watch::Sender<SessionSnapshot>,
    shutdown: CancellationToken,
    in_flight: Option<InFlight>,
    /// A timed-out run that has not finished yet.
    draining: Option<RecognitionTask>,
}

impl Session {
    /// Apply `change` and publish the result to watchers.
    fn update(&mut self, change: impl FnOnce(&mut SessionSnapshot)) {
        change(&mut self.snapshot);
        self.publisher.send_replace(self.snapshot.clone());
    }
}

/// The one outstanding recognition.
struct InFlight {
    task: RecognitionTask,
    progress: watch::Receiver<u8>,
    progress_live: bool,
    /// When to give up, and the limit that produced it.
    deadline: Option<(Instant, Duration)>,
}

enum FlightEvent {
    Progress(u8),
    Finished(std::result::Result<Result<RecognitionResult>, JoinError>),
    TimedOut(Duration),
}

impl InFlight {
    async fn next_event(&mut self) -> FlightEvent {
        let (deadline, limit) = self
            .deadline
            .unwrap_or((Instant::now(), Duration::ZERO));
        let has_deadline = self.deadline.is_some();
        let expiry = time::sleep_until(deadline);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                biased;

                changed = self.progress.changed(), if self.progress_live => {
                    if changed.is_ok() {
                        return FlightEvent::Progress(*self.progress.borrow_and_update());
                    }
                    self.progress_live = false;
                }

                joined = &mut self.task => return FlightEvent::Finished(joined),

                _ = &mut expiry, if has_deadline => return FlightEvent::TimedOut(limit),
            }
        }
    }

    /// Stop listening to the run and hand back its task so the caller can
    /// wait for it. Dropping the progress receiver tells the engine to stop.
    fn abandon(self) -> RecognitionTask {
        drop(self.progress);
        self.task
    }
}

/// Resolve with the next event of the in-flight recognition, or never if
/// there is none.
async fn next_flight_event(flight: &mut Option<InFlight>) -> FlightEvent {
    match flight {
        Some(flight) => flight.next_event().await,
        None => std::future::pending().await,
    }
}

/// Resolve once the abandoned run has finished, or never if there is none.
async fn drained(task: &mut Option<RecognitionTask>) {
    match task {
        Some(task) => {
            let _ = task.await;
        }
        None => std::future::pending().await,
    }
}
