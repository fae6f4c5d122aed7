// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// chipscan-scanner — The scan session.
//
// A `ScanController` wires a frame source, a recognizer and an observer into
// one timer-driven, single-flight scan loop. `spawn` starts it and returns the
// `ScannerHandle` that owns the session until it is closed.

pub mod controller;
pub mod observer;
pub mod session;

pub use controller::ScanController;
pub use observer::{ScanEvent, ScanObserver};
pub use session::{ScannerHandle, SessionSnapshot, Trigger};
