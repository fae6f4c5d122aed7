// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// chipscan-bridge — Camera abstraction for the scan loop.
//
// Defines the `FrameSource` trait, the platform dispatch for the live camera,
// and a replay source that serves still images as a stream.

pub mod replay;
pub mod stub;
pub mod traits;

use chipscan_core::types::CameraConstraints;

pub use replay::ReplaySource;
pub use stub::StubCamera;
pub use traits::FrameSource;

/// Open the platform camera with the given constraints.
///
/// No native backend is linked into this build, so this returns the stub,
/// whose captures fail with `CaptureUnavailable(Unsupported)`.
pub fn platform_camera(constraints: CameraConstraints) -> Box<dyn FrameSource> {
    tracing::debug!(facing = ?constraints.facing, "Opening platform camera");
    Box::new(StubCamera::new(constraints))
}
