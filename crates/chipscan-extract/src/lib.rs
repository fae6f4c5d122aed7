// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// chipscan-extract — Turns raw OCR text into a single chip code.
//
// Provides word normalization (uppercase, `[A-Z0-9-]` only, optional
// look-alike remapping) and the two-tier candidate selector.

pub mod normalize;
pub mod select;

pub use normalize::{NormalizeMode, normalize};
pub use select::{Candidate, CandidateSelector};
