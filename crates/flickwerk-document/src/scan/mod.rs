// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition for the patch engine — the `TextRecognizer` seam and the
// optional ocrs-backed implementation.

pub mod ocr;

pub use ocr::{RecognizedLine, TextRecognizer};

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;
