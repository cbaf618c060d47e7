// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF operations — the patchable document model and the image-to-PDF
// composer.

pub mod composer;
pub mod document;

pub use composer::PdfComposer;
pub use document::{PatchDocument, StoredPatch};
