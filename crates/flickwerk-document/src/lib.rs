// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flickwerk-document — Document processing for the Flickwerk patch engine.
//
// Provides the PDF document/annotation model (open, inspect, add/remove
// patch annotations, save), image-to-PDF composition for captured pages,
// page-raster helpers, and the text-recognition seam.

pub mod pdf;
pub mod raster;
pub mod scan;

// Re-export the primary types so callers can use `flickwerk_document::PatchDocument` etc.
pub use pdf::composer::PdfComposer;
pub use pdf::document::{PatchDocument, StoredPatch};
pub use raster::PageRenderer;
pub use scan::ocr::{RecognizedLine, TextRecognizer};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsRecognizer;
