// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flickwerk.

use thiserror::Error;

/// Top-level error type for all Flickwerk operations.
#[derive(Debug, Error)]
pub enum FlickwerkError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Patch engine errors --
    #[error("patch rendering failed: {0}")]
    RenderError(String),

    #[error("typeface unavailable: {0}")]
    TypefaceUnavailable(String),

    #[error("invalid colour string: {0}")]
    InvalidColor(String),

    #[error("edit session in wrong state: {0}")]
    SessionState(String),

    #[error("an edit session is active; resolve it before saving")]
    SessionActive,

    #[error("no patch annotation found at the requested location")]
    PatchNotFound,

    #[error("stored patch attributes are malformed: {0}")]
    MalformedPatchData(String),

    // -- Integrity --
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlickwerkError>;
