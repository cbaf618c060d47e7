// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion,
// so the hosting UI never has to show a raw error string to the user.

use crate::error::FlickwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth retrying — the same action may succeed next time.
    Transient,
    /// User must do something (enlarge the box, close the editor, pick
    /// another file).
    ActionRequired,
    /// Cannot be fixed by retrying or user action.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the system should auto-retry.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `FlickwerkError` into a `HumanError`.
pub fn humanize_error(err: &FlickwerkError) -> HumanError {
    match err {
        // -- Document errors --
        FlickwerkError::PdfError(detail) => HumanError {
            message: "This PDF couldn't be read.".into(),
            suggestion: format!(
                "The file may be damaged. Try re-importing it or opening a copy. ({detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        FlickwerkError::ImageError(detail) => HumanError {
            message: "We couldn't process the page image.".into(),
            suggestion: format!("Try again with a different page or zoom level. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        FlickwerkError::OcrError(detail) => HumanError {
            message: "Text recognition didn't work this time.".into(),
            suggestion: format!(
                "You can still type the text yourself in the editing box. ({detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Patch engine errors --
        FlickwerkError::RenderError(detail) => HumanError {
            message: "The edited text couldn't be drawn.".into(),
            suggestion: format!("Try a different font size or colour. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        FlickwerkError::TypefaceUnavailable(detail) => HumanError {
            message: "No font is available for editing.".into(),
            suggestion: format!("Install a TrueType font or point the app at one. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlickwerkError::InvalidColor(value) => HumanError {
            message: "That colour value isn't valid.".into(),
            suggestion: format!("Pick a colour from the palette. (Got: {value})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlickwerkError::SessionState(detail) => HumanError {
            message: "That action isn't possible right now.".into(),
            suggestion: format!("Finish or cancel the current edit first. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlickwerkError::SessionActive => HumanError {
            message: "You're still editing this document.".into(),
            suggestion: "Save or discard the open edit, then save the document.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlickwerkError::PatchNotFound => HumanError {
            message: "There's no edit at that spot.".into(),
            suggestion: "Double-tap directly on a previous edit to change it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlickwerkError::MalformedPatchData(detail) => HumanError {
            message: "This edit can't be reopened.".into(),
            suggestion: format!(
                "The edit was saved by an incompatible version. It is left unchanged. ({detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Integrity --
        FlickwerkError::IntegrityMismatch { .. } => HumanError {
            message: "The document changed unexpectedly.".into(),
            suggestion: "Re-open the document and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        FlickwerkError::Io(detail) => HumanError {
            message: "The file couldn't be read or written.".into(),
            suggestion: format!("Check free space and permissions, then retry. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        FlickwerkError::Serialization(detail) => HumanError {
            message: "Something went wrong saving the edit details.".into(),
            suggestion: format!("Please try the edit again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
