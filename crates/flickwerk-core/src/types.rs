// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Flickwerk patch engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlickwerkError;

/// Unique identifier for one in-progress edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a committed patch annotation.
///
/// Persisted as the annotation's `/NM` (annotation name) entry so that a
/// patch can be located and removed when the user re-edits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchId(pub Uuid);

impl PatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a `/NM` string back into a patch id.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for PatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Style and content attributes of one text patch.
///
/// This struct is the serialized side-channel persisted on the annotation
/// (`/PatchData`), so edits are re-openable: reopening a patch seeds a new
/// edit session from exactly these values. The JSON field names are part of
/// the persisted format and must not change.
///
/// `is_transparent` is a display hint only — it drives the editing overlay's
/// on-screen alpha so the user can see the original content underneath for
/// alignment. The committed raster is always opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchAttributes {
    /// Current text content of the patch.
    pub text: String,
    /// Font size in points.
    pub font_size: f32,
    /// Font family name (informational; the rasterizer draws with its
    /// configured typeface).
    pub font_name: String,
    /// Text colour as `#RRGGBB`.
    pub color_hex: String,
    /// Extra vertical space between lines, in points.
    pub line_spacing: f32,
    /// Extra horizontal advance per glyph (kerning adjustment), in points.
    pub letter_spacing: f32,
    /// Whether the editing overlay is drawn semi-transparent on screen.
    pub is_transparent: bool,
}

impl Default for PatchAttributes {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 12.0,
            font_name: "Helvetica".to_string(),
            color_hex: "#000000".to_string(),
            line_spacing: 0.0,
            letter_spacing: 0.0,
            is_transparent: false,
        }
    }
}

impl PatchAttributes {
    /// Parse `color_hex` into RGB components.
    ///
    /// Accepts `#RRGGBB` (leading `#` optional).
    pub fn color_rgb(&self) -> Result<[u8; 3], FlickwerkError> {
        let raw = self.color_hex.trim_start_matches('#');
        if raw.len() != 6 {
            return Err(FlickwerkError::InvalidColor(self.color_hex.clone()));
        }
        let bytes = hex::decode(raw)
            .map_err(|_| FlickwerkError::InvalidColor(self.color_hex.clone()))?;
        Ok([bytes[0], bytes[1], bytes[2]])
    }
}

/// Script hints passed to the text recognizer.
///
/// Documents may mix languages, so recognition always runs with the full
/// configured hint set rather than a single language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageHint {
    /// Latin-script languages (English, German, French, ...).
    Latin,
    /// Han-script languages (Chinese; also Japanese kanji).
    Han,
    /// Japanese kana.
    Kana,
    /// Korean hangul.
    Hangul,
    /// Cyrillic-script languages.
    Cyrillic,
}

/// Standard paper sizes for composed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Document information read from the PDF /Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
}
