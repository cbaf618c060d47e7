// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::types::LanguageHint;

/// Tunables for the text patch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum width/height (in view units) a drawn selection rectangle must
    /// reach to open an edit session. Smaller drags are treated as tap noise.
    pub min_selection: f32,
    /// Font size (points) seeded when OCR finds no text in the region.
    pub default_font_size: f32,
    /// On-screen overlay alpha while a session has `is_transparent` set.
    /// Never applied to the committed raster.
    pub preview_alpha: f32,
    /// Script hints submitted with every recognition request. Documents may
    /// mix languages, so the default covers Latin and Han simultaneously.
    pub language_hints: Vec<LanguageHint>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_selection: 20.0,
            default_font_size: 12.0,
            preview_alpha: 0.45,
            language_hints: vec![LanguageHint::Latin, LanguageHint::Han],
        }
    }
}

/// Tunables for the security scanner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Files at or above this size skip the byte-level marker scan.
    /// A performance/size tradeoff, not a security guarantee.
    pub max_deep_scan_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_deep_scan_bytes: 10 * 1024 * 1024,
        }
    }
}
