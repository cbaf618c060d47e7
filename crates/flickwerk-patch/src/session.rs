// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit session state — the in-progress edit value and its lifecycle phases.

use flickwerk_core::geometry::PageRect;
use flickwerk_core::types::{PatchAttributes, SessionId};
use flickwerk_document::StoredPatch;

use crate::probe::ProbeResult;
use crate::render::RenderSpec;

/// Lifecycle phases of the patch engine.
///
/// `Idle` → `Drawing` (user drags a new selection rectangle) → `Editing`
/// (a session is active, live preview visible) → back to `Idle` on commit
/// or cancel. Reopening an existing patch enters `Editing` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Drawing,
    Editing,
}

/// One active edit session.
///
/// Owned by the engine on the UI thread; exactly one may exist per engine.
/// `bounds` is the authoritative page-space rectangle — the on-screen
/// overlay frame is always derived from it through the current viewer
/// layout, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditData {
    pub id: SessionId,
    /// 1-indexed page the session edits. A back-reference, not ownership.
    pub page_number: u32,
    /// The text recognition seeded the session with (or the stored text for
    /// a reopened patch). Unchanged by edits.
    pub original_text: String,
    /// Region being replaced, in page space. Mutable via overlay drag.
    pub bounds: PageRect,
    /// Current text and style. `attributes.text` is the live edited text.
    pub attributes: PatchAttributes,
}

impl TextEditData {
    /// Seed a fresh session from a recognition probe.
    pub fn from_probe(
        page_number: u32,
        bounds: PageRect,
        probe: ProbeResult,
    ) -> Self {
        let attributes = PatchAttributes {
            text: probe.text.clone(),
            font_size: probe.font_size,
            ..PatchAttributes::default()
        };
        Self {
            id: SessionId::new(),
            page_number,
            original_text: probe.text,
            bounds,
            attributes,
        }
    }

    /// Seed a session from a reopened patch's stored attributes.
    pub fn from_stored(page_number: u32, patch: &StoredPatch) -> Self {
        Self {
            id: SessionId::new(),
            page_number,
            original_text: patch.attributes.text.clone(),
            bounds: patch.bounds,
            attributes: patch.attributes.clone(),
        }
    }

    /// The rasterization input for the current state.
    pub fn render_spec(&self) -> RenderSpec {
        RenderSpec {
            text: self.attributes.text.clone(),
            width: self.bounds.width,
            height: self.bounds.height,
            attributes: self.attributes.clone(),
        }
    }

    /// Whether two snapshots of a session would produce the same preview.
    ///
    /// Compares identity, text, bounds, and the render-relevant attribute
    /// fields — this decides whether a mutation re-renders the preview.
    pub fn same_rendering(&self, other: &TextEditData) -> bool {
        self.id == other.id
            && self.attributes.text == other.attributes.text
            && self.bounds == other.bounds
            && self.attributes.font_size == other.attributes.font_size
            && self.attributes.line_spacing == other.attributes.line_spacing
            && self.attributes.letter_spacing == other.attributes.letter_spacing
            && self.attributes.color_hex == other.attributes.color_hex
            && self.attributes.is_transparent == other.attributes.is_transparent
    }
}

/// A reopened patch held for restoration.
///
/// Reopening removes the annotation from the page immediately; if the user
/// cancels instead of committing, the slot restores it verbatim. Without
/// this, cancel-of-reopen would silently lose the original patch.
#[derive(Debug, Clone)]
pub struct RollbackSlot {
    pub page_number: u32,
    pub patch: StoredPatch,
}
