// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flickwerk-patch — The in-place PDF text patch engine.
//
// Draw a box over existing PDF text, OCR-seed the region, edit the text
// with live style controls, and bake the edit back into the document as a
// rasterized stamp annotation positioned in page space. The engine owns
// the edit-session state machine and the synchronization between the
// floating overlay and the scrollable page view.

pub mod engine;
pub mod probe;
pub mod render;
pub mod session;

pub use engine::{
    CancelOutcome, CommittedPatch, DragOutcome, PatchEngine, ReopenOutcome, SessionView,
};
pub use probe::{ProbeResult, RegionProbe};
pub use render::{GlyphRasterizer, PatchRasterizer, RenderSpec};
pub use session::{EditPhase, TextEditData};
