// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The patch engine — owns the single active edit session and drives the
// Idle → Drawing → Editing lifecycle.
//
// All mutation happens on the UI thread that owns the engine; background
// work (recognition, rendering on other platforms) is marshalled back
// before any of these methods run. Gesture callbacks from the original
// delegate-based design are replaced with typed return values
// (`DragOutcome`, `ReopenOutcome`, `CancelOutcome`) that the hosting UI
// pattern-matches on.

use image::RgbaImage;
use tracing::{debug, info, instrument, warn};

use flickwerk_core::config::EngineConfig;
use flickwerk_core::error::FlickwerkError;
use flickwerk_core::geometry::{PageRect, ViewPoint, ViewRect, ViewerLayout};
use flickwerk_core::types::{PatchAttributes, PatchId, SessionId};
use flickwerk_document::raster::PageRenderer;
use flickwerk_document::scan::TextRecognizer;
use flickwerk_document::PatchDocument;

use crate::probe::RegionProbe;
use crate::render::PatchRasterizer;
use crate::session::{EditPhase, RollbackSlot, TextEditData};

/// What an ended drag gesture produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The rectangle was noise (sub-threshold or off-page); nothing opened.
    Ignored,
    /// An edit session opened.
    Opened(SessionView),
}

/// What a double-tap on the page produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReopenOutcome {
    /// No patch annotation under the tap.
    NoPatch,
    /// The patch was removed from the page and a session opened from its
    /// stored attributes.
    Opened(SessionView),
}

/// How a cancel resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// A fresh session was discarded; the page is untouched.
    Discarded,
    /// A reopened session was discarded and the original patch restored.
    Restored(PatchId),
}

/// A committed patch, for the UI to acknowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedPatch {
    pub id: PatchId,
    pub page_number: u32,
    pub bounds: PageRect,
}

/// Read-only snapshot of the active session, handed to the UI when a
/// session opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub id: SessionId,
    pub page_number: u32,
    pub bounds: PageRect,
    pub original_text: String,
    pub attributes: PatchAttributes,
}

impl SessionView {
    fn of(data: &TextEditData) -> Self {
        Self {
            id: data.id,
            page_number: data.page_number,
            bounds: data.bounds,
            original_text: data.original_text.clone(),
            attributes: data.attributes.clone(),
        }
    }
}

/// The in-place text patch engine.
///
/// Construct one per open document with the platform's renderer and
/// recognizer plus a rasterizer; feed it gestures and style mutations;
/// read the preview and overlay frame back out.
pub struct PatchEngine {
    config: EngineConfig,
    document: PatchDocument,
    renderer: Box<dyn PageRenderer>,
    recognizer: Box<dyn TextRecognizer>,
    rasterizer: Box<dyn PatchRasterizer>,
    phase: EditPhase,
    session: Option<TextEditData>,
    rollback: Option<RollbackSlot>,
    preview: Option<RgbaImage>,
    /// Monotone counter ordering preview renders. A consumer holding an
    /// older version knows its bitmap is stale.
    preview_version: u64,
}

impl PatchEngine {
    pub fn new(
        document: PatchDocument,
        renderer: Box<dyn PageRenderer>,
        recognizer: Box<dyn TextRecognizer>,
        rasterizer: Box<dyn PatchRasterizer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            config,
            document,
            renderer,
            recognizer,
            rasterizer,
            phase: EditPhase::Idle,
            session: None,
            rollback: None,
            preview: None,
            preview_version: 0,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn document(&self) -> &PatchDocument {
        &self.document
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&TextEditData> {
        self.session.as_ref()
    }

    /// The latest preview bitmap, if a session is active.
    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    pub fn preview_version(&self) -> u64 {
        self.preview_version
    }

    /// The overlay's on-screen alpha. Transparency is a display hint so the
    /// user can align against the original content; the committed raster is
    /// always opaque.
    pub fn overlay_alpha(&self) -> f32 {
        match &self.session {
            Some(data) if data.attributes.is_transparent => self.config.preview_alpha,
            _ => 1.0,
        }
    }

    /// Consume the engine and hand the document back.
    pub fn into_document(self) -> PatchDocument {
        self.document
    }

    // -- Drawing gesture ------------------------------------------------------

    /// A selection drag started. Returns `false` (and stays put) while a
    /// session is active — the drawing gesture is only armed when idle.
    pub fn begin_drag(&mut self) -> bool {
        if self.phase != EditPhase::Idle {
            debug!(phase = ?self.phase, "drag refused; session active");
            return false;
        }
        self.phase = EditPhase::Drawing;
        true
    }

    /// The drag was abandoned before it ended (e.g. the gesture cancelled).
    pub fn abort_drag(&mut self) {
        if self.phase == EditPhase::Drawing {
            self.phase = EditPhase::Idle;
        }
    }

    /// The selection drag ended with `selection` in view coordinates.
    ///
    /// Sub-threshold rectangles and rectangles over no page are discarded
    /// as noise. Otherwise the region is probed synchronously and a session
    /// opens seeded with the recognized text and inferred font size.
    #[instrument(skip(self, layout), fields(?selection))]
    pub fn end_drag(
        &mut self,
        selection: ViewRect,
        layout: &ViewerLayout,
    ) -> Result<DragOutcome, FlickwerkError> {
        if self.phase != EditPhase::Drawing {
            return Err(FlickwerkError::SessionState(format!(
                "end_drag in phase {:?}",
                self.phase
            )));
        }
        self.phase = EditPhase::Idle;

        if selection.width < self.config.min_selection
            || selection.height < self.config.min_selection
        {
            debug!("selection below minimum size; treated as tap noise");
            return Ok(DragOutcome::Ignored);
        }

        let Some((page_number, bounds)) = layout.locate_rect(selection) else {
            debug!("selection center over no page");
            return Ok(DragOutcome::Ignored);
        };

        let probe = RegionProbe::new(&*self.renderer, &*self.recognizer, &self.config);
        let seed = probe.probe(&self.document, page_number, bounds);

        let data = TextEditData::from_probe(page_number, bounds, seed);
        let view = SessionView::of(&data);
        self.session = Some(data);
        self.render_preview()?;
        self.phase = EditPhase::Editing;

        info!(page_number, "edit session opened");
        Ok(DragOutcome::Opened(view))
    }

    // -- Reopening ------------------------------------------------------------

    /// A double-tap landed at `tap`. If a patch annotation is under it, the
    /// annotation is removed from the page, stashed for rollback, and a
    /// session opens from its stored attributes.
    ///
    /// Malformed stored attributes abort the reopen and leave the
    /// annotation in place.
    #[instrument(skip(self, layout), fields(?tap))]
    pub fn reopen_at(
        &mut self,
        tap: ViewPoint,
        layout: &ViewerLayout,
    ) -> Result<ReopenOutcome, FlickwerkError> {
        if self.phase != EditPhase::Idle {
            return Err(FlickwerkError::SessionState(format!(
                "reopen_at in phase {:?}",
                self.phase
            )));
        }

        let Some((page_number, point)) = layout.locate_point(tap) else {
            return Ok(ReopenOutcome::NoPatch);
        };

        let Some(patch) = self.document.patch_at(page_number, point)? else {
            return Ok(ReopenOutcome::NoPatch);
        };

        self.document.remove_patch(page_number, patch.id)?;
        let data = TextEditData::from_stored(page_number, &patch);
        let view = SessionView::of(&data);
        self.rollback = Some(RollbackSlot {
            page_number,
            patch,
        });
        self.session = Some(data);
        self.render_preview()?;
        self.phase = EditPhase::Editing;

        info!(page_number, "patch reopened for editing");
        Ok(ReopenOutcome::Opened(view))
    }

    // -- Style and text mutation ----------------------------------------------

    /// Replace the session text. Returns whether the preview re-rendered.
    pub fn set_text(&mut self, text: &str) -> Result<bool, FlickwerkError> {
        self.mutate(|data| data.attributes.text = text.to_string())
    }

    pub fn set_font_size(&mut self, font_size: f32) -> Result<bool, FlickwerkError> {
        self.mutate(|data| data.attributes.font_size = font_size)
    }

    pub fn set_letter_spacing(&mut self, letter_spacing: f32) -> Result<bool, FlickwerkError> {
        self.mutate(|data| data.attributes.letter_spacing = letter_spacing)
    }

    pub fn set_line_spacing(&mut self, line_spacing: f32) -> Result<bool, FlickwerkError> {
        self.mutate(|data| data.attributes.line_spacing = line_spacing)
    }

    pub fn set_transparent(&mut self, is_transparent: bool) -> Result<bool, FlickwerkError> {
        self.mutate(|data| data.attributes.is_transparent = is_transparent)
    }

    /// Set the text colour. The value is validated before it is applied, so
    /// an invalid string leaves the session untouched.
    pub fn set_color(&mut self, color_hex: &str) -> Result<bool, FlickwerkError> {
        let mut trial = PatchAttributes::default();
        trial.color_hex = color_hex.to_string();
        trial.color_rgb()?;
        self.mutate(|data| data.attributes.color_hex = color_hex.to_string())
    }

    /// Apply a mutation and re-render the preview when the change is
    /// render-relevant. Mutations apply in call order; because rendering is
    /// synchronous the newest preview always wins.
    fn mutate(
        &mut self,
        apply: impl FnOnce(&mut TextEditData),
    ) -> Result<bool, FlickwerkError> {
        let data = self.session.as_mut().ok_or_else(|| {
            FlickwerkError::SessionState("no active edit session".to_string())
        })?;

        let before = data.clone();
        apply(data);
        if data.same_rendering(&before) {
            return Ok(false);
        }
        self.render_preview()?;
        Ok(true)
    }

    // -- Overlay geometry -----------------------------------------------------

    /// The overlay's current view frame, derived from the authoritative
    /// page-space bounds through the given layout. Call on every
    /// scroll/zoom change notification.
    pub fn overlay_frame(&self, layout: &ViewerLayout) -> Option<ViewRect> {
        let data = self.session.as_ref()?;
        layout.project_rect(data.page_number, data.bounds)
    }

    /// The user dragged the overlay to `frame`. Writes new page-space
    /// bounds back through the current transform and re-renders the
    /// preview at the new canvas size. Returns the new bounds.
    #[instrument(skip(self, layout), fields(?frame))]
    pub fn drag_overlay(
        &mut self,
        frame: ViewRect,
        layout: &ViewerLayout,
    ) -> Result<PageRect, FlickwerkError> {
        let data = self.session.as_mut().ok_or_else(|| {
            FlickwerkError::SessionState("no active edit session".to_string())
        })?;

        let bounds = layout
            .unproject_rect(data.page_number, frame)
            .ok_or_else(|| {
                FlickwerkError::SessionState("session page missing from layout".to_string())
            })?;

        if bounds != data.bounds {
            data.bounds = bounds;
            self.render_preview()?;
        }
        Ok(bounds)
    }

    // -- Commit / cancel ------------------------------------------------------

    /// Bake the session into the page as a patch annotation and close it.
    #[instrument(skip(self))]
    pub fn commit(&mut self) -> Result<CommittedPatch, FlickwerkError> {
        if self.phase != EditPhase::Editing {
            return Err(FlickwerkError::SessionState(format!(
                "commit in phase {:?}",
                self.phase
            )));
        }
        let data = self.session.clone().ok_or_else(|| {
            FlickwerkError::SessionState("editing phase without session".to_string())
        })?;

        // Final raster from the same pure renderer the preview used, so the
        // saved result matches what was previewed. The session stays intact
        // until the annotation lands, so a failed render leaves the editor
        // usable.
        let raster = self.rasterizer.render(&data.render_spec())?;
        let id = self
            .document
            .add_patch(data.page_number, data.bounds, &raster, &data.attributes)?;

        self.close_session();
        info!(%id, page_number = data.page_number, "patch committed");
        Ok(CommittedPatch {
            id,
            page_number: data.page_number,
            bounds: data.bounds,
        })
    }

    /// Discard the session. A reopened patch is restored verbatim from the
    /// rollback slot; a fresh session leaves the page untouched.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) -> Result<CancelOutcome, FlickwerkError> {
        match self.phase {
            EditPhase::Drawing => {
                self.phase = EditPhase::Idle;
                return Ok(CancelOutcome::Discarded);
            }
            EditPhase::Editing => {}
            EditPhase::Idle => {
                return Err(FlickwerkError::SessionState(
                    "cancel with no active session".to_string(),
                ));
            }
        }

        let rollback = self.rollback.take();
        self.close_session();

        match rollback {
            Some(slot) => {
                // The rasterizer is pure, so re-rendering the stored
                // attributes reproduces the appearance the patch was
                // committed with.
                let spec = crate::render::RenderSpec {
                    text: slot.patch.attributes.text.clone(),
                    width: slot.patch.bounds.width,
                    height: slot.patch.bounds.height,
                    attributes: slot.patch.attributes.clone(),
                };
                let raster = self.rasterizer.render(&spec)?;
                self.document
                    .restore_patch(slot.page_number, &slot.patch, &raster)?;
                info!(id = %slot.patch.id, "reopened patch restored on cancel");
                Ok(CancelOutcome::Restored(slot.patch.id))
            }
            None => {
                debug!("fresh session discarded");
                Ok(CancelOutcome::Discarded)
            }
        }
    }

    // -- Persistence ----------------------------------------------------------

    /// Save the document. Refused while a session is active: a reopened
    /// patch is off the page until the session resolves, and saving then
    /// would silently drop it.
    pub fn save_document(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), FlickwerkError> {
        if self.session.is_some() || self.phase != EditPhase::Idle {
            warn!("save refused while edit session active");
            return Err(FlickwerkError::SessionActive);
        }
        self.document.save(path)
    }

    // -- Internals ------------------------------------------------------------

    fn render_preview(&mut self) -> Result<(), FlickwerkError> {
        let data = self.session.as_ref().ok_or_else(|| {
            FlickwerkError::SessionState("render without session".to_string())
        })?;
        let raster = self.rasterizer.render(&data.render_spec())?;
        self.preview = Some(raster);
        self.preview_version += 1;
        Ok(())
    }

    fn close_session(&mut self) {
        self.session = None;
        self.rollback = None;
        self.preview = None;
        self.phase = EditPhase::Idle;
    }
}
