// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region probing — seed an edit session from a user-selected page region.
//
// Pipeline: render the target page to an opaque bitmap at page-native
// resolution, crop the scaled region, recognize text, and infer a font
// size from the recognized line geometry. Every failure path degrades to
// an empty seed with the default font size — region selection must never
// block the editor from opening.

use image::DynamicImage;
use tracing::{debug, instrument, warn};

use flickwerk_core::config::EngineConfig;
use flickwerk_core::geometry::{PageRect, rotate_rect_to_display};
use flickwerk_document::raster::{PageRenderer, compose_opaque, crop_region};
use flickwerk_document::scan::TextRecognizer;
use flickwerk_document::PatchDocument;

/// Seed values for a new edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Recognized lines joined with `\n`, in the recognizer's reported
    /// order. Empty when nothing was recognized.
    pub text: String,
    /// Inferred font size in points: the average recognized line height
    /// scaled by the region height. Earlier attempts applied an extra
    /// shrink factor and consistently undersized the text.
    pub font_size: f32,
}

/// Runs the render → crop → recognize pipeline for one region.
pub struct RegionProbe<'a> {
    renderer: &'a dyn PageRenderer,
    recognizer: &'a dyn TextRecognizer,
    config: &'a EngineConfig,
}

impl<'a> RegionProbe<'a> {
    pub fn new(
        renderer: &'a dyn PageRenderer,
        recognizer: &'a dyn TextRecognizer,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            renderer,
            recognizer,
            config,
        }
    }

    /// Probe a page-space region for seed text and font size.
    #[instrument(skip(self, document), fields(page_number, ?rect))]
    pub fn probe(&self, document: &PatchDocument, page_number: u32, rect: PageRect) -> ProbeResult {
        let empty = ProbeResult {
            text: String::new(),
            font_size: self.config.default_font_size,
        };

        let bounds = match document.page_bounds(page_number) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!(%err, "cannot read page bounds; opening empty session");
                return empty;
            }
        };
        let rotation = match document.page_rotation(page_number) {
            Ok(rotation) => rotation,
            Err(err) => {
                warn!(%err, "cannot read page rotation; opening empty session");
                return empty;
            }
        };

        // The renderer outputs the page upright (rotation applied), so the
        // crop runs in display space.
        let display_rect = rotate_rect_to_display(rect, rotation, bounds.width, bounds.height);
        let (display_w, display_h) = if rotation.is_quarter_turn() {
            (bounds.height, bounds.width)
        } else {
            (bounds.width, bounds.height)
        };

        // Page-native resolution: one pixel per page unit.
        let px_w = display_w.round().max(1.0) as u32;
        let px_h = display_h.round().max(1.0) as u32;
        let rendered = match self.renderer.render_page(document, page_number, px_w, px_h) {
            Ok(image) => image,
            Err(err) => {
                warn!(%err, "page render failed; opening empty session");
                return empty;
            }
        };

        let opaque = compose_opaque(&rendered);
        let crop = match crop_region(&opaque, display_rect, display_w, display_h) {
            Ok(crop) => crop,
            Err(err) => {
                // Degenerate rectangles land here.
                warn!(%err, "crop failed; opening empty session");
                return empty;
            }
        };

        let lines = self.recognizer.recognize(
            &DynamicImage::ImageRgba8(crop),
            &self.config.language_hints,
        );
        if lines.is_empty() {
            debug!("no text recognized in region");
            return empty;
        }

        // Average line height in region-relative units × region height =
        // font size in points. The average line height IS the font size.
        let mean_height: f32 =
            lines.iter().map(|l| l.bounds.height).sum::<f32>() / lines.len() as f32;
        let mut font_size = mean_height * rect.height;
        if !font_size.is_finite() || font_size <= 0.0 {
            font_size = self.config.default_font_size;
        }

        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            lines = lines.len(),
            font_size,
            "region probe complete"
        );
        ProbeResult { text, font_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flickwerk_core::error::FlickwerkError;
    use flickwerk_core::geometry::RelativeRect;
    use flickwerk_core::types::{LanguageHint, PaperSize};
    use flickwerk_document::scan::RecognizedLine;
    use flickwerk_document::PdfComposer;
    use image::{Rgba, RgbaImage};

    struct FlatRenderer;

    impl PageRenderer for FlatRenderer {
        fn render_page(
            &self,
            _document: &PatchDocument,
            _page_number: u32,
            width: u32,
            height: u32,
        ) -> Result<DynamicImage, FlickwerkError> {
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                width,
                height,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render_page(
            &self,
            _document: &PatchDocument,
            _page_number: u32,
            _width: u32,
            _height: u32,
        ) -> Result<DynamicImage, FlickwerkError> {
            Err(FlickwerkError::ImageError("renderer offline".into()))
        }
    }

    struct ScriptedRecognizer {
        lines: Vec<RecognizedLine>,
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, _image: &DynamicImage, _hints: &[LanguageHint]) -> Vec<RecognizedLine> {
            self.lines.clone()
        }
    }

    fn document() -> PatchDocument {
        let bytes = PdfComposer::new(PaperSize::A4).blank_document(1).unwrap();
        PatchDocument::from_bytes(&bytes).unwrap()
    }

    fn line(text: &str, rel_height: f32) -> RecognizedLine {
        RecognizedLine {
            text: text.into(),
            bounds: RelativeRect::new(0.0, 0.1, 0.9, rel_height),
        }
    }

    #[test]
    fn font_size_is_mean_line_height_times_region_height() {
        let doc = document();
        let recognizer = ScriptedRecognizer {
            lines: vec![line("first", 0.25), line("second", 0.35)],
        };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FlatRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 1, PageRect::new(100.0, 500.0, 200.0, 40.0));
        // mean(0.25, 0.35) * 40 = 12.
        assert!((result.font_size - 12.0).abs() < 1e-4, "{}", result.font_size);
        assert_eq!(result.text, "first\nsecond");
    }

    #[test]
    fn lines_join_in_reported_order() {
        let doc = document();
        let recognizer = ScriptedRecognizer {
            lines: vec![line("b", 0.2), line("a", 0.2), line("c", 0.2)],
        };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FlatRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 1, PageRect::new(50.0, 50.0, 100.0, 30.0));
        assert_eq!(result.text, "b\na\nc");
    }

    #[test]
    fn no_lines_yields_empty_text_and_default_size() {
        let doc = document();
        let recognizer = ScriptedRecognizer { lines: vec![] };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FlatRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 1, PageRect::new(50.0, 50.0, 100.0, 30.0));
        assert_eq!(result.text, "");
        assert_eq!(result.font_size, config.default_font_size);
    }

    #[test]
    fn renderer_failure_degrades_to_empty_seed() {
        let doc = document();
        let recognizer = ScriptedRecognizer {
            lines: vec![line("never seen", 0.5)],
        };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FailingRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 1, PageRect::new(50.0, 50.0, 100.0, 30.0));
        assert_eq!(result.text, "");
        assert_eq!(result.font_size, config.default_font_size);
    }

    #[test]
    fn degenerate_rect_degrades_to_empty_seed() {
        let doc = document();
        let recognizer = ScriptedRecognizer {
            lines: vec![line("never seen", 0.5)],
        };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FlatRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 1, PageRect::new(50.0, 50.0, 0.0, 0.0));
        assert_eq!(result.text, "");
        assert_eq!(result.font_size, config.default_font_size);
    }

    #[test]
    fn out_of_range_page_degrades_to_empty_seed() {
        let doc = document();
        let recognizer = ScriptedRecognizer { lines: vec![] };
        let config = EngineConfig::default();
        let probe = RegionProbe::new(&FlatRenderer, &recognizer, &config);

        let result = probe.probe(&doc, 99, PageRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(result.text, "");
    }
}
