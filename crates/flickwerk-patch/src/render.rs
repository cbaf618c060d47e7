// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Patch rasterization — deterministically draw styled text into an opaque
// bitmap.
//
// The same function produces both the live editing preview and the
// committed annotation image, so it must be pure: identical inputs yield
// byte-identical output. The canvas background is unconditionally opaque
// white; the `is_transparent` attribute only drives the on-screen overlay
// alpha and never reaches the raster (otherwise the original text would
// bleed through the saved document).

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::pixelops::interpolate;
use tracing::{debug, instrument};

use flickwerk_core::error::FlickwerkError;
use flickwerk_core::types::PatchAttributes;

/// Fixed top/left inset (canvas units) where text starts.
const TEXT_INSET: f32 = 2.0;

/// Rasterization input: text + canvas size + style.
///
/// Canvas dimensions equal the session's page-space bounds at 1:1 units per
/// pixel, so the saved result matches the preview exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    pub text: String,
    pub width: f32,
    pub height: f32,
    pub attributes: PatchAttributes,
}

impl RenderSpec {
    /// Pixel dimensions of the canvas (at least 1x1).
    pub fn canvas_size(&self) -> (u32, u32) {
        let w = self.width.round().max(1.0) as u32;
        let h = self.height.round().max(1.0) as u32;
        (w, h)
    }
}

/// The bitmap renderer the engine draws previews and committed patches
/// with. A pure function of its input; implementations must be
/// deterministic.
pub trait PatchRasterizer {
    fn render(&self, spec: &RenderSpec) -> Result<RgbaImage, FlickwerkError>;
}

/// Well-known typeface locations searched by
/// [`GlyphRasterizer::system_default`].
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Glyph-outline rasterizer backed by an `ab_glyph` typeface.
///
/// Text is drawn left-aligned from a small fixed inset, one glyph at a
/// time: kerning from the font plus the session's letter-spacing advance,
/// line advance = scaled line height plus the session's line-spacing.
/// Overflow past the canvas is neither clipped-by-reflow nor shrunk — the
/// user enlarges the box instead.
pub struct GlyphRasterizer {
    font: FontArc,
}

impl GlyphRasterizer {
    /// Build a rasterizer from raw TrueType/OpenType bytes.
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, FlickwerkError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|err| FlickwerkError::TypefaceUnavailable(err.to_string()))?;
        Ok(Self { font })
    }

    /// Build a rasterizer from a font file on disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_font_file(path: impl AsRef<std::path::Path>) -> Result<Self, FlickwerkError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_font_bytes(bytes)
    }

    /// Locate a usable typeface in well-known system locations.
    ///
    /// Tries each candidate path in order; the embedding application should
    /// prefer [`from_font_file`](Self::from_font_file) with its bundled
    /// font and fall back to this.
    pub fn system_default() -> Result<Self, FlickwerkError> {
        for candidate in SYSTEM_FONT_PATHS {
            let path = std::path::Path::new(candidate);
            if path.exists() {
                if let Ok(rasterizer) = Self::from_font_file(path) {
                    debug!(path = candidate, "Using system typeface");
                    return Ok(rasterizer);
                }
            }
        }
        Err(FlickwerkError::TypefaceUnavailable(format!(
            "no usable typeface found; searched {}",
            SYSTEM_FONT_PATHS.join(", ")
        )))
    }
}

impl PatchRasterizer for GlyphRasterizer {
    #[instrument(skip_all, fields(text_len = spec.text.len(), w = spec.width, h = spec.height))]
    fn render(&self, spec: &RenderSpec) -> Result<RgbaImage, FlickwerkError> {
        let (width, height) = spec.canvas_size();
        let attrs = &spec.attributes;
        let rgb = attrs.color_rgb()?;
        let color = Rgba([rgb[0], rgb[1], rgb[2], 255]);

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let scale = PxScale::from(attrs.font_size.max(1.0));
        let scaled = self.font.as_scaled(scale);
        let line_height = scaled.height();

        let mut baseline = TEXT_INSET + scaled.ascent();
        for line in spec.text.split('\n') {
            let mut caret = TEXT_INSET;
            let mut previous = None;

            for ch in line.chars() {
                if ch.is_control() {
                    continue;
                }
                let glyph_id = self.font.glyph_id(ch);
                if let Some(prev) = previous {
                    caret += scaled.kern(prev, glyph_id);
                }

                let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline));
                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|gx, gy, coverage| {
                        let px = bounds.min.x as i32 + gx as i32;
                        let py = bounds.min.y as i32 + gy as i32;
                        if coverage > 0.0
                            && px >= 0
                            && py >= 0
                            && (px as u32) < width
                            && (py as u32) < height
                        {
                            let existing = *canvas.get_pixel(px as u32, py as u32);
                            let blended = interpolate(color, existing, coverage.min(1.0));
                            canvas.put_pixel(px as u32, py as u32, blended);
                        }
                    });
                }

                caret += scaled.h_advance(glyph_id) + attrs.letter_spacing;
                previous = Some(glyph_id);
            }

            baseline += line_height + attrs.line_spacing;
        }

        debug!(width, height, "Patch rendered");
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str, width: f32, height: f32) -> RenderSpec {
        RenderSpec {
            text: text.into(),
            width,
            height,
            attributes: PatchAttributes {
                text: text.into(),
                font_size: 14.0,
                ..PatchAttributes::default()
            },
        }
    }

    /// A rasterizer for machines without any system typeface — tests that
    /// depend on real glyphs return early instead of failing.
    fn rasterizer() -> Option<GlyphRasterizer> {
        GlyphRasterizer::system_default().ok()
    }

    #[test]
    fn canvas_size_rounds_and_clamps() {
        assert_eq!(spec("x", 100.4, 40.6).canvas_size(), (100, 41));
        assert_eq!(spec("x", 0.2, 0.0).canvas_size(), (1, 1));
    }

    #[test]
    fn rendering_is_pure() {
        let Some(r) = rasterizer() else { return };
        let spec = spec("Hello, patch!\nsecond line", 220.0, 60.0);
        let first = r.render(&spec).unwrap();
        let second = r.render(&spec).unwrap();
        assert_eq!(first.as_raw(), second.as_raw(), "render must be deterministic");
    }

    #[test]
    fn background_is_opaque_white_everywhere_text_is_not() {
        let Some(r) = rasterizer() else { return };
        let out = r.render(&spec("Hi", 200.0, 50.0)).unwrap();

        // Every pixel is fully opaque.
        assert!(out.pixels().all(|p| p.0[3] == 255));
        // Far corners are untouched white.
        assert_eq!(out.get_pixel(199, 49).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(199, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn empty_text_renders_blank_white_canvas() {
        let Some(r) = rasterizer() else { return };
        let out = r.render(&spec("", 40.0, 20.0)).unwrap();
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn nonempty_text_marks_the_canvas() {
        let Some(r) = rasterizer() else { return };
        let out = r.render(&spec("Hello", 200.0, 50.0)).unwrap();
        assert!(
            out.pixels().any(|p| p.0[0] < 250),
            "expected at least one darkened pixel"
        );
    }

    #[test]
    fn transparency_hint_never_reaches_the_raster() {
        let Some(r) = rasterizer() else { return };
        let mut opaque = spec("Hello", 200.0, 50.0);
        let mut transparent = opaque.clone();
        opaque.attributes.is_transparent = false;
        transparent.attributes.is_transparent = true;

        let a = r.render(&opaque).unwrap();
        let b = r.render(&transparent).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn letter_spacing_widens_the_drawn_text() {
        let Some(r) = rasterizer() else { return };
        let tight = spec("AAAA", 300.0, 50.0);
        let mut loose = tight.clone();
        loose.attributes.letter_spacing = 6.0;

        let rightmost_dark = |img: &RgbaImage| -> u32 {
            let mut max_x = 0;
            for (x, _, p) in img.enumerate_pixels() {
                if p.0[0] < 200 && x > max_x {
                    max_x = x;
                }
            }
            max_x
        };

        let a = r.render(&tight).unwrap();
        let b = r.render(&loose).unwrap();
        assert!(
            rightmost_dark(&b) > rightmost_dark(&a),
            "letter spacing should push glyphs right"
        );
    }

    #[test]
    fn invalid_color_is_an_error() {
        let Some(r) = rasterizer() else { return };
        let mut bad = spec("x", 40.0, 20.0);
        bad.attributes.color_hex = "#nope".into();
        assert!(matches!(
            r.render(&bad),
            Err(FlickwerkError::InvalidColor(_))
        ));
    }

    #[test]
    fn missing_font_paths_error_lists_candidates() {
        let err = GlyphRasterizer::from_font_file("/nonexistent/font.ttf");
        assert!(err.is_err());
    }
}
