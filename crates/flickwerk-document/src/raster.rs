// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization seam and bitmap helpers.
//
// Rendering PDF page content to pixels is a platform capability (PDFKit,
// pdfium, ...) supplied by the embedding application, so it is expressed as
// a trait here. The helpers below implement the parts Flickwerk owns: the
// opaque white composite a recognition crop is taken from, and the scaled,
// y-flipped crop itself.

use image::{DynamicImage, Rgba, RgbaImage, imageops};
use tracing::{debug, instrument};

use flickwerk_core::error::FlickwerkError;
use flickwerk_core::geometry::PageRect;

use crate::pdf::document::PatchDocument;

/// Renders a document page to a bitmap.
///
/// Implementations must apply the page's rotation so the output is upright,
/// and must render onto an opaque background at exactly the requested pixel
/// size. Supplied by the embedding platform; tests inject synthetic
/// renderers.
pub trait PageRenderer {
    fn render_page(
        &self,
        document: &PatchDocument,
        page_number: u32,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, FlickwerkError>;
}

/// Flatten an image onto an opaque white background.
///
/// Recognition crops must never carry transparency: a transparent region
/// alpha-blends to white, matching what the user sees on paper.
pub fn compose_opaque(image: &DynamicImage) -> RgbaImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel.0[3] as u32;
        if alpha == 255 {
            out.put_pixel(x, y, Rgba([pixel.0[0], pixel.0[1], pixel.0[2], 255]));
        } else if alpha > 0 {
            let inv = 255 - alpha;
            let blend = |c: u8| ((c as u32 * alpha + 255 * inv) / 255) as u8;
            out.put_pixel(
                x,
                y,
                Rgba([blend(pixel.0[0]), blend(pixel.0[1]), blend(pixel.0[2]), 255]),
            );
        }
    }

    out
}

/// Crop the pixel region of `image` corresponding to a page-space rectangle.
///
/// `image` is a rendering of the full page (bottom-left-origin page space
/// drawn top-down, i.e. page top at pixel row 0). The rectangle is scaled
/// from page units to pixels and y-flipped. Degenerate or fully
/// out-of-bounds regions are an error — callers degrade to an empty
/// recognition seed rather than surfacing it.
#[instrument(skip(image), fields(img_w = image.width(), img_h = image.height()))]
pub fn crop_region(
    image: &RgbaImage,
    rect: PageRect,
    page_width: f32,
    page_height: f32,
) -> Result<RgbaImage, FlickwerkError> {
    if rect.is_degenerate() || page_width <= 0.0 || page_height <= 0.0 {
        return Err(FlickwerkError::ImageError(
            "degenerate crop region".to_string(),
        ));
    }

    let (img_w, img_h) = image.dimensions();
    let scale_x = img_w as f32 / page_width;
    let scale_y = img_h as f32 / page_height;

    // Page y-up → pixel y-down: the crop's top edge is `page_height - top`.
    let px = rect.x * scale_x;
    let py = (page_height - rect.top()) * scale_y;
    let pw = rect.width * scale_x;
    let ph = rect.height * scale_y;

    let x0 = px.max(0.0).floor() as u32;
    let y0 = py.max(0.0).floor() as u32;
    if x0 >= img_w || y0 >= img_h {
        return Err(FlickwerkError::ImageError(
            "crop region outside page image".to_string(),
        ));
    }

    let w = (pw.round() as u32).min(img_w - x0);
    let h = (ph.round() as u32).min(img_h - y0);
    if w == 0 || h == 0 {
        return Err(FlickwerkError::ImageError(
            "crop region collapses to zero pixels".to_string(),
        ));
    }

    debug!(x0, y0, w, h, "Cropping recognition region");
    Ok(imageops::crop_imm(image, x0, y0, w, h).to_image())
}
