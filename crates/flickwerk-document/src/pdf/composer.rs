// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF composer — build new PDF documents from captured page images using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use flickwerk_core::error::FlickwerkError;
use flickwerk_core::types::PaperSize;

/// Creates new PDF documents from captured or imported page images.
///
/// This is the capture-to-PDF path: each source image becomes one page,
/// scaled to fit within the page margins while preserving its aspect ratio.
pub struct PdfComposer {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfComposer {
    /// Create a new composer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Create a new composer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Create a document of `pages` empty pages.
    ///
    /// Used by the new-document flow and as a fixture source in tests.
    #[instrument(skip(self), fields(pages))]
    pub fn blank_document(&self, pages: usize) -> Result<Vec<u8>, FlickwerkError> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Flickwerk Document");

        let mut doc = PdfDocument::new(title);
        let page_list: Vec<PdfPage> = (0..pages.max(1))
            .map(|_| PdfPage::new(page_w, page_h, Vec::new()))
            .collect();
        doc.with_pages(page_list);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), "Blank document composed");
        Ok(output)
    }

    /// Create a multi-page PDF with one page per source image.
    ///
    /// Each image is decoded, placed on its own page, and scaled to fit the
    /// margins while preserving aspect ratio (never upscaled).
    #[instrument(skip_all, fields(image_count = images.len()))]
    pub fn compose_from_images(&self, images: &[&[u8]]) -> Result<Vec<u8>, FlickwerkError> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Flickwerk Scan");

        info!(paper = ?self.paper_size, title, "Composing image PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, image_bytes) in images.iter().enumerate() {
            let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
                FlickwerkError::ImageError(format!(
                    "failed to decode page image #{}: {}",
                    index + 1,
                    err
                ))
            })?;

            let img_width = dynamic_image.width() as usize;
            let img_height = dynamic_image.height() as usize;

            // Convert to RGB8 for printpdf.
            let rgb_image = dynamic_image.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Compute transform to place the image on the page with margins.
            let margin_mm: f32 = 15.0;
            let usable_w_pt = Mm(page_w.0 - 2.0 * margin_mm).into_pt().0;
            let usable_h_pt = Mm(page_h.0 - 2.0 * margin_mm).into_pt().0;

            // Image native size at a default DPI of 150 (typical for scans).
            let dpi: f32 = 150.0;
            let img_w_pt = img_width as f32 / dpi * 72.0;
            let img_h_pt = img_height as f32 / dpi * 72.0;

            // Scale to fit while preserving aspect ratio; do not upscale.
            let scale_x = usable_w_pt / img_w_pt;
            let scale_y = usable_h_pt / img_h_pt;
            let scale = scale_x.min(scale_y).min(1.0);

            let rendered_w_pt = img_w_pt * scale;
            let rendered_h_pt = img_h_pt * scale;

            // Centre the image on the page.
            let margin_pt = Mm(margin_mm).into_pt().0;
            let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
            let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_offset)),
                    translate_y: Some(Pt(y_offset)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(dpi),
                    rotate: None,
                },
            }];

            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        // An empty input still produces a valid single-page document.
        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(bytes = output.len(), "Image PDF composed");
        Ok(output)
    }

    /// Compose from images and write the result directly to a file.
    pub fn write_images_to_file(
        &self,
        images: &[&[u8]],
        path: impl AsRef<Path>,
    ) -> Result<(), FlickwerkError> {
        let bytes = self.compose_from_images(images)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote image PDF to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::PatchDocument;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(w, h, ::image::Rgba([200, 200, 200, 255]));
        let mut out = Vec::new();
        ::image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ::image::ImageFormat::Png)
            .expect("encode png");
        out
    }

    #[test]
    fn blank_document_round_trips_through_lopdf() {
        let bytes = PdfComposer::a4().blank_document(3).unwrap();
        let doc = PatchDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn one_page_per_image() {
        let png = png_bytes(300, 400);
        let bytes = PdfComposer::a4()
            .compose_from_images(&[&png, &png])
            .unwrap();
        let doc = PatchDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn empty_input_yields_single_blank_page() {
        let bytes = PdfComposer::a4().compose_from_images(&[]).unwrap();
        let doc = PatchDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn titled_document_still_round_trips() {
        let mut composer = PdfComposer::a4();
        composer.set_title("Receipts 2026");
        let bytes = composer.blank_document(1).unwrap();
        let doc = PatchDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
    }
}
