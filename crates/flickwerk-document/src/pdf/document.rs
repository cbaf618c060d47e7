// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document model — open, inspect, and mutate existing PDF documents
// using the `lopdf` crate, with first-class support for Flickwerk's
// rasterized patch annotations.
//
// A patch is stored as a /Stamp annotation whose appearance is a form
// XObject wrapping a DCTDecode (JPEG) image of the rendered replacement
// text. The patch's uuid rides in the standard /NM (annotation name) entry
// and the full attribute set is serialized as JSON into a /PatchData
// literal string, so a later session can reopen the edit with exactly the
// values it was committed with.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, instrument, warn};

use flickwerk_core::error::FlickwerkError;
use flickwerk_core::geometry::{PagePoint, PageRect, PageRotation};
use flickwerk_core::types::{DocumentMetadata, PatchAttributes, PatchId};

/// Dictionary key carrying the serialized [`PatchAttributes`] side-channel.
const PATCH_DATA_KEY: &[u8] = b"PatchData";

/// How far up the page tree inherited attributes are searched.
const INHERIT_DEPTH_LIMIT: usize = 32;

/// A committed patch annotation as read back from a page.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPatch {
    pub id: PatchId,
    /// Region being replaced, in page space (bottom-left origin).
    pub bounds: PageRect,
    pub attributes: PatchAttributes,
}

/// Reads and mutates an existing PDF file.
///
/// Wraps `lopdf::Document` and provides the page/annotation operations the
/// patch engine and the security scanner need: page bounds and rotation,
/// encryption detection, Info metadata, and add/remove/list for patch
/// annotations.
pub struct PatchDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PatchDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlickwerkError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            FlickwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a document from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, FlickwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            FlickwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the document was created via [`PatchDocument::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Whether the document carries an /Encrypt dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.document.trailer.get(b"Encrypt").is_ok()
    }

    /// Decrypt the document with the given password so its content becomes
    /// readable. A no-op error path on documents that are not encrypted is
    /// the caller's concern; check [`is_encrypted`](Self::is_encrypted)
    /// first.
    #[instrument(skip_all)]
    pub fn unlock(&mut self, password: &str) -> Result<(), FlickwerkError> {
        self.document.decrypt(password).map_err(|err| {
            FlickwerkError::PdfError(format!("failed to decrypt document: {}", err))
        })
    }

    /// Title/author/creator from the /Info dictionary, where present.
    pub fn metadata(&self) -> DocumentMetadata {
        let info = match self.resolve(self.document.trailer.get(b"Info").ok()) {
            Some(Object::Dictionary(dict)) => dict,
            _ => return DocumentMetadata::default(),
        };

        DocumentMetadata {
            title: info.get(b"Title").ok().and_then(text_string),
            author: info.get(b"Author").ok().and_then(text_string),
            creator: info.get(b"Creator").ok().and_then(text_string),
        }
    }

    /// The page's bounding rectangle in page space (MediaBox, including
    /// inherited values from the page tree).
    #[instrument(skip(self), fields(page_number))]
    pub fn page_bounds(&self, page_number: u32) -> Result<PageRect, FlickwerkError> {
        let page_id = self.page_id(page_number)?;
        let media_box = self
            .inherited_entry(page_id, b"MediaBox")?
            .ok_or_else(|| {
                FlickwerkError::PdfError(format!("page {} has no MediaBox", page_number))
            })?;

        let values = match self.resolve(Some(&media_box)) {
            Some(Object::Array(arr)) if arr.len() == 4 => arr,
            _ => {
                return Err(FlickwerkError::PdfError(format!(
                    "page {} MediaBox is not a 4-element array",
                    page_number
                )));
            }
        };

        let mut nums = [0.0f32; 4];
        for (i, obj) in values.iter().enumerate() {
            nums[i] = number(self.resolve(Some(obj)).unwrap_or(obj)).ok_or_else(|| {
                FlickwerkError::PdfError(format!(
                    "page {} MediaBox element {} is not numeric",
                    page_number, i
                ))
            })?;
        }

        let x0 = nums[0].min(nums[2]);
        let y0 = nums[1].min(nums[3]);
        Ok(PageRect::new(
            x0,
            y0,
            (nums[2] - nums[0]).abs(),
            (nums[3] - nums[1]).abs(),
        ))
    }

    /// The page's /Rotate value (including inherited), normalized to a
    /// quarter turn.
    pub fn page_rotation(&self, page_number: u32) -> Result<PageRotation, FlickwerkError> {
        let page_id = self.page_id(page_number)?;
        let degrees = match self.inherited_entry(page_id, b"Rotate")? {
            Some(obj) => match self.resolve(Some(&obj)) {
                Some(Object::Integer(i)) => *i,
                _ => 0,
            },
            None => 0,
        };
        Ok(PageRotation::from_degrees(degrees))
    }

    /// Unrotated page sizes with rotation, in page order — the input the
    /// viewer layout is built from.
    pub fn page_sizes(&self) -> Result<Vec<(f32, f32, PageRotation)>, FlickwerkError> {
        let mut sizes = Vec::with_capacity(self.page_count());
        let mut numbers: Vec<u32> = self.document.get_pages().keys().copied().collect();
        numbers.sort_unstable();
        for number in numbers {
            let bounds = self.page_bounds(number)?;
            let rotation = self.page_rotation(number)?;
            sizes.push((bounds.width, bounds.height, rotation));
        }
        Ok(sizes)
    }

    // -- Patch annotations ----------------------------------------------------

    /// Add a rasterized patch annotation to a page.
    ///
    /// The image becomes the annotation's normal appearance; `attributes`
    /// are serialized into the /PatchData side-channel for later reopening.
    /// Returns the new patch's id.
    #[instrument(skip(self, image, attributes), fields(page_number, w = image.width(), h = image.height()))]
    pub fn add_patch(
        &mut self,
        page_number: u32,
        bounds: PageRect,
        image: &RgbaImage,
        attributes: &PatchAttributes,
    ) -> Result<PatchId, FlickwerkError> {
        let patch_id = PatchId::new();
        self.insert_patch(page_number, bounds, image, attributes, patch_id)?;
        Ok(patch_id)
    }

    /// Re-add a previously removed patch under its original id.
    ///
    /// Used by the reopen-cancel path: the annotation was removed when the
    /// edit was reopened, and cancelling restores it with the identity it
    /// had before.
    #[instrument(skip(self, image), fields(page_number, id = %patch.id))]
    pub fn restore_patch(
        &mut self,
        page_number: u32,
        patch: &StoredPatch,
        image: &RgbaImage,
    ) -> Result<(), FlickwerkError> {
        self.insert_patch(page_number, patch.bounds, image, &patch.attributes, patch.id)
    }

    fn insert_patch(
        &mut self,
        page_number: u32,
        bounds: PageRect,
        image: &RgbaImage,
        attributes: &PatchAttributes,
        patch_id: PatchId,
    ) -> Result<(), FlickwerkError> {
        let page_id = self.page_id(page_number)?;

        // Appearance image — JPEG (DCTDecode) keeps large rasters small and
        // the background is opaque white anyway.
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .map_err(|err| {
                FlickwerkError::ImageError(format!("failed to encode patch image: {}", err))
            })?;

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(image.width() as i64));
        image_dict.set("Height", Object::Integer(image.height() as i64));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));
        image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let image_id = self
            .document
            .add_object(Object::Stream(Stream::new(image_dict, jpeg)));

        // Form XObject scaling the image to the patch bounds.
        let mut resources = Dictionary::new();
        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut form_dict = Dictionary::new();
        form_dict.set("Type", Object::Name(b"XObject".to_vec()));
        form_dict.set("Subtype", Object::Name(b"Form".to_vec()));
        form_dict.set(
            "BBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(bounds.width.into()),
                Object::Real(bounds.height.into()),
            ]),
        );
        form_dict.set("Resources", Object::Dictionary(resources));
        let content = format!(
            "q\n{:.4} 0 0 {:.4} 0 0 cm\n/Im0 Do\nQ",
            bounds.width, bounds.height
        );
        let form_id = self
            .document
            .add_object(Object::Stream(Stream::new(form_dict, content.into_bytes())));

        // The annotation itself.
        let json = serde_json::to_vec(attributes)?;
        let mut appearance = Dictionary::new();
        appearance.set("N", Object::Reference(form_id));

        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"Stamp".to_vec()));
        annot.set(
            "Rect",
            Object::Array(vec![
                Object::Real(bounds.x.into()),
                Object::Real(bounds.y.into()),
                Object::Real((bounds.x + bounds.width).into()),
                Object::Real((bounds.y + bounds.height).into()),
            ]),
        );
        // Print flag — the patch must survive into printed/flattened output.
        annot.set("F", Object::Integer(4));
        annot.set(
            "NM",
            Object::String(patch_id.to_string().into_bytes(), StringFormat::Literal),
        );
        annot.set(
            "Contents",
            Object::String(attributes.text.clone().into_bytes(), StringFormat::Literal),
        );
        annot.set(
            PATCH_DATA_KEY,
            Object::String(json, StringFormat::Literal),
        );
        annot.set("AP", Object::Dictionary(appearance));
        let annot_id = self.document.add_object(Object::Dictionary(annot));

        self.push_annotation(page_id, annot_id)?;

        info!(%patch_id, page_number, "Patch annotation added");
        Ok(())
    }

    /// All patch annotations on a page, in annotation order.
    ///
    /// Foreign annotations (no /PatchData) are skipped. A patch whose
    /// /PatchData fails to parse aborts the listing with
    /// [`FlickwerkError::MalformedPatchData`] — the annotation is left in
    /// place for a newer version to deal with.
    pub fn patches(&self, page_number: u32) -> Result<Vec<StoredPatch>, FlickwerkError> {
        let page_id = self.page_id(page_number)?;
        let mut patches = Vec::new();

        for entry in self.annotation_entries(page_id)? {
            let dict = match self.resolve(Some(&entry)) {
                Some(Object::Dictionary(dict)) => dict,
                _ => continue,
            };
            if let Some(patch) = self.read_patch(dict)? {
                patches.push(patch);
            }
        }

        Ok(patches)
    }

    /// The topmost patch annotation containing `point`, if any.
    ///
    /// Used by the double-tap-to-reopen path: annotations later in the
    /// array render on top, so the search runs back to front.
    pub fn patch_at(
        &self,
        page_number: u32,
        point: PagePoint,
    ) -> Result<Option<StoredPatch>, FlickwerkError> {
        let patches = self.patches(page_number)?;
        Ok(patches.into_iter().rev().find(|p| p.bounds.contains(point)))
    }

    /// Remove the patch annotation with the given id from a page.
    #[instrument(skip(self), fields(page_number, %id))]
    pub fn remove_patch(&mut self, page_number: u32, id: PatchId) -> Result<(), FlickwerkError> {
        let page_id = self.page_id(page_number)?;

        // Phase 1 (read-only): find the index of the matching entry.
        let entries = self.annotation_entries(page_id)?;
        let mut index = None;
        for (i, entry) in entries.iter().enumerate() {
            if let Some(Object::Dictionary(dict)) = self.resolve(Some(entry)) {
                if annotation_name(dict) == Some(id) {
                    index = Some(i);
                    break;
                }
            }
        }
        let index = index.ok_or(FlickwerkError::PatchNotFound)?;

        // Phase 2: mutate the array in place.
        match self.annots_location(page_id)? {
            AnnotsLocation::Inline => {
                if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
                    if let Ok(Object::Array(arr)) = dict.get_mut(b"Annots") {
                        arr.remove(index);
                    }
                }
            }
            AnnotsLocation::Indirect(array_id) => {
                if let Ok(Object::Array(arr)) = self.document.get_object_mut(array_id) {
                    arr.remove(index);
                }
            }
            AnnotsLocation::Missing => return Err(FlickwerkError::PatchNotFound),
        }

        debug!("Patch annotation removed");
        Ok(())
    }

    // -- Persistence ----------------------------------------------------------

    /// Serialize the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, FlickwerkError> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            FlickwerkError::PdfError(format!("failed to serialise document: {}", err))
        })?;
        Ok(output)
    }

    /// Write the document to a file.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), FlickwerkError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(bytes = bytes.len(), "Document saved");
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId, FlickwerkError> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            FlickwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    /// Follow a reference to its object, or return the object itself.
    fn resolve<'a>(&'a self, obj: Option<&'a Object>) -> Option<&'a Object> {
        match obj {
            Some(Object::Reference(id)) => self.document.get_object(*id).ok(),
            other => other,
        }
    }

    /// Look up `key` on a page dictionary, walking /Parent for inherited
    /// attributes (MediaBox, Rotate, Resources all inherit).
    fn inherited_entry(
        &self,
        page_id: ObjectId,
        key: &[u8],
    ) -> Result<Option<Object>, FlickwerkError> {
        let mut current = page_id;
        for _ in 0..INHERIT_DEPTH_LIMIT {
            let dict = match self.document.get_object(current) {
                Ok(Object::Dictionary(dict)) => dict,
                _ => return Ok(None),
            };
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value.clone()));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return Ok(None),
            }
        }
        warn!(?page_id, "page tree deeper than inherit limit");
        Ok(None)
    }

    /// The page's annotation entries as owned objects (references preserved).
    fn annotation_entries(&self, page_id: ObjectId) -> Result<Vec<Object>, FlickwerkError> {
        let dict = match self.document.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => {
                return Err(FlickwerkError::PdfError(
                    "page object is not a dictionary".to_string(),
                ));
            }
        };
        match dict.get(b"Annots") {
            Ok(Object::Array(arr)) => Ok(arr.clone()),
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(arr)) => Ok(arr.clone()),
                _ => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }

    fn annots_location(&self, page_id: ObjectId) -> Result<AnnotsLocation, FlickwerkError> {
        let dict = match self.document.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return Ok(AnnotsLocation::Missing),
        };
        match dict.get(b"Annots") {
            Ok(Object::Array(_)) => Ok(AnnotsLocation::Inline),
            Ok(Object::Reference(id)) => Ok(AnnotsLocation::Indirect(*id)),
            _ => Ok(AnnotsLocation::Missing),
        }
    }

    /// Append an annotation reference to the page's /Annots array, creating
    /// the array when the page has none.
    fn push_annotation(
        &mut self,
        page_id: ObjectId,
        annot_id: ObjectId,
    ) -> Result<(), FlickwerkError> {
        match self.annots_location(page_id)? {
            AnnotsLocation::Inline => {
                if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
                    if let Ok(Object::Array(arr)) = dict.get_mut(b"Annots") {
                        arr.push(Object::Reference(annot_id));
                    }
                }
            }
            AnnotsLocation::Indirect(array_id) => {
                if let Ok(Object::Array(arr)) = self.document.get_object_mut(array_id) {
                    arr.push(Object::Reference(annot_id));
                }
            }
            AnnotsLocation::Missing => {
                if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
                    dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
                } else {
                    return Err(FlickwerkError::PdfError(
                        "page object is not a dictionary".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Decode one annotation dictionary into a [`StoredPatch`], or `None`
    /// for annotations that are not Flickwerk patches.
    fn read_patch(&self, dict: &Dictionary) -> Result<Option<StoredPatch>, FlickwerkError> {
        let data = match dict.get(PATCH_DATA_KEY) {
            Ok(Object::String(bytes, _)) => bytes,
            _ => return Ok(None),
        };
        let id = match annotation_name(dict) {
            Some(id) => id,
            None => return Ok(None),
        };

        let attributes: PatchAttributes = serde_json::from_slice(data)
            .map_err(|err| FlickwerkError::MalformedPatchData(err.to_string()))?;

        let bounds = match dict.get(b"Rect") {
            Ok(Object::Array(arr)) if arr.len() == 4 => {
                let mut nums = [0.0f32; 4];
                for (i, obj) in arr.iter().enumerate() {
                    nums[i] = number(self.resolve(Some(obj)).unwrap_or(obj)).ok_or_else(|| {
                        FlickwerkError::MalformedPatchData(
                            "annotation /Rect is not numeric".to_string(),
                        )
                    })?;
                }
                let x0 = nums[0].min(nums[2]);
                let y0 = nums[1].min(nums[3]);
                PageRect::new(x0, y0, (nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs())
            }
            _ => {
                return Err(FlickwerkError::MalformedPatchData(
                    "annotation has no /Rect".to_string(),
                ));
            }
        };

        Ok(Some(StoredPatch {
            id,
            bounds,
            attributes,
        }))
    }
}

enum AnnotsLocation {
    /// /Annots is an array directly on the page dictionary.
    Inline,
    /// /Annots is a reference to an array object.
    Indirect(ObjectId),
    Missing,
}

/// Read an annotation's /NM entry as a patch id.
fn annotation_name(dict: &Dictionary) -> Option<PatchId> {
    match dict.get(b"NM") {
        Ok(Object::String(bytes, _)) => {
            let s = String::from_utf8_lossy(bytes);
            PatchId::parse(&s)
        }
        _ => None,
    }
}

/// Numeric object → f32 (PDF numbers may be integers or reals).
fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, or PDFDocEncoding treated
/// as best-effort UTF-8).
fn text_string(obj: &Object) -> Option<String> {
    let bytes = match obj {
        Object::String(bytes, _) => bytes,
        _ => return None,
    };
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::composer::PdfComposer;
    use flickwerk_core::types::PaperSize;

    fn blank_doc(pages: usize) -> PatchDocument {
        let bytes = PdfComposer::new(PaperSize::A4)
            .blank_document(pages)
            .expect("compose blank document");
        PatchDocument::from_bytes(&bytes).expect("load composed document")
    }

    fn sample_attributes() -> PatchAttributes {
        PatchAttributes {
            text: "Hello".into(),
            font_size: 14.0,
            font_name: "Helvetica".into(),
            color_hex: "#000000".into(),
            line_spacing: 0.0,
            letter_spacing: 0.0,
            is_transparent: false,
        }
    }

    fn white_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn composed_document_has_expected_pages_and_bounds() {
        let doc = blank_doc(2);
        assert_eq!(doc.page_count(), 2);

        // A4 is 210x297mm = 595.28x841.89pt.
        let bounds = doc.page_bounds(1).unwrap();
        assert!((bounds.width - 595.28).abs() < 1.0, "width {}", bounds.width);
        assert!(
            (bounds.height - 841.89).abs() < 1.0,
            "height {}",
            bounds.height
        );
    }

    #[test]
    fn add_then_list_round_trips_attributes_exactly() {
        let mut doc = blank_doc(1);
        let bounds = PageRect::new(100.0, 500.0, 120.0, 40.0);
        let attrs = sample_attributes();

        let id = doc
            .add_patch(1, bounds, &white_image(120, 40), &attrs)
            .unwrap();

        let patches = doc.patches(1).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].id, id);
        assert_eq!(patches[0].attributes, attrs);
        assert!(patches[0].bounds.approx_eq(&bounds, 0.01));
    }

    #[test]
    fn round_trip_survives_serialization() {
        let mut doc = blank_doc(1);
        let bounds = PageRect::new(50.0, 60.0, 80.0, 30.0);
        let attrs = sample_attributes();
        doc.add_patch(1, bounds, &white_image(80, 30), &attrs)
            .unwrap();

        let bytes = doc.to_bytes().unwrap();
        let reloaded = PatchDocument::from_bytes(&bytes).unwrap();
        let patches = reloaded.patches(1).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].attributes, attrs);
        assert!(patches[0].bounds.approx_eq(&bounds, 0.01));
    }

    #[test]
    fn patch_at_hits_inside_and_misses_outside() {
        let mut doc = blank_doc(1);
        let bounds = PageRect::new(100.0, 500.0, 120.0, 40.0);
        doc.add_patch(1, bounds, &white_image(120, 40), &sample_attributes())
            .unwrap();

        let hit = doc.patch_at(1, PagePoint::new(150.0, 520.0)).unwrap();
        assert!(hit.is_some());

        let miss = doc.patch_at(1, PagePoint::new(10.0, 10.0)).unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn remove_patch_empties_the_page() {
        let mut doc = blank_doc(1);
        let bounds = PageRect::new(100.0, 500.0, 120.0, 40.0);
        let id = doc
            .add_patch(1, bounds, &white_image(120, 40), &sample_attributes())
            .unwrap();

        doc.remove_patch(1, id).unwrap();
        assert!(doc.patches(1).unwrap().is_empty());

        // Removing again reports not-found.
        let err = doc.remove_patch(1, id).unwrap_err();
        assert!(matches!(err, FlickwerkError::PatchNotFound));
    }

    #[test]
    fn malformed_patch_data_aborts_listing() {
        let mut doc = blank_doc(1);
        let bounds = PageRect::new(10.0, 10.0, 50.0, 20.0);
        doc.add_patch(1, bounds, &white_image(50, 20), &sample_attributes())
            .unwrap();

        // Corrupt the side-channel in place.
        let page_id = doc.page_id(1).unwrap();
        let entries = doc.annotation_entries(page_id).unwrap();
        let annot_id = match &entries[0] {
            Object::Reference(id) => *id,
            other => panic!("expected reference, got {other:?}"),
        };
        if let Ok(Object::Dictionary(dict)) = doc.document.get_object_mut(annot_id) {
            dict.set(
                PATCH_DATA_KEY,
                Object::String(b"{not json".to_vec(), StringFormat::Literal),
            );
        }

        let err = doc.patches(1).unwrap_err();
        assert!(matches!(err, FlickwerkError::MalformedPatchData(_)));
    }

    #[test]
    fn metadata_reads_info_dictionary() {
        let mut raw = Document::with_version("1.5");
        let mut info = Dictionary::new();
        info.set(
            "Author",
            Object::String(b"Ada".to_vec(), StringFormat::Literal),
        );
        info.set(
            "Creator",
            Object::String(b"Flickwerk".to_vec(), StringFormat::Literal),
        );
        let info_id = raw.add_object(Object::Dictionary(info));
        raw.trailer.set("Info", Object::Reference(info_id));

        let doc = PatchDocument {
            document: raw,
            source_path: None,
        };
        let meta = doc.metadata();
        assert_eq!(meta.author.as_deref(), Some("Ada"));
        assert_eq!(meta.creator.as_deref(), Some("Flickwerk"));
        assert_eq!(meta.title, None);
    }

    #[test]
    fn utf16_metadata_decodes() {
        // "Hi" as UTF-16BE with BOM.
        let obj = Object::String(
            vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'],
            StringFormat::Hexadecimal,
        );
        assert_eq!(text_string(&obj).as_deref(), Some("Hi"));
    }

    #[test]
    fn encryption_flag_follows_trailer() {
        let doc = blank_doc(1);
        assert!(!doc.is_encrypted());

        let mut raw = Document::with_version("1.5");
        raw.trailer
            .set("Encrypt", Object::Dictionary(Dictionary::new()));
        let encrypted = PatchDocument {
            document: raw,
            source_path: None,
        };
        assert!(encrypted.is_encrypted());
    }

    #[test]
    fn page_rotation_defaults_to_none() {
        let doc = blank_doc(1);
        assert_eq!(doc.page_rotation(1).unwrap(), PageRotation::None);
    }
}
