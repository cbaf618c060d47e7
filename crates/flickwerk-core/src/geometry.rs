// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate geometry for the patch engine.
//
// Three coordinate systems meet here:
//
//   * page space    — a PDF page's own coordinates: origin bottom-left,
//                     y-axis pointing up, independent of zoom or rotation.
//   * display space — page space after the page's /Rotate is applied:
//                     still bottom-left origin, dimensions swapped for
//                     quarter turns.
//   * view space    — the scrollable viewing surface on screen: origin
//                     top-left, y-axis pointing down, scaled by zoom and
//                     shifted by the scroll offset.
//
// Every conversion lives in this module as a named, tested function.
// Page-space bounds are the source of truth for an overlay; its view frame
// is always derived, never the reverse (except when a drag writes a new
// page rect back through the current transform).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Primitive types
// ---------------------------------------------------------------------------

/// A point in page or display space (bottom-left origin, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page or display space. `x`/`y` name the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The y coordinate of the rectangle's top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: PagePoint) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.top()
    }

    /// A rectangle with no usable area (cropping such a region is refused).
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Componentwise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &PageRect, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// A point on the viewing surface (top-left origin, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle on the viewing surface. `x`/`y` name the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> ViewPoint {
        ViewPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A rectangle expressed as fractions (0..=1) of a parent image's dimensions.
///
/// The text recognizer reports per-line bounds in this form so that callers
/// can reason about line height independently of the crop's pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RelativeRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Page rotation
// ---------------------------------------------------------------------------

/// A page's /Rotate value, normalized to a quarter turn.
///
/// Rotation affects how page content visually renders versus its stored
/// coordinate space; the stored annotation rectangles always live in the
/// unrotated page space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageRotation {
    #[default]
    None,
    Clockwise90,
    Half,
    Clockwise270,
}

impl PageRotation {
    /// Normalize an arbitrary /Rotate integer. Values that are not a
    /// multiple of 90 are treated as unrotated.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Self::Clockwise90,
            180 => Self::Half,
            270 => Self::Clockwise270,
            _ => Self::None,
        }
    }

    pub fn degrees(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Half => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Whether the rotation swaps the page's displayed width and height.
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Self::Clockwise90 | Self::Clockwise270)
    }
}

/// Map a stored page-space point into display space (the space the viewer
/// shows after applying the page's clockwise /Rotate).
///
/// `page_width`/`page_height` are the *unrotated* page dimensions.
pub fn rotate_point_to_display(
    p: PagePoint,
    rotation: PageRotation,
    page_width: f32,
    page_height: f32,
) -> PagePoint {
    match rotation {
        PageRotation::None => p,
        PageRotation::Clockwise90 => PagePoint::new(p.y, page_width - p.x),
        PageRotation::Half => PagePoint::new(page_width - p.x, page_height - p.y),
        PageRotation::Clockwise270 => PagePoint::new(page_height - p.y, p.x),
    }
}

/// Inverse of [`rotate_point_to_display`].
pub fn rotate_point_from_display(
    p: PagePoint,
    rotation: PageRotation,
    page_width: f32,
    page_height: f32,
) -> PagePoint {
    match rotation {
        PageRotation::None => p,
        PageRotation::Clockwise90 => PagePoint::new(page_width - p.y, p.x),
        PageRotation::Half => PagePoint::new(page_width - p.x, page_height - p.y),
        PageRotation::Clockwise270 => PagePoint::new(p.y, page_height - p.x),
    }
}

/// Map a stored page-space rectangle into display space.
pub fn rotate_rect_to_display(
    r: PageRect,
    rotation: PageRotation,
    page_width: f32,
    page_height: f32,
) -> PageRect {
    let a = rotate_point_to_display(PagePoint::new(r.x, r.y), rotation, page_width, page_height);
    let b = rotate_point_to_display(
        PagePoint::new(r.x + r.width, r.top()),
        rotation,
        page_width,
        page_height,
    );
    rect_from_corners(a, b)
}

/// Inverse of [`rotate_rect_to_display`].
pub fn rotate_rect_from_display(
    r: PageRect,
    rotation: PageRotation,
    page_width: f32,
    page_height: f32,
) -> PageRect {
    let a = rotate_point_from_display(PagePoint::new(r.x, r.y), rotation, page_width, page_height);
    let b = rotate_point_from_display(
        PagePoint::new(r.x + r.width, r.top()),
        rotation,
        page_width,
        page_height,
    );
    rect_from_corners(a, b)
}

fn rect_from_corners(a: PagePoint, b: PagePoint) -> PageRect {
    let x0 = a.x.min(b.x);
    let y0 = a.y.min(b.y);
    PageRect::new(x0, y0, (a.x - b.x).abs(), (a.y - b.y).abs())
}

// ---------------------------------------------------------------------------
// View transform
// ---------------------------------------------------------------------------

/// The mapping between one page's display space and the viewing surface.
///
/// The viewing surface is modelled as unscaled content space (pages placed
/// at fixed origins, top-left anchored, y down) scaled by `zoom` and shifted
/// by the scroll offset. `page_height` is the page's *displayed* height,
/// which is what the y-flip pivots on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub zoom: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    /// The page's top-left corner in unscaled content coordinates.
    pub page_origin_x: f32,
    pub page_origin_y: f32,
    /// Displayed page height (rotation already applied).
    pub page_height: f32,
}

impl ViewTransform {
    /// Display-space point (bottom-left origin) → view point (top-left origin).
    pub fn to_view_point(&self, p: PagePoint) -> ViewPoint {
        ViewPoint::new(
            (self.page_origin_x + p.x) * self.zoom - self.scroll_x,
            (self.page_origin_y + (self.page_height - p.y)) * self.zoom - self.scroll_y,
        )
    }

    /// View point → display-space point.
    pub fn to_display_point(&self, p: ViewPoint) -> PagePoint {
        PagePoint::new(
            (p.x + self.scroll_x) / self.zoom - self.page_origin_x,
            self.page_height - ((p.y + self.scroll_y) / self.zoom - self.page_origin_y),
        )
    }

    /// Display-space rectangle → view rectangle.
    ///
    /// The view rect's top-left corner corresponds to the display rect's
    /// top-left corner (`x`, `top()`).
    pub fn to_view_rect(&self, r: PageRect) -> ViewRect {
        let top_left = self.to_view_point(PagePoint::new(r.x, r.top()));
        ViewRect::new(
            top_left.x,
            top_left.y,
            r.width * self.zoom,
            r.height * self.zoom,
        )
    }

    /// View rectangle → display-space rectangle.
    pub fn to_display_rect(&self, r: ViewRect) -> PageRect {
        let width = r.width / self.zoom;
        let height = r.height / self.zoom;
        let top_left = self.to_display_point(ViewPoint::new(r.x, r.y));
        PageRect::new(top_left.x, top_left.y - height, width, height)
    }
}

// ---------------------------------------------------------------------------
// Viewer layout
// ---------------------------------------------------------------------------

/// One page's placement on the scrollable surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// 1-indexed page number, matching the document model.
    pub number: u32,
    /// Top-left corner of the displayed page in unscaled content coordinates.
    pub origin_x: f32,
    pub origin_y: f32,
    /// Unrotated page dimensions in page units.
    pub width: f32,
    pub height: f32,
    pub rotation: PageRotation,
}

impl PageGeometry {
    /// Displayed width (rotation applied).
    pub fn display_width(&self) -> f32 {
        if self.rotation.is_quarter_turn() {
            self.height
        } else {
            self.width
        }
    }

    /// Displayed height (rotation applied).
    pub fn display_height(&self) -> f32 {
        if self.rotation.is_quarter_turn() {
            self.width
        } else {
            self.height
        }
    }
}

/// The scrollable viewing surface: page placements plus the current
/// zoom/scroll state.
///
/// The layout must be re-queried on every scroll or zoom change while an
/// editing overlay is visible — the overlay's view frame is recomputed from
/// the authoritative page-space bounds each time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerLayout {
    pub zoom: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    pages: Vec<PageGeometry>,
}

impl ViewerLayout {
    pub fn new(zoom: f32, scroll_x: f32, scroll_y: f32, pages: Vec<PageGeometry>) -> Self {
        Self {
            zoom,
            scroll_x,
            scroll_y,
            pages,
        }
    }

    /// Stack pages vertically at x = 0 with `spacing` content units between
    /// them, in the given order.
    pub fn stacked(
        zoom: f32,
        scroll_x: f32,
        scroll_y: f32,
        sizes: &[(f32, f32, PageRotation)],
        spacing: f32,
    ) -> Self {
        let mut pages = Vec::with_capacity(sizes.len());
        let mut y = 0.0f32;
        for (i, &(width, height, rotation)) in sizes.iter().enumerate() {
            let geom = PageGeometry {
                number: (i + 1) as u32,
                origin_x: 0.0,
                origin_y: y,
                width,
                height,
                rotation,
            };
            y += geom.display_height() + spacing;
            pages.push(geom);
        }
        Self::new(zoom, scroll_x, scroll_y, pages)
    }

    pub fn pages(&self) -> &[PageGeometry] {
        &self.pages
    }

    pub fn page(&self, number: u32) -> Option<&PageGeometry> {
        self.pages.iter().find(|p| p.number == number)
    }

    fn transform_for(&self, page: &PageGeometry) -> ViewTransform {
        ViewTransform {
            zoom: self.zoom,
            scroll_x: self.scroll_x,
            scroll_y: self.scroll_y,
            page_origin_x: page.origin_x,
            page_origin_y: page.origin_y,
            page_height: page.display_height(),
        }
    }

    /// The page under a view point, if any.
    pub fn page_at(&self, point: ViewPoint) -> Option<&PageGeometry> {
        let content_x = (point.x + self.scroll_x) / self.zoom;
        let content_y = (point.y + self.scroll_y) / self.zoom;
        self.pages.iter().find(|p| {
            content_x >= p.origin_x
                && content_x <= p.origin_x + p.display_width()
                && content_y >= p.origin_y
                && content_y <= p.origin_y + p.display_height()
        })
    }

    /// Map a view point onto the page under it, in stored page space.
    pub fn locate_point(&self, point: ViewPoint) -> Option<(u32, PagePoint)> {
        let page = self.page_at(point)?;
        let display = self.transform_for(page).to_display_point(point);
        let stored = rotate_point_from_display(display, page.rotation, page.width, page.height);
        Some((page.number, stored))
    }

    /// Map a drawn view rectangle onto the page under its center, expressed
    /// in that page's stored coordinate space.
    pub fn locate_rect(&self, rect: ViewRect) -> Option<(u32, PageRect)> {
        let page = self.page_at(rect.center())?;
        let display = self.transform_for(page).to_display_rect(rect);
        let stored = rotate_rect_from_display(display, page.rotation, page.width, page.height);
        Some((page.number, stored))
    }

    /// Project a page-space rectangle back onto the viewing surface.
    pub fn project_rect(&self, page_number: u32, rect: PageRect) -> Option<ViewRect> {
        let page = self.page(page_number)?;
        let display = rotate_rect_to_display(rect, page.rotation, page.width, page.height);
        Some(self.transform_for(page).to_view_rect(display))
    }

    /// Map a view rectangle into a *specific* page's stored space, without
    /// center hit-testing.
    ///
    /// Used while the overlay is dragged: the session's page is already
    /// fixed, and the frame may momentarily hang past the page edge.
    pub fn unproject_rect(&self, page_number: u32, rect: ViewRect) -> Option<PageRect> {
        let page = self.page(page_number)?;
        let display = self.transform_for(page).to_display_rect(rect);
        Some(rotate_rect_from_display(
            display,
            page.rotation,
            page.width,
            page.height,
        ))
    }
}
