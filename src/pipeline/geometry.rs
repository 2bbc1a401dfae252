//! Geometry predicates over positioned text fragments.
//!
//! Pure functions of a bounding box plus the page's known width/height —
//! no hidden state, identical inputs always yield identical output. The
//! tagger combines these with content regexes to classify fragments into
//! script roles; the thresholds come from [`crate::config::ScriptLayout`].
//!
//! Coordinates are PDF points with the origin at the page's bottom-left
//! corner: `y0` is the bottom edge of a box, `y1` the top.

/// An axis-aligned bounding box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, x1: f32, y0: f32, y1: f32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// True if this box overlaps `other` at all (shared edges count).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x0 <= other.x1 && self.x1 >= other.x0 && self.y0 <= other.y1 && self.y1 >= other.y0
    }
}

/// True if the fragment's horizontal midpoint is within a relative
/// tolerance of the page's horizontal midpoint.
pub fn is_centered(bbox: &BoundingBox, page_width: f32, rel_tolerance: f32) -> bool {
    let page_middle = page_width / 2.0;
    let el_middle = (bbox.x0 + bbox.x1) / 2.0;
    // math.isclose semantics: |a - b| <= rel_tol * max(|a|, |b|)
    (el_middle - page_middle).abs() <= rel_tolerance * el_middle.abs().max(page_middle.abs())
}

/// True if the fragment's lower-left corner lies at or beyond both
/// thresholds — the corner region where page numbers sit.
pub fn is_in_top_right(bbox: &BoundingBox, min_x: f32, min_y: f32) -> bool {
    bbox.x0 >= min_x && bbox.y0 >= min_y
}

/// True if the fragment's bounding box does not even partially overlap the
/// page's own box (0, width) × (0, height) — an extraction artifact.
pub fn is_off_page(bbox: &BoundingBox, page_width: f32, page_height: f32) -> bool {
    let page = BoundingBox::new(0.0, page_width, 0.0, page_height);
    !bbox.overlaps(&page)
}

/// True if the fragment's left edge is within an absolute tolerance of a
/// target indentation — the fragment sits in that indentation lane.
pub fn by_indent(bbox: &BoundingBox, target: f32, tolerance: f32) -> bool {
    (bbox.x0 - target).abs() <= tolerance
}

/// True if the fragment's left edge exceeds a threshold — used to exclude
/// near-margin text from a role search.
pub fn by_min_indent(bbox: &BoundingBox, threshold: f32) -> bool {
    bbox.x0 > threshold
}
