//! Embedded image placements.

use serde::{Deserialize, Serialize};

use super::Rect;

/// Page-local reference to an image XObject: (object number, generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef(pub u32, pub u16);

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.0, self.1)
    }
}

impl From<lopdf::ObjectId> for ImageRef {
    fn from(id: lopdf::ObjectId) -> Self {
        ImageRef(id.0, id.1)
    }
}

impl From<ImageRef> for lopdf::ObjectId {
    fn from(xref: ImageRef) -> Self {
        (xref.0, xref.1)
    }
}

/// One embedded raster image placed on a page.
///
/// Holds position data only. Pixels are fetched from the backend when the
/// image is accepted and dropped once the PNG is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Image reference
    pub xref: ImageRef,

    /// Resource name on the page (e.g., "Im0")
    pub name: String,

    /// Placement on the page
    pub bbox: Rect,

    /// Index of the page the image is placed on (0-based)
    pub page_index: usize,
}

impl ImageRecord {
    /// Create a new image record.
    pub fn new(xref: ImageRef, name: impl Into<String>, bbox: Rect, page_index: usize) -> Self {
        Self {
            xref,
            name: name.into(),
            bbox,
            page_index,
        }
    }

    /// Top edge of the placement.
    pub fn top(&self) -> f32 {
        self.bbox.y0
    }

    /// Bottom edge of the placement.
    pub fn bottom(&self) -> f32 {
        self.bbox.y1
    }
}
