//! Page-space geometry.
//!
//! All coordinates are in page space: points from the top-left corner of the
//! page, with `y` increasing downward.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle, normalizing the corner order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Rectangle width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Rectangle height.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether the rectangle lies entirely inside `range` vertically.
    pub fn within(&self, range: &VerticalRange) -> bool {
        self.y0 >= range.start && self.y1 <= range.end
    }
}

/// A vertical slice `[start, end]` of a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalRange {
    /// Top of the slice
    pub start: f32,
    /// Bottom of the slice
    pub end: f32,
}

impl VerticalRange {
    /// Create a range, rejecting `start > end` and NaN bounds.
    pub fn new(start: f32, end: f32) -> Result<Self> {
        if start.is_nan() || end.is_nan() || start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole page height `[0, height]`.
    pub fn full(height: f32) -> Self {
        Self {
            start: 0.0,
            end: height.max(0.0),
        }
    }

    /// Slice length.
    pub fn len(&self) -> f32 {
        self.end - self.start
    }

    /// Whether the slice has zero height.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}
