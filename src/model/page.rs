//! Page-level types.

use super::{ImageRecord, Rect};
use serde::{Deserialize, Serialize};

/// One line of page text with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLine {
    /// Line text
    pub text: String,

    /// Line extent on the page
    pub bbox: Rect,
}

impl PageLine {
    /// Create a new line.
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// A read-only view of a single page.
///
/// Lines are in reading order (top to bottom), images in the order the page
/// places them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Text lines in reading order
    pub lines: Vec<PageLine>,

    /// Image placements in native order
    pub images: Vec<ImageRecord>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            lines: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(index: usize) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Add a text line.
    pub fn add_line(&mut self, line: PageLine) {
        self.lines.push(line);
    }

    /// Add an image placement.
    pub fn add_image(&mut self, image: ImageRecord) {
        self.images.push(image);
    }

    /// Builder-style [`Page::add_line`].
    pub fn with_line(mut self, text: impl Into<String>, bbox: Rect) -> Self {
        self.add_line(PageLine::new(text, bbox));
        self
    }

    /// Builder-style [`Page::add_image`].
    pub fn with_image(mut self, image: ImageRecord) -> Self {
        self.add_image(image);
        self
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Text lines in reading order.
    pub fn lines(&self) -> &[PageLine] {
        &self.lines
    }

    /// Image placements in native order.
    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// Plain text of the page, one line per text line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bounding boxes of the lines containing `needle`, in line order.
    ///
    /// Matching is literal and case-sensitive. Leading and trailing
    /// whitespace of `needle` is ignored.
    pub fn search_for(&self, needle: &str) -> Vec<Rect> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Vec::new();
        }

        self.lines
            .iter()
            .filter(|line| line.text.contains(needle))
            .map(|line| line.bbox)
            .collect()
    }

    /// Check if the page has neither text nor images.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageRef;

    fn sample_page() -> Page {
        Page::new(0, 600.0, 800.0)
            .with_line("Battery Pack Model X", Rect::new(50.0, 40.0, 300.0, 55.0))
            .with_line("Step 1: Remove the lid", Rect::new(50.0, 200.0, 300.0, 214.0))
            .with_line("Step 1: Remove the lid", Rect::new(50.0, 600.0, 300.0, 614.0))
    }

    #[test]
    fn test_page_text_joins_lines() {
        let page = sample_page();
        assert_eq!(
            page.text(),
            "Battery Pack Model X\nStep 1: Remove the lid\nStep 1: Remove the lid"
        );
    }

    #[test]
    fn test_search_for_returns_all_hits_in_order() {
        let page = sample_page();
        let hits = page.search_for("  Step 1: Remove the lid ");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].y0, 200.0);
        assert_eq!(hits[1].y0, 600.0);
    }

    #[test]
    fn test_search_for_is_case_sensitive() {
        let page = sample_page();
        assert!(page.search_for("step 1:").is_empty());
        assert!(page.search_for("").is_empty());
    }

    #[test]
    fn test_page_images_keep_order() {
        let page = Page::letter(3)
            .with_image(ImageRecord::new(ImageRef(9, 0), "Im1", Rect::default(), 3))
            .with_image(ImageRecord::new(ImageRef(4, 0), "Im0", Rect::default(), 3));
        let names: Vec<_> = page.images().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Im1", "Im0"]);
        assert!(!page.is_empty());
    }
}
