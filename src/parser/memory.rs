//! In-memory document backend.
//!
//! Holds prebuilt pages and decoded pixels, for feeding the attribution
//! pipeline from another page source and for exercising it without a PDF.

use std::collections::HashMap;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::model::{ImageRecord, ImageRef, Page};

use super::backend::DocumentBackend;

/// A [`DocumentBackend`] over pages that are already laid out.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pages: Vec<Page>,
    pixels: HashMap<ImageRef, DynamicImage>,
}

impl MemoryBackend {
    /// Create a backend over `pages`; page `i` must have index `i`.
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            pixels: HashMap::new(),
        }
    }

    /// Add a page at the end.
    pub fn push_page(&mut self, mut page: Page) {
        page.index = self.pages.len();
        for image in &mut page.images {
            image.page_index = page.index;
        }
        self.pages.push(page);
    }

    /// Register the pixels returned for an image reference.
    pub fn set_pixels(&mut self, xref: ImageRef, pixels: DynamicImage) {
        self.pixels.insert(xref, pixels);
    }

    /// Builder form of [`MemoryBackend::set_pixels`].
    pub fn with_pixels(mut self, xref: ImageRef, pixels: DynamicImage) -> Self {
        self.set_pixels(xref, pixels);
        self
    }

    /// All pages.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn page(&self, index: usize) -> Result<&Page> {
        self.pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }
}

impl DocumentBackend for MemoryBackend {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_height(&self, index: usize) -> Result<f32> {
        Ok(self.page(index)?.height)
    }

    fn load_page(&self, index: usize) -> Result<Page> {
        self.page(index).cloned()
    }

    fn decode_image(&self, image: &ImageRecord) -> Result<DynamicImage> {
        self.pixels
            .get(&image.xref)
            .cloned()
            .ok_or_else(|| Error::ImageExtract(format!("No pixels for image {}", image.xref)))
    }
}
