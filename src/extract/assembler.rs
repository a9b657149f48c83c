//! Step image assembly.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::model::{Page, StepBoundaries, StepBoundary, StepImageMap, VerticalRange};
use crate::parser::{DocumentBackend, ErrorMode};

use super::region::RegionExtractor;

/// Collect the images of every step.
///
/// Each step is cut into per-page slices: a step on a single page covers
/// `[start_y, end_y]`; otherwise its first page covers `[start_y, height]`,
/// interior pages are taken whole and the last page covers `[0, end_y]`.
/// Every label gets an entry, possibly empty.
pub fn assemble<B: DocumentBackend + ?Sized>(
    boundaries: &StepBoundaries,
    extractor: &RegionExtractor<'_, B>,
) -> Result<StepImageMap> {
    let error_mode = extractor.error_mode();
    let mut pages = PageCache::new(extractor.backend(), error_mode);
    let mut entries = Vec::with_capacity(boundaries.len());

    for boundary in boundaries {
        let mut images: Vec<PathBuf> = Vec::new();

        for page_index in boundary.start_page()..=boundary.end_page() {
            let Some(page) = pages.get(page_index)? else {
                continue;
            };

            let range = match slice_range(boundary, page_index, page.height()) {
                Ok(range) => range,
                Err(e) if error_mode == ErrorMode::Lenient => {
                    log::warn!("{} on page {}: {}", boundary.label(), page_index, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            images.extend(extractor.extract(page, range)?);
        }

        log::debug!(
            "{}: {} images over {} pages",
            boundary.label(),
            images.len(),
            boundary.page_span()
        );
        entries.push((boundary.label().clone(), images));
    }

    Ok(StepImageMap::from_entries(entries))
}

/// Vertical slice of `page_index` covered by `boundary`; `None` means the whole page.
pub fn slice_range(
    boundary: &StepBoundary,
    page_index: usize,
    page_height: f32,
) -> Result<Option<VerticalRange>> {
    if boundary.is_single_page() {
        return VerticalRange::new(boundary.start_y(), boundary.end_y()).map(Some);
    }
    if page_index == boundary.start_page() {
        return VerticalRange::new(boundary.start_y(), page_height).map(Some);
    }
    if page_index == boundary.end_page() {
        return VerticalRange::new(0.0, boundary.end_y()).map(Some);
    }
    Ok(None)
}

/// Pages loaded once per assembly; steps sharing a page reuse it.
struct PageCache<'b, B: DocumentBackend + ?Sized> {
    backend: &'b B,
    error_mode: ErrorMode,
    pages: HashMap<usize, Option<Page>>,
}

impl<'b, B: DocumentBackend + ?Sized> PageCache<'b, B> {
    fn new(backend: &'b B, error_mode: ErrorMode) -> Self {
        Self {
            backend,
            error_mode,
            pages: HashMap::new(),
        }
    }

    /// The page, or `None` for an unreadable page in lenient mode.
    fn get(&mut self, index: usize) -> Result<Option<&Page>> {
        if !self.pages.contains_key(&index) {
            let page = match self.backend.load_page(index) {
                Ok(page) => Some(page),
                Err(e) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!("Page {} could not be read, skipping its images: {}", index, e);
                    None
                }
                Err(e) => return Err(e),
            };
            self.pages.insert(index, page);
        }
        Ok(self.pages.get(&index).and_then(Option::as_ref))
    }
}
