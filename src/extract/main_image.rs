//! Main image selection.

use std::path::PathBuf;

use crate::error::Result;
use crate::parser::{DocumentBackend, ErrorMode};

use super::region::RegionExtractor;

/// Page holding the representative photograph; the first page is the cover.
pub const MAIN_IMAGE_PAGE: usize = 1;

/// The first accepted image of the second page, if any.
///
/// Documents with fewer than two pages have no main image.
pub fn select_main_image<B: DocumentBackend + ?Sized>(
    extractor: &RegionExtractor<'_, B>,
) -> Result<Option<PathBuf>> {
    let backend = extractor.backend();
    if backend.page_count() <= MAIN_IMAGE_PAGE {
        log::debug!("No main image: document has {} pages", backend.page_count());
        return Ok(None);
    }

    let page = match backend.load_page(MAIN_IMAGE_PAGE) {
        Ok(page) => page,
        Err(e) if extractor.error_mode() == ErrorMode::Lenient => {
            log::warn!("Page {} could not be read, no main image: {}", MAIN_IMAGE_PAGE, e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let main = extractor.extract_first(&page, None)?;
    match &main {
        Some(path) => log::debug!("Main image saved to {}", path.display()),
        None => log::debug!("No accepted image on page {}", MAIN_IMAGE_PAGE),
    }
    Ok(main)
}
