//! Region image extraction.
//!
//! Saves the images of one page that lie inside the page body (outside the
//! header and footer bands) and, optionally, inside a vertical range.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{ImageRecord, Page, VerticalRange};
use crate::parser::{validate_margin_ratio, DocumentBackend, ErrorMode, ExtractOptions};

/// Images of `page` that pass the header/footer and range filters.
///
/// An image is rejected when its top lies in the header band
/// (`y0 < h * ratio`), its bottom lies in the footer band
/// (`y1 > h * (1 - ratio)`), or, with a range, when it is not fully inside
/// `[start, end]`. Native page order is kept.
pub fn select_images<'p>(
    page: &'p Page,
    header_margin_ratio: f32,
    range: Option<&VerticalRange>,
) -> Vec<&'p ImageRecord> {
    let height = page.height();
    let header_limit = height * header_margin_ratio;
    let footer_limit = height * (1.0 - header_margin_ratio);

    page.images()
        .iter()
        .filter(|image| {
            let bbox = &image.bbox;
            if bbox.y0 < header_limit {
                log::trace!("Page {}: {} rejected (header band)", page.index, image.xref);
                return false;
            }
            if bbox.y1 > footer_limit {
                log::trace!("Page {}: {} rejected (footer band)", page.index, image.xref);
                return false;
            }
            if let Some(range) = range {
                if !bbox.within(range) {
                    log::trace!(
                        "Page {}: {} outside [{}, {}]",
                        page.index,
                        image.xref,
                        range.start,
                        range.end
                    );
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Saves accepted page images as PNG files.
pub struct RegionExtractor<'b, B: DocumentBackend + ?Sized> {
    backend: &'b B,
    output_dir: PathBuf,
    header_margin_ratio: f32,
    error_mode: ErrorMode,
}

impl<'b, B: DocumentBackend + ?Sized> RegionExtractor<'b, B> {
    /// Create an extractor reading pixels from `backend`.
    pub fn new(backend: &'b B, options: &ExtractOptions) -> Result<Self> {
        validate_margin_ratio(options.header_margin_ratio)?;
        Ok(Self {
            backend,
            output_dir: options.output_dir.clone(),
            header_margin_ratio: options.header_margin_ratio,
            error_mode: options.error_mode,
        })
    }

    /// The backend images are read from.
    pub fn backend(&self) -> &'b B {
        self.backend
    }

    /// How decode and write failures are handled.
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Directory receiving saved images.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save the accepted images of `page`, returning their paths in page order.
    ///
    /// In lenient mode an image that cannot be decoded or written is skipped
    /// with a warning; in strict mode the first such failure is returned.
    pub fn extract(&self, page: &Page, range: Option<VerticalRange>) -> Result<Vec<PathBuf>> {
        let accepted = select_images(page, self.header_margin_ratio, range.as_ref());
        let mut saved = Vec::with_capacity(accepted.len());

        for image in accepted {
            match self.save_image(image) {
                Ok(path) => saved.push(path),
                Err(e) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!(
                        "Skipping image {} on page {}: {}",
                        image.xref,
                        page.index,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!(
            "Page {}: saved {} of {} images",
            page.index,
            saved.len(),
            page.images().len()
        );
        Ok(saved)
    }

    /// Save only the first accepted image of `page` that can be written.
    pub fn extract_first(&self, page: &Page, range: Option<VerticalRange>) -> Result<Option<PathBuf>> {
        for image in select_images(page, self.header_margin_ratio, range.as_ref()) {
            match self.save_image(image) {
                Ok(path) => return Ok(Some(path)),
                Err(e) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!(
                        "Skipping image {} on page {}: {}",
                        image.xref,
                        page.index,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn save_image(&self, image: &ImageRecord) -> Result<PathBuf> {
        let pixels = self.backend.decode_image(image)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.png", Uuid::new_v4()));
        pixels
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => Error::Io(io),
                other => Error::ImageEncode(other.to_string()),
            })?;

        Ok(path)
    }
}
