//! Manual parser for PDF disassembly manuals.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::detect::{detect_format_from_bytes, InputKind, PdfFormat};
use crate::error::Result;
use crate::extract::{assemble, select_main_image, RegionExtractor, StepLocator};
use crate::model::{ManualImages, StepBoundaries, StepImageMap};

use super::backend::{DocumentBackend, LopdfBackend};
use super::options::ExtractOptions;

/// PDF manual parser.
///
/// Loads the document once and runs the attribution pipeline over it.
pub struct ManualParser {
    backend: LopdfBackend,
    format: PdfFormat,
    source: PathBuf,
    options: ExtractOptions,
}

impl ManualParser {
    /// Open a PDF manual.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ExtractOptions::default())
    }

    /// Open a PDF manual with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes_with_options(&data, options)?.with_source(path))
    }

    /// Parse a PDF manual from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Parse a PDF manual from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;

        Ok(Self {
            backend,
            format,
            source: PathBuf::new(),
            options,
        })
    }

    /// Parse a PDF manual from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ExtractOptions::default())
    }

    /// Parse a PDF manual from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ExtractOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Record the path the manual was read from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Locate the step boundaries only.
    pub fn step_boundaries(&self) -> Result<StepBoundaries> {
        self.options.validate()?;
        StepLocator::new()?.locate(&self.backend, &self.options)
    }

    /// Attribute images to steps, without selecting a main image.
    pub fn step_images(&self) -> Result<StepImageMap> {
        let boundaries = self.step_boundaries()?;
        let extractor = RegionExtractor::new(&self.backend, &self.options)?;
        assemble(&boundaries, &extractor)
    }

    /// Select and save the main image only.
    pub fn main_image(&self) -> Result<Option<PathBuf>> {
        let extractor = RegionExtractor::new(&self.backend, &self.options)?;
        select_main_image(&extractor)
    }

    /// Run the full pipeline: step images, then the main image.
    pub fn parse(&self) -> Result<ManualImages> {
        let step_images = self.step_images()?;
        let main_image = self.main_image()?;

        let manual = ManualImages {
            source: self.source.clone(),
            kind: InputKind::Pdf(self.format.clone()),
            main_image,
            step_images,
        };

        log::info!(
            "{}: {} steps, {} images",
            self.source.display(),
            manual.step_images.len(),
            manual.image_count()
        );
        Ok(manual)
    }

    /// The loaded document.
    pub fn backend(&self) -> &LopdfBackend {
        &self.backend
    }

    /// Options used by [`ManualParser::parse`].
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Get PDF version.
    pub fn version(&self) -> &str {
        &self.format.version
    }
}
