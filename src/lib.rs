//! # teardown
//!
//! Step-level photograph attribution for battery-pack disassembly manuals.
//!
//! A disassembly manual interleaves numbered instructions (`Step 1:`,
//! `Step 2:`, ...) with photographs. This library locates where each step
//! starts and ends across pages, saves the photographs lying inside each
//! step's extent as PNG files, and picks a representative photograph for the
//! whole manual, so that a downstream stage can attach them to structured
//! step records.
//!
//! ## Quick Start
//!
//! ```no_run
//! use teardown::{extract_step_images, extract_main_image};
//!
//! fn main() -> teardown::Result<()> {
//!     let steps = extract_step_images("manuals/pack-a.pdf")?;
//!     for (label, images) in steps.iter() {
//!         println!("{}: {} images", label, images.len());
//!     }
//!
//!     let main = extract_main_image("manuals/pack-a.pdf")?;
//!     println!("main image: {:?}", main);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Cross-page steps**: a step may start on one page and end several pages later
//! - **Header/footer filtering**: logos and page furniture are skipped
//! - **PDF and CSV manuals**: CSV step tables yield empty results
//! - **Parallel processing**: Uses Rayon for directories of manuals

pub mod batch;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use batch::extract_directory;
pub use detect::{detect_format_from_bytes, detect_input_kind_from_path, InputKind, PdfFormat};
pub use error::{Error, Result};
pub use extract::{RegionExtractor, StepLocator};
pub use model::{
    DuplicateStepPolicy, ImageRecord, ImageRef, ManualImages, Page, PageLine, Rect,
    StepBoundaries, StepBoundary, StepImageMap, StepLabel, VerticalRange,
};
pub use parser::{DocumentBackend, ErrorMode, ExtractOptions, LopdfBackend, ManualParser, MemoryBackend};
pub use render::JsonFormat;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Attribute the photographs of a PDF manual to its steps.
///
/// Images are saved under `images/`.
///
/// # Example
///
/// ```no_run
/// use teardown::extract_step_images;
///
/// let steps = extract_step_images("manual.pdf").unwrap();
/// if let Some(images) = steps.pictures_for_step(3) {
///     println!("Step 3 has {} images", images.len());
/// }
/// ```
pub fn extract_step_images<P: AsRef<Path>>(path: P) -> Result<StepImageMap> {
    extract_step_images_with_options(path, ExtractOptions::default())
}

/// Attribute the photographs of a PDF manual to its steps, with custom options.
///
/// # Example
///
/// ```no_run
/// use teardown::{extract_step_images_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new()
///     .with_output_dir("out/images")
///     .with_header_margin_ratio(0.1)
///     .strict();
/// let steps = extract_step_images_with_options("manual.pdf", options).unwrap();
/// ```
pub fn extract_step_images_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<StepImageMap> {
    ManualParser::open_with_options(path, options)?.step_images()
}

/// Save the representative photograph of a PDF manual.
///
/// This is the first image of the second page that lies outside the header
/// and footer bands; `None` when there is no such image.
pub fn extract_main_image<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>> {
    extract_main_image_with_options(path, ExtractOptions::default())
}

/// Save the representative photograph of a PDF manual, with custom options.
pub fn extract_main_image_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Option<PathBuf>> {
    ManualParser::open_with_options(path, options)?.main_image()
}

/// Process one manual of either kind.
///
/// PDF manuals run the full pipeline; CSV manuals carry no photographs and
/// yield an empty result.
///
/// # Example
///
/// ```no_run
/// use teardown::{process_manual, render, ExtractOptions, JsonFormat};
///
/// let manual = process_manual("docs/pack.pdf", &ExtractOptions::default()).unwrap();
/// println!("{}", render::to_json(&manual, JsonFormat::Pretty).unwrap());
/// ```
pub fn process_manual<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<ManualImages> {
    let path = path.as_ref();
    match detect_input_kind_from_path(path)? {
        InputKind::Csv => {
            log::info!("{}: CSV manual, no images to extract", path.display());
            Ok(ManualImages::empty(path, InputKind::Csv))
        }
        InputKind::Pdf(_) => ManualParser::open_with_options(path, options.clone())?.parse(),
    }
}

/// Builder for attributing manual images.
///
/// # Example
///
/// ```no_run
/// use teardown::Teardown;
///
/// let manual = Teardown::new()
///     .with_output_dir("./images")
///     .with_header_margin_ratio(0.15)
///     .lenient()
///     .parse("manual.pdf")?;
/// println!("{}", manual.main_image_link());
/// # Ok::<(), teardown::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Teardown {
    options: ExtractOptions,
}

impl Teardown {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set image output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_output_dir(dir);
        self
    }

    /// Set the header/footer margin ratio.
    pub fn with_header_margin_ratio(mut self, ratio: f32) -> Self {
        self.options = self.options.with_header_margin_ratio(ratio);
        self
    }

    /// Fail on the first image or boundary error.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Skip failing images and repair boundaries, with warnings.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Set the duplicate step policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicateStepPolicy) -> Self {
        self.options = self.options.with_duplicate_policy(policy);
        self
    }

    /// Disable parallel processing of directories.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// The options this builder will run with.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Process a manual file.
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<ManualImages> {
        process_manual(path, &self.options)
    }

    /// Process a PDF manual held in memory.
    pub fn parse_bytes(&self, data: &[u8]) -> Result<ManualImages> {
        ManualParser::from_bytes_with_options(data, self.options.clone())?.parse()
    }

    /// Process every PDF manual below a directory.
    pub fn parse_directory<P: AsRef<Path>>(&self, dir: P) -> Result<BTreeMap<PathBuf, ManualImages>> {
        extract_directory(dir, &self.options)
    }
}
