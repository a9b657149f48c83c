//! Extraction options and configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::model::DuplicateStepPolicy;

/// Default directory for saved images.
pub const DEFAULT_OUTPUT_DIR: &str = "images/";

/// Default fraction of the page height treated as header and as footer.
pub const DEFAULT_HEADER_MARGIN_RATIO: f32 = 0.2;

/// Options for attributing images to steps.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory receiving the saved PNG files
    pub output_dir: PathBuf,

    /// Fraction of the page height excluded at the top and at the bottom
    pub header_margin_ratio: f32,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// What to do with a repeated step marker
    pub duplicate_policy: DuplicateStepPolicy,

    /// Whether batch runs process documents in parallel
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the header/footer margin ratio.
    pub fn with_header_margin_ratio(mut self, ratio: f32) -> Self {
        self.header_margin_ratio = ratio;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first image or boundary error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Skip failing images and repair boundaries, with warnings.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the duplicate step policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicateStepPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check the configured values.
    pub fn validate(&self) -> Result<()> {
        validate_margin_ratio(self.header_margin_ratio)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            header_margin_ratio: DEFAULT_HEADER_MARGIN_RATIO,
            error_mode: ErrorMode::Lenient,
            duplicate_policy: DuplicateStepPolicy::Replace,
            parallel: true,
        }
    }
}

/// Reject ratios outside `[0, 0.5)`.
pub(crate) fn validate_margin_ratio(ratio: f32) -> Result<()> {
    if (0.0..0.5).contains(&ratio) {
        Ok(())
    } else {
        Err(Error::InvalidMarginRatio(ratio))
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any image, page or boundary error
    Strict,
    /// Log a warning, skip or repair, and continue
    #[default]
    Lenient,
}
