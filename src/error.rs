//! Error types for teardown library.

use std::io;
use thiserror::Error;

/// Result type alias for teardown operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while attributing images to steps.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading documents or writing images.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a PDF nor a CSV manual.
    #[error("Unknown file format: expected a PDF or CSV manual")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF document has no pages.
    #[error("Document has no pages")]
    EmptyDocument,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// An embedded image could not be decoded into pixels.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// A decoded image could not be encoded or written as PNG.
    #[error("Image encoding error: {0}")]
    ImageEncode(String),

    /// Header/footer margin ratio outside `[0, 0.5)`.
    #[error("Header margin ratio {0} is outside [0, 0.5)")]
    InvalidMarginRatio(f32),

    /// A vertical range whose start lies below its end.
    #[error("Invalid vertical range: start {start} is after end {end}")]
    InvalidRange {
        /// Top of the range
        start: f32,
        /// Bottom of the range
        end: f32,
    },

    /// A step boundary that ends before it starts.
    #[error("Invalid step boundary: {0}")]
    InvalidBoundary(String),

    /// A step label seen twice under the reject policy.
    #[error("Duplicate step marker: {0}")]
    DuplicateStep(String),

    /// A marker or glob pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    /// Error serializing results.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                Error::ImageExtract(err.to_string())
            }
            _ => Error::ImageEncode(err.to_string()),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Pattern(err.to_string())
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::Pattern(err.to_string())
    }
}
