//! Document parsing module.

mod backend;
mod layout;
mod memory;
mod options;
mod pdf_parser;
mod raster;

pub use backend::{decode_text_simple, DocumentBackend, LopdfBackend, MediaBox, PageFrame};
pub use layout::{group_spans_into_lines, ImagePlacement, PageContent, PageInterpreter, TextLine, TextSpan};
pub use memory::MemoryBackend;
pub(crate) use options::validate_margin_ratio;
pub use options::{ErrorMode, ExtractOptions, DEFAULT_HEADER_MARGIN_RATIO, DEFAULT_OUTPUT_DIR};
pub use pdf_parser::ManualParser;
