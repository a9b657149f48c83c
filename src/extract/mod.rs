//! Step image attribution.
//!
//! The pipeline runs in three passes over a [`DocumentBackend`]: the
//! [`StepLocator`] finds where each step starts and ends, [`assemble`] cuts
//! every step into per-page slices and saves the images inside them through a
//! [`RegionExtractor`], and [`select_main_image`] picks the representative
//! photograph of the manual.
//!
//! [`DocumentBackend`]: crate::parser::DocumentBackend

mod assembler;
mod locator;
mod main_image;
mod region;

pub use assembler::{assemble, slice_range};
pub use locator::{StepLocator, STEP_PATTERN, TERMINAL_PATTERN};
pub use main_image::{select_main_image, MAIN_IMAGE_PAGE};
pub use region::{select_images, RegionExtractor};
