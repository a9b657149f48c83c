//! Document model types for step image attribution.
//!
//! This module defines the page view the attribution engine reads, the step
//! boundaries it infers, and the mappings it hands downstream. Coordinates
//! are in page space, y increasing downward.

mod geometry;
mod image;
mod manual;
mod page;
mod step;
mod step_images;

pub use geometry::{Rect, VerticalRange};
pub use image::{ImageRecord, ImageRef};
pub use manual::ManualImages;
pub use page::{Page, PageLine};
pub use step::{DuplicateStepPolicy, OpenStep, StepBoundaries, StepBoundary, StepLabel, Upsert};
pub use step_images::StepImageMap;
