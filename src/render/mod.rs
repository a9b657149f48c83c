//! Rendering module for handing attribution results downstream.

mod json;

pub use json::{step_images_prompt_json, to_json, JsonFormat};
