//! JSON rendering for attribution results.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{ManualImages, StepImageMap};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a manual's attribution result to JSON.
pub fn to_json(manual: &ManualImages, format: JsonFormat) -> Result<String> {
    serialize(manual, format)
}

/// Render step images in the shape the prompt stage consumes:
/// `{"Step N": [{"link": "<path>"}, ...]}`.
pub fn step_images_prompt_json(step_images: &StepImageMap, format: JsonFormat) -> Result<String> {
    serialize(&step_images.to_prompt_value(), format)
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
