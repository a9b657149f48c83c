//! The final step → photographs mapping.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::StepLabel;

/// Ordered mapping from step label to the saved images attributed to it.
///
/// Keys follow step first-seen order; each list follows page order, then
/// in-page image order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepImageMap {
    entries: IndexMap<StepLabel, Vec<PathBuf>>,
}

impl StepImageMap {
    /// Build from `(label, paths)` pairs, keeping their order.
    pub fn from_entries(entries: impl IntoIterator<Item = (StepLabel, Vec<PathBuf>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Images of a step, by label text.
    pub fn get(&self, label: &str) -> Option<&[PathBuf]> {
        self.entries.get(label).map(Vec::as_slice)
    }

    /// Images of a step, by step number.
    ///
    /// This is the lookup the structured-record stage uses: it knows step
    /// numbers, not labels.
    pub fn pictures_for_step(&self, number: u32) -> Option<&[PathBuf]> {
        self.entries
            .iter()
            .find(|(key, _)| key.number() == number)
            .map(|(_, paths)| paths.as_slice())
    }

    /// `(label, images)` pairs in step order.
    pub fn iter(&self) -> impl Iterator<Item = (&StepLabel, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(label, paths)| (label, paths.as_slice()))
    }

    /// Labels in step order.
    pub fn labels(&self) -> impl Iterator<Item = &StepLabel> {
        self.entries.keys()
    }

    /// All saved images, in step order.
    pub fn all_images(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().flatten().map(PathBuf::as_path)
    }

    /// Total number of attributed images.
    pub fn image_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// The prompt-stage shape: `{"Step N": [{"link": "<path>"}, ...]}`.
    pub fn to_prompt_value(&self) -> serde_json::Value {
        let object = self
            .entries
            .iter()
            .map(|(label, paths)| {
                let links = paths
                    .iter()
                    .map(|path| serde_json::json!({ "link": path.to_string_lossy() }))
                    .collect();
                (label.to_string(), serde_json::Value::Array(links))
            })
            .collect();
        serde_json::Value::Object(object)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no step was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
