//! Per-manual attribution result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::StepImageMap;
use crate::detect::InputKind;

/// Images attributed for one manual, ready for the structured-record stage.
///
/// `main_image` feeds the record's `picture` field, `step_images` the
/// per-step `pictures` lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualImages {
    /// Path of the processed manual
    pub source: PathBuf,

    /// Detected manual kind
    pub kind: InputKind,

    /// Representative image (first accepted image of the second page)
    #[serde(with = "link_or_empty")]
    pub main_image: Option<PathBuf>,

    /// Step label → attributed images
    pub step_images: StepImageMap,
}

impl ManualImages {
    /// Result for a manual without embedded images.
    pub fn empty(source: impl Into<PathBuf>, kind: InputKind) -> Self {
        Self {
            source: source.into(),
            kind,
            main_image: None,
            step_images: StepImageMap::default(),
        }
    }

    /// The main image as a link string, `""` when there is none.
    pub fn main_image_link(&self) -> String {
        self.main_image
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Total images written for this manual.
    pub fn image_count(&self) -> usize {
        self.step_images.image_count() + usize::from(self.main_image.is_some())
    }
}

/// `Option<PathBuf>` as a plain string, empty when absent.
mod link_or_empty {
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(path) => serializer.serialize_str(&path.to_string_lossy()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
        let link = String::deserialize(deserializer)?;
        Ok((!link.is_empty()).then(|| PathBuf::from(link)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PdfFormat;

    #[test]
    fn test_empty_manual_renders_blank_picture() {
        let manual = ManualImages::empty("docs/Disassembly.csv", InputKind::Csv);
        assert_eq!(manual.main_image_link(), "");
        assert_eq!(manual.image_count(), 0);

        let json = serde_json::to_value(&manual).unwrap();
        assert_eq!(json["main_image"], "");
        assert_eq!(json["kind"]["type"], "csv");
    }

    #[test]
    fn test_main_image_roundtrip() {
        let mut manual = ManualImages::empty(
            "docs/pack.pdf",
            InputKind::Pdf(PdfFormat {
                version: "1.7".to_string(),
            }),
        );
        manual.main_image = Some(PathBuf::from("images/main.png"));

        let json = serde_json::to_string(&manual).unwrap();
        let back: ManualImages = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manual);
        assert_eq!(back.image_count(), 1);
    }
}
