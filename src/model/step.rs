//! Step labels and the vertical extent of each step.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A step label as printed in the manual, e.g. `"Step 3"`.
///
/// Labels compare and hash by their text, so maps keyed by label can be
/// queried with a plain `&str`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StepLabel {
    text: String,
    number: u32,
}

impl StepLabel {
    /// Build a label from the digits following `Step` in a marker.
    ///
    /// The digits are kept verbatim in the label text (`"Step 03"`), while
    /// [`StepLabel::number`] holds their value.
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse().ok()?;
        Some(Self {
            text: format!("Step {}", digits),
            number,
        })
    }

    /// Label for a step number.
    pub fn new(number: u32) -> Self {
        Self {
            text: format!("Step {}", number),
            number,
        }
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The step number, for matching structured step records downstream.
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl PartialEq for StepLabel {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for StepLabel {}

impl Hash for StepLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Borrow<str> for StepLabel {
    fn borrow(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for StepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<StepLabel> for String {
    fn from(label: StepLabel) -> Self {
        label.text
    }
}

impl TryFrom<String> for StepLabel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value
            .strip_prefix("Step ")
            .and_then(StepLabel::from_digits)
            .ok_or_else(|| Error::InvalidBoundary(format!("not a step label: {:?}", value)))
    }
}

/// A step whose start has been seen but whose end has not.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStep {
    /// Step label
    pub label: StepLabel,
    /// Page where the marker was found
    pub start_page: usize,
    /// Top of the marker line
    pub start_y: f32,
}

impl OpenStep {
    /// Open a step at a marker position.
    pub fn new(label: StepLabel, start_page: usize, start_y: f32) -> Self {
        Self {
            label,
            start_page,
            start_y,
        }
    }

    /// Close the step, checking that the end does not precede the start.
    pub fn close(self, end_page: usize, end_y: f32) -> Result<StepBoundary> {
        StepBoundary::new(self.label, self.start_page, self.start_y, end_page, end_y)
    }

    /// Close the step, moving an end that precedes the start onto the start.
    pub fn close_clamped(self, end_page: usize, end_y: f32) -> StepBoundary {
        let (end_page, end_y) = if end_page < self.start_page
            || (end_page == self.start_page && end_y < self.start_y)
        {
            (self.start_page, self.start_y)
        } else {
            (end_page, end_y)
        };
        StepBoundary {
            label: self.label,
            start_page: self.start_page,
            start_y: self.start_y,
            end_page,
            end_y,
        }
    }
}

/// The extent of one step across the document.
///
/// Always closed: both ends are set, and the end never precedes the start.
/// Deserialization goes through [`StepBoundary::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundaryFields")]
pub struct StepBoundary {
    label: StepLabel,
    start_page: usize,
    start_y: f32,
    end_page: usize,
    end_y: f32,
}

#[derive(Deserialize)]
struct BoundaryFields {
    label: StepLabel,
    start_page: usize,
    start_y: f32,
    end_page: usize,
    end_y: f32,
}

impl TryFrom<BoundaryFields> for StepBoundary {
    type Error = Error;

    fn try_from(fields: BoundaryFields) -> Result<Self> {
        StepBoundary::new(
            fields.label,
            fields.start_page,
            fields.start_y,
            fields.end_page,
            fields.end_y,
        )
    }
}

impl StepBoundary {
    /// Create a boundary, rejecting an end that precedes the start.
    pub fn new(
        label: StepLabel,
        start_page: usize,
        start_y: f32,
        end_page: usize,
        end_y: f32,
    ) -> Result<Self> {
        if !start_y.is_finite() || !end_y.is_finite() {
            return Err(Error::InvalidBoundary(format!(
                "{} has a non-finite position ({}, {})",
                label, start_y, end_y
            )));
        }
        if end_page < start_page {
            return Err(Error::InvalidBoundary(format!(
                "{} ends on page {} before it starts on page {}",
                label, end_page, start_page
            )));
        }
        if end_page == start_page && end_y < start_y {
            return Err(Error::InvalidBoundary(format!(
                "{} ends at y={} above its start y={} on page {}",
                label, end_y, start_y, start_page
            )));
        }
        Ok(Self {
            label,
            start_page,
            start_y,
            end_page,
            end_y,
        })
    }

    /// Step label.
    pub fn label(&self) -> &StepLabel {
        &self.label
    }

    /// First page of the step.
    pub fn start_page(&self) -> usize {
        self.start_page
    }

    /// Top of the step on its first page.
    pub fn start_y(&self) -> f32 {
        self.start_y
    }

    /// Last page of the step.
    pub fn end_page(&self) -> usize {
        self.end_page
    }

    /// Bottom of the step on its last page.
    pub fn end_y(&self) -> f32 {
        self.end_y
    }

    /// Whether the step starts and ends on the same page.
    pub fn is_single_page(&self) -> bool {
        self.start_page == self.end_page
    }

    /// Number of pages the step touches.
    pub fn page_span(&self) -> usize {
        self.end_page - self.start_page + 1
    }
}

/// What to do when a step label is seen a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateStepPolicy {
    /// The later occurrence replaces the earlier boundary (warned)
    #[default]
    Replace,
    /// Fail with [`Error::DuplicateStep`]
    Reject,
}

/// Outcome of [`StepBoundaries::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The label was new
    Inserted,
    /// An earlier boundary with the same label was replaced
    Replaced,
}

/// Step boundaries in first-seen order.
///
/// Each key is the label of the boundary it maps to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "IndexMap<StepLabel, StepBoundary>",
    try_from = "IndexMap<StepLabel, StepBoundary>"
)]
pub struct StepBoundaries {
    entries: IndexMap<StepLabel, StepBoundary>,
}

impl From<StepBoundaries> for IndexMap<StepLabel, StepBoundary> {
    fn from(boundaries: StepBoundaries) -> Self {
        boundaries.entries
    }
}

impl TryFrom<IndexMap<StepLabel, StepBoundary>> for StepBoundaries {
    type Error = Error;

    fn try_from(entries: IndexMap<StepLabel, StepBoundary>) -> Result<Self> {
        if let Some((key, boundary)) = entries.iter().find(|(key, b)| **key != b.label) {
            return Err(Error::InvalidBoundary(format!(
                "boundary of {} stored under {}",
                boundary.label, key
            )));
        }
        Ok(Self { entries })
    }
}

impl StepBoundaries {
    /// Create an empty set of boundaries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a boundary, applying `policy` when its label is already present.
    ///
    /// A replaced boundary keeps the position its label was first seen at.
    pub fn upsert(&mut self, boundary: StepBoundary, policy: DuplicateStepPolicy) -> Result<Upsert> {
        if self.entries.contains_key(&boundary.label) {
            return match policy {
                DuplicateStepPolicy::Reject => Err(Error::DuplicateStep(boundary.label.to_string())),
                DuplicateStepPolicy::Replace => {
                    self.entries.insert(boundary.label.clone(), boundary);
                    Ok(Upsert::Replaced)
                }
            };
        }
        self.entries.insert(boundary.label.clone(), boundary);
        Ok(Upsert::Inserted)
    }

    /// Look up a boundary by label text.
    pub fn get(&self, label: &str) -> Option<&StepBoundary> {
        self.entries.get(label)
    }

    /// Whether a label is present.
    pub fn contains(&self, label: &StepLabel) -> bool {
        self.entries.contains_key(label)
    }

    /// Boundaries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &StepBoundary> {
        self.entries.values()
    }

    /// Labels in first-seen order.
    pub fn labels(&self) -> impl Iterator<Item = &StepLabel> {
        self.entries.keys()
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

impl<'a> IntoIterator for &'a StepBoundaries {
    type Item = &'a StepBoundary;
    type IntoIter = indexmap::map::Values<'a, StepLabel, StepBoundary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
