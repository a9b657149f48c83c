//! Step boundary location.
//!
//! Scans page text for `Step N:` markers and a terminating `Section N:`
//! marker, and turns the marker positions into closed step boundaries.

use regex::Regex;

use crate::error::Result;
use crate::model::{OpenStep, StepBoundaries, StepLabel, Upsert};
use crate::parser::{DocumentBackend, ErrorMode, ExtractOptions};

/// Marker opening a step; group 1 holds the step number.
pub const STEP_PATTERN: &str = r"^Step\s+(\d+):";

/// Marker ending the step section of a manual.
pub const TERMINAL_PATTERN: &str = r"^Section\s+\d+:";

/// Finds step boundaries in a document.
#[derive(Debug, Clone)]
pub struct StepLocator {
    step_pattern: Regex,
    terminal_pattern: Regex,
}

impl StepLocator {
    /// Create a locator with the standard markers.
    pub fn new() -> Result<Self> {
        Self::with_patterns(STEP_PATTERN, TERMINAL_PATTERN)
    }

    /// Create a locator with custom markers.
    ///
    /// The step pattern must capture the step number in group 1.
    pub fn with_patterns(step: &str, terminal: &str) -> Result<Self> {
        Ok(Self {
            step_pattern: Regex::new(step)?,
            terminal_pattern: Regex::new(terminal)?,
        })
    }

    /// The step label of a marker line, if it is one.
    pub fn match_step(&self, line: &str) -> Option<StepLabel> {
        let caps = self.step_pattern.captures(line.trim())?;
        let digits = caps.get(1)?.as_str();
        let label = StepLabel::from_digits(digits);
        if label.is_none() {
            log::warn!("Ignoring step marker with unusable number: {:?}", line.trim());
        }
        label
    }

    /// Whether a line ends the step section.
    pub fn is_terminal(&self, line: &str) -> bool {
        self.terminal_pattern.is_match(line.trim())
    }

    /// Locate every step of the document.
    ///
    /// A step runs from the top of its marker line to the top of the next
    /// step or terminal marker; the last step of a manual without a terminal
    /// marker runs to the bottom of the last page.
    pub fn locate<B: DocumentBackend + ?Sized>(
        &self,
        backend: &B,
        options: &ExtractOptions,
    ) -> Result<StepBoundaries> {
        let mut boundaries = StepBoundaries::new();
        let mut open: Option<OpenStep> = None;
        let mut last_number: Option<u32> = None;
        let page_count = backend.page_count();

        'pages: for index in 0..page_count {
            let page = match backend.load_page(index) {
                Ok(page) => page,
                Err(e) if options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Page {} could not be read, treating it as blank: {}", index, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            for line in page.lines() {
                let text = line.text.trim();
                let y = line.bbox.y0;

                if let Some(label) = self.match_step(text) {
                    if let Some(step) = open.take() {
                        self.close(step, index, y, &mut boundaries, options)?;
                    }

                    if let Some(last) = last_number {
                        if label.number() <= last {
                            log::warn!("{} follows step {} out of order", label, last);
                        }
                    }
                    last_number = Some(label.number());

                    log::debug!("{} starts on page {} at y={}", label, index, y);
                    open = Some(OpenStep::new(label, index, y));
                } else if self.is_terminal(text) {
                    if let Some(step) = open.take() {
                        self.close(step, index, y, &mut boundaries, options)?;
                    }
                    log::debug!("Terminal marker {:?} on page {} at y={}", text, index, y);
                    break 'pages;
                }
            }
        }

        if let Some(step) = open.take() {
            let last_page = page_count.saturating_sub(1);
            let height = backend.page_height(last_page)?;
            self.close(step, last_page, height, &mut boundaries, options)?;
        }

        log::debug!("Located {} steps", boundaries.len());
        Ok(boundaries)
    }

    fn close(
        &self,
        step: OpenStep,
        end_page: usize,
        end_y: f32,
        boundaries: &mut StepBoundaries,
        options: &ExtractOptions,
    ) -> Result<()> {
        let boundary = match step.clone().close(end_page, end_y) {
            Ok(boundary) => boundary,
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("{}; clamping to an empty step", e);
                step.close_clamped(end_page, end_y)
            }
            Err(e) => return Err(e),
        };

        let label = boundary.label().clone();
        if boundaries.upsert(boundary, options.duplicate_policy)? == Upsert::Replaced {
            log::warn!("Duplicate marker for {}, keeping the later occurrence", label);
        }
        Ok(())
    }
}
