//! Page layout interpretation.
//!
//! Walks a page content stream with enough of the graphics and text state to
//! place text lines and image XObjects on the page, then converts PDF user
//! space (y up) into page space (y down).

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{ImageRecord, ImageRef, Page, PageLine};

use super::backend::{decode_text_simple, get_number, page_content, resolve_dict, PageFrame};

/// Fallback leading when a content stream moves to the next line without `TL`.
const DEFAULT_LEADING: f32 = 12.0;

/// Forms nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 12;

/// Horizontal gap, in font sizes, that separates two columns on one row.
const GUTTER_FACTOR: f32 = 3.0;

/// A run of text with its baseline position in user space.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span, estimating its width from the font size.
    pub fn new(text: String, x: f32, y: f32, font_size: f32) -> Self {
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2 // Approximate descender
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8 // Approximate ascender
    }
}

/// A text line composed of spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        Self { spans }
    }

    /// Combined text of all spans.
    ///
    /// Inserts a space where the gap between two spans is wider than a fifth
    /// of the average character width and neither side already has one.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - (prev.x + prev.width);
                let char_count = span.text.chars().count();
                let avg_char_width = if char_count > 0 && span.width > 0.0 {
                    span.width / char_count as f32
                } else {
                    span.font_size * 0.5
                };

                let has_space = prev.text.ends_with(char::is_whitespace)
                    || span.text.starts_with(char::is_whitespace);
                if gap > avg_char_width * 0.2 && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }

        result
    }

    /// Baseline of the line (first span).
    pub fn baseline(&self) -> f32 {
        self.spans.first().map(|s| s.y).unwrap_or(0.0)
    }

    /// Bounding box in user space as `(left, bottom, right, top)`.
    pub fn user_bounds(&self) -> (f32, f32, f32, f32) {
        let left = self.spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
        let right = self
            .spans
            .iter()
            .map(|s| s.x + s.width)
            .fold(f32::NEG_INFINITY, f32::max);
        let bottom = self.spans.iter().map(TextSpan::bottom).fold(f32::INFINITY, f32::min);
        let top = self.spans.iter().map(TextSpan::top).fold(f32::NEG_INFINITY, f32::max);
        (left, bottom, right, top)
    }
}

/// An image XObject drawn by the page, in user space.
#[derive(Debug, Clone)]
pub struct ImagePlacement {
    /// Image object id
    pub xref: ObjectId,
    /// Resource name
    pub name: String,
    /// `(left, bottom, right, top)` of the transformed unit square
    pub bounds: (f32, f32, f32, f32),
}

/// Everything the interpreter collected from one content stream.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Text spans in stream order
    pub spans: Vec<TextSpan>,
    /// Image placements in stream order, first placement per image only
    pub images: Vec<ImagePlacement>,
}

/// Affine transform `[a b c d e f]` as used by `cm` and `Tm`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: get_number(&operands[0])?,
            b: get_number(&operands[1])?,
            c: get_number(&operands[2])?,
            d: get_number(&operands[3])?,
            e: get_number(&operands[4])?,
            f: get_number(&operands[5])?,
        })
    }

    /// `self × other`: apply `self`, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Bounds of the unit square under this transform.
    fn unit_square_bounds(&self) -> (f32, f32, f32, f32) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ];
        corners.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(l, b, r, t), &(x, y)| (l.min(x), b.min(y), r.max(x), t.max(y)),
        )
    }
}

/// Text object state between `BT` and `ET`.
#[derive(Debug, Clone, Copy)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: DEFAULT_LEADING,
            font_size: 12.0,
        }
    }
}

impl TextState {
    fn begin(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, width: f32) {
        self.matrix = Matrix::translation(width, 0.0).then(&self.matrix);
    }
}

/// Fonts of a resource scope, by resource name.
type FontMap<'a> = BTreeMap<Vec<u8>, &'a Dictionary>;

/// Resources visible to one content stream: the page's, or a form's own.
#[derive(Clone)]
struct ResourceScope<'a> {
    fonts: FontMap<'a>,
    xobjects: Option<&'a Dictionary>,
}

impl<'a> ResourceScope<'a> {
    fn new(doc: &'a LopdfDocument, fonts: FontMap<'a>, resources: Option<&'a Dictionary>) -> Self {
        let xobjects = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|obj| resolve_dict(doc, obj));
        Self { fonts, xobjects }
    }

    fn from_resources(doc: &'a LopdfDocument, resources: &'a Dictionary) -> Self {
        let fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .map(|fonts| {
                fonts
                    .iter()
                    .filter_map(|(name, obj)| resolve_dict(doc, obj).map(|font| (name.clone(), font)))
                    .collect()
            })
            .unwrap_or_default();
        Self::new(doc, fonts, Some(resources))
    }

    fn xobject(&self, name: &[u8]) -> Option<ObjectId> {
        self.xobjects?.get(name).ok()?.as_reference().ok()
    }
}

/// What a `Do` operator draws.
enum XObject<'a> {
    Image,
    Form(&'a Stream),
}

/// Bookkeeping shared by a page and every form it draws.
#[derive(Default)]
struct Walk {
    collected: PageContent,
    seen_images: HashSet<ObjectId>,
    /// Forms currently being walked, outermost first
    forms: Vec<ObjectId>,
}

/// Content stream interpreter for one document.
pub struct PageInterpreter<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> PageInterpreter<'a> {
    /// Create a new interpreter.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Build the page view for `page_id`.
    pub fn interpret_page(
        &self,
        page_id: ObjectId,
        index: usize,
        frame: PageFrame,
        resources: Option<&'a Dictionary>,
    ) -> Result<Page> {
        let content = page_content(self.doc, page_id)?;
        let collected = self.collect(&content, page_id, resources)?;

        let mut page = Page::new(index, frame.width(), frame.height());

        for line in group_spans_into_lines(collected.spans) {
            let text: String = line.text().nfkc().collect();
            if text.trim().is_empty() {
                continue;
            }
            let (left, bottom, right, top) = line.user_bounds();
            page.add_line(PageLine::new(text, frame.to_page_rect(left, bottom, right, top)));
        }

        for placement in collected.images {
            let (left, bottom, right, top) = placement.bounds;
            page.add_image(ImageRecord::new(
                ImageRef::from(placement.xref),
                placement.name,
                frame.to_page_rect(left, bottom, right, top),
                index,
            ));
        }

        log::debug!(
            "Page {}: {} lines, {} images",
            index,
            page.lines.len(),
            page.images.len()
        );

        Ok(page)
    }

    /// Walk a page content stream, collecting text spans and image placements.
    ///
    /// Form XObjects are entered with their own matrix and resources, so
    /// images and text drawn inside forms are collected too.
    pub fn collect(
        &self,
        content: &[u8],
        page_id: ObjectId,
        resources: Option<&'a Dictionary>,
    ) -> Result<PageContent> {
        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();
        let scope = ResourceScope::new(self.doc, fonts, resources);

        let mut walk = Walk::default();
        self.walk(content, &scope, Matrix::IDENTITY, &mut walk)?;
        Ok(walk.collected)
    }

    fn walk(&self, content: &[u8], scope: &ResourceScope<'a>, base: Matrix, walk: &mut Walk) -> Result<()> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut ctm = base;
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();
        let mut current_font_name: Vec<u8> = Vec::new();
        let mut in_text_block = false;

        for op in content.operations {
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text.begin();
                }
                "ET" => {
                    in_text_block = false;
                }
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let Object::Name(font_name) = &op.operands[0] {
                            current_font_name = font_name.clone();
                        }
                        text.font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number) {
                        text.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "T*" => text.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        text.next_line();
                    }
                    if !in_text_block {
                        continue;
                    }
                    let fonts = &scope.fonts;
                    let decoded = match op.operator.as_str() {
                        "TJ" => self.decode_array(fonts, &current_font_name, op.operands.first()),
                        "\"" => self.decode_string(fonts, &current_font_name, op.operands.get(2)),
                        _ => self.decode_string(fonts, &current_font_name, op.operands.first()),
                    };
                    if decoded.trim().is_empty() {
                        continue;
                    }

                    let rendering = text.matrix.then(&ctm);
                    let (x, y) = rendering.apply(0.0, 0.0);
                    let effective_size = text.font_size * rendering.vertical_scale();
                    let span = TextSpan::new(decoded, x, y, effective_size);
                    text.advance(span.text.chars().count() as f32 * text.font_size * 0.5);
                    walk.collected.spans.push(span);
                }
                "Do" => {
                    let Some(Object::Name(name)) = op.operands.first() else {
                        continue;
                    };
                    let Some(xref) = scope.xobject(name) else {
                        continue;
                    };
                    match self.classify_xobject(xref) {
                        Some(XObject::Image) => {
                            if walk.seen_images.insert(xref) {
                                walk.collected.images.push(ImagePlacement {
                                    xref,
                                    name: String::from_utf8_lossy(name).into_owned(),
                                    bounds: ctm.unit_square_bounds(),
                                });
                            }
                        }
                        Some(XObject::Form(form)) => self.enter_form(xref, form, scope, ctm, walk),
                        None => {
                            log::trace!("Skipping XObject {}", String::from_utf8_lossy(name));
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Walk a form XObject drawn under `ctm`.
    ///
    /// A form without `/Resources` uses those of the stream that draws it.
    /// Malformed forms are skipped with a warning.
    fn enter_form(
        &self,
        xref: ObjectId,
        form: &'a Stream,
        parent: &ResourceScope<'a>,
        ctm: Matrix,
        walk: &mut Walk,
    ) {
        if walk.forms.contains(&xref) {
            log::warn!("Form XObject {:?} draws itself, skipping", xref);
            return;
        }
        if walk.forms.len() >= MAX_FORM_DEPTH {
            log::warn!("Form XObjects nested deeper than {}, skipping {:?}", MAX_FORM_DEPTH, xref);
            return;
        }

        let matrix = form
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|operands| Matrix::from_operands(operands))
            .unwrap_or(Matrix::IDENTITY);
        let scope = match form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| resolve_dict(self.doc, obj))
        {
            Some(resources) => ResourceScope::from_resources(self.doc, resources),
            None => parent.clone(),
        };
        let content = form.decompressed_content().unwrap_or_else(|_| form.content.clone());

        walk.forms.push(xref);
        if let Err(e) = self.walk(&content, &scope, matrix.then(&ctm), walk) {
            log::warn!("Skipping unreadable form XObject {:?}: {}", xref, e);
        }
        walk.forms.pop();
    }

    fn classify_xobject(&self, xref: ObjectId) -> Option<XObject<'a>> {
        let Ok(Object::Stream(stream)) = self.doc.get_object(xref) else {
            return None;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name).ok()? {
            b"Image" => Some(XObject::Image),
            b"Form" => Some(XObject::Form(stream)),
            _ => None,
        }
    }

    fn decode_bytes(&self, fonts: &FontMap<'_>, font_name: &[u8], bytes: &[u8]) -> String {
        let encoding = fonts
            .get(font_name)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        match encoding {
            Some(ref enc) => {
                LopdfDocument::decode_text(enc, bytes).unwrap_or_else(|_| decode_text_simple(bytes))
            }
            None => decode_text_simple(bytes),
        }
    }

    fn decode_string(&self, fonts: &FontMap<'_>, font_name: &[u8], operand: Option<&Object>) -> String {
        match operand {
            Some(Object::String(bytes, _)) => self.decode_bytes(fonts, font_name, bytes),
            _ => String::new(),
        }
    }

    /// Decode a `TJ` array; large negative adjustments become word spaces.
    fn decode_array(&self, fonts: &FontMap<'_>, font_name: &[u8], operand: Option<&Object>) -> String {
        // 1/1000 text space units; roughly a word space for most fonts
        const SPACE_THRESHOLD: f32 = 200.0;

        let Some(Object::Array(items)) = operand else {
            return String::new();
        };

        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    combined.push_str(&self.decode_bytes(fonts, font_name, bytes));
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -get_number(item).unwrap_or(0.0);
                    if adjustment > SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(char::is_whitespace)
                    {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }
        combined
    }
}

/// Group spans into lines, top to bottom.
///
/// Spans whose baselines lie within 30% of the font size of the current
/// line's baseline share a row. A row is then split wherever the horizontal
/// gap between neighbouring spans is wider than a column gutter, so text in
/// separate columns (a figure caption beside a step marker, say) becomes
/// separate lines, ordered left to right.
pub fn group_spans_into_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    // Sort spans by Y (descending, since PDF Y is bottom-up) then X
    let mut spans = spans;
    spans.sort_by(|a, b| {
        let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_line_spans: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.font_size * 0.3;

        match current_y {
            Some(y) if (span.y - y).abs() <= y_tolerance => current_line_spans.push(span),
            _ => {
                if !current_line_spans.is_empty() {
                    lines.extend(split_at_gutters(std::mem::take(&mut current_line_spans)));
                }
                current_y = Some(span.y);
                current_line_spans.push(span);
            }
        }
    }

    if !current_line_spans.is_empty() {
        lines.extend(split_at_gutters(current_line_spans));
    }

    lines
}

/// Split one row of spans into lines at column gutters.
fn split_at_gutters(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let row = TextLine::from_spans(spans);

    let mut lines = Vec::new();
    let mut segment: Vec<TextSpan> = Vec::new();
    let mut right_edge = f32::NEG_INFINITY;

    for span in row.spans {
        let gutter = span.font_size.max(1.0) * GUTTER_FACTOR;
        if !segment.is_empty() && span.x - right_edge > gutter {
            log::trace!("Splitting row at x={:.1} (gap {:.1})", span.x, span.x - right_edge);
            lines.push(TextLine::from_spans(std::mem::take(&mut segment)));
            right_edge = f32::NEG_INFINITY;
        }
        right_edge = right_edge.max(span.x + span.width);
        segment.push(span);
    }
    if !segment.is_empty() {
        lines.push(TextLine::from_spans(segment));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn numbers(values: &[f32]) -> Vec<Object> {
        values.iter().map(|&v| Object::Real(v)).collect()
    }

    #[test]
    fn test_matrix_then_applies_left_first() {
        let scale = Matrix {
            a: 200.0,
            d: 150.0,
            ..Matrix::IDENTITY
        };
        let placed = scale.then(&Matrix::translation(100.0, 300.0));
        assert_eq!(placed.apply(0.0, 0.0), (100.0, 300.0));
        assert_eq!(placed.apply(1.0, 1.0), (300.0, 450.0));
        assert_eq!(placed.unit_square_bounds(), (100.0, 300.0, 300.0, 450.0));
    }

    #[test]
    fn test_text_state_line_moves() {
        let mut state = TextState::default();
        state.begin();
        state.move_line(72.0, 700.0);
        state.leading = 14.0;
        state.next_line();
        assert_eq!(state.matrix.apply(0.0, 0.0), (72.0, 686.0));
    }

    #[test]
    fn test_group_spans_into_lines() {
        let spans = vec![
            TextSpan::new("Remove".to_string(), 130.0, 500.0, 12.0),
            TextSpan::new("Step 1:".to_string(), 72.0, 501.0, 12.0),
            TextSpan::new("Title".to_string(), 72.0, 700.0, 18.0),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Title");
        assert_eq!(lines[1].text(), "Step 1: Remove");
    }

    #[test]
    fn test_line_text_no_double_space() {
        let line = TextLine::from_spans(vec![
            TextSpan::new("Step ".to_string(), 72.0, 500.0, 12.0),
            TextSpan::new("2:".to_string(), 120.0, 500.0, 12.0),
        ]);
        assert_eq!(line.text(), "Step 2:");
    }

    #[test]
    fn test_row_split_at_gutter() {
        let spans = vec![
            TextSpan::new("Step 2: Lift the pack".to_string(), 320.0, 400.0, 12.0),
            TextSpan::new("Fig. 3".to_string(), 40.0, 400.0, 12.0),
            TextSpan::new("Step 1: Open the case".to_string(), 72.0, 600.0, 12.0),
        ];
        let texts: Vec<_> = group_spans_into_lines(spans).iter().map(TextLine::text).collect();
        assert_eq!(texts, ["Step 1: Open the case", "Fig. 3", "Step 2: Lift the pack"]);
    }

    #[test]
    fn test_word_gaps_stay_on_one_line() {
        // a few character widths apart, well under a gutter
        let spans = vec![
            TextSpan::new("Step 4:".to_string(), 72.0, 400.0, 12.0),
            TextSpan::new("Unclip".to_string(), 72.0 + 42.0 + 10.0, 400.0, 12.0),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Step 4: Unclip");
    }

    #[test]
    fn test_form_xobject_is_entered_once() {
        let mut doc = LopdfDocument::with_version("1.5");
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1i64,
                "Height" => 1i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8i64,
            },
            vec![0],
        ));
        // the form draws the image and then itself
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => numbers(&[0.0, 0.0, 100.0, 100.0]),
                "Matrix" => numbers(&[1.0, 0.0, 0.0, 1.0, 10.0, 20.0]),
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                        "Fm0" => form_id,
                    },
                },
            },
            b"q 50 0 0 40 0 0 cm /Im0 Do Q /Fm0 Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));
        let page_resources = dictionary! {
            "XObject" => dictionary! { "Fm0" => form_id },
        };

        let interpreter = PageInterpreter::new(&doc);
        let collected = interpreter
            .collect(b"q 2 0 0 2 0 0 cm /Fm0 Do Q", (99, 0), Some(&page_resources))
            .unwrap();
        assert_eq!(collected.images.len(), 1);
        assert_eq!(collected.images[0].name, "Im0");
        // image scale, then form matrix, then page CTM
        assert_eq!(collected.images[0].bounds, (20.0, 40.0, 120.0, 120.0));
    }

    #[test]
    fn test_form_text_uses_form_fonts() {
        let mut doc = LopdfDocument::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => numbers(&[0.0, 0.0, 600.0, 800.0]),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F9" => font_id },
                },
            },
            b"BT /F9 12 Tf 72 500 Td (Step 4: Lift) Tj ET".to_vec(),
        ));
        let page_resources = dictionary! {
            "XObject" => dictionary! { "Fm1" => form_id },
        };

        let collected = PageInterpreter::new(&doc)
            .collect(b"/Fm1 Do", (99, 0), Some(&page_resources))
            .unwrap();
        assert_eq!(collected.spans.len(), 1);
        assert_eq!(collected.spans[0].text, "Step 4: Lift");
        assert_eq!((collected.spans[0].x, collected.spans[0].y), (72.0, 500.0));
    }
}
