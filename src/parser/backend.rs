//! Document backend abstraction layer.
//!
//! The attribution pipeline reads pages and decodes images through the
//! [`DocumentBackend`] trait, isolating the concrete PDF library (lopdf) from
//! step location and region extraction.

use image::DynamicImage;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{ImageRecord, Page, Rect};

use super::layout::PageInterpreter;
use super::raster;

/// Guard against cyclic `Parent` chains in malformed page trees.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// US Letter, used when no page in the tree declares a MediaBox.
const LETTER_MEDIA_BOX: MediaBox = MediaBox {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// Abstract interface for paginated document access.
///
/// Page indices are zero-based. Coordinates of everything a backend returns
/// are in page space, y increasing downward.
pub trait DocumentBackend {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Height of a page.
    fn page_height(&self, index: usize) -> Result<f32>;

    /// Text lines and image placements of a page.
    fn load_page(&self, index: usize) -> Result<Page>;

    /// Decode the pixels of an image placed on a page.
    fn decode_image(&self, image: &ImageRecord) -> Result<DynamicImage>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    // Try UTF-8
    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Page rectangle in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl MediaBox {
    fn from_object(doc: &LopdfDocument, obj: &Object) -> Option<Self> {
        let array = match obj {
            Object::Array(array) => array,
            Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
            _ => return None,
        };
        if array.len() < 4 {
            return None;
        }
        let llx = get_number(&array[0])?;
        let lly = get_number(&array[1])?;
        let urx = get_number(&array[2])?;
        let ury = get_number(&array[3])?;
        Some(Self {
            llx: llx.min(urx),
            lly: lly.min(ury),
            urx: llx.max(urx),
            ury: lly.max(ury),
        })
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Overlap of two boxes, `None` when it has no area.
    pub fn intersect(&self, other: &MediaBox) -> Option<MediaBox> {
        let clipped = MediaBox {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
    }
}

/// The visible page: the CropBox clipped to the MediaBox, turned by `/Rotate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Visible region in user space
    pub view: MediaBox,
    /// Clockwise display rotation: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageFrame {
    /// An unrotated frame showing `view`.
    pub fn new(view: MediaBox) -> Self {
        Self { view, rotation: 0 }
    }

    /// Set the display rotation in degrees; anything but a multiple of 90 is ignored.
    pub fn with_rotation(mut self, degrees: i64) -> Self {
        let degrees = degrees.rem_euclid(360);
        self.rotation = if degrees % 90 == 0 { degrees as u16 } else { 0 };
        self
    }

    fn is_sideways(&self) -> bool {
        self.rotation == 90 || self.rotation == 270
    }

    /// Displayed page width in points.
    pub fn width(&self) -> f32 {
        if self.is_sideways() {
            self.view.height()
        } else {
            self.view.width()
        }
    }

    /// Displayed page height in points.
    pub fn height(&self) -> f32 {
        if self.is_sideways() {
            self.view.width()
        } else {
            self.view.height()
        }
    }

    /// Convert user-space bounds `(left, bottom, right, top)` to a page rect.
    pub fn to_page_rect(&self, left: f32, bottom: f32, right: f32, top: f32) -> Rect {
        let (w, h) = (self.view.width(), self.view.height());
        let place = |x: f32, y: f32| {
            // unrotated page space, y down
            let (ux, uy) = (x - self.view.llx, self.view.ury - y);
            match self.rotation {
                90 => (h - uy, ux),
                180 => (w - ux, h - uy),
                270 => (uy, w - ux),
                _ => (ux, uy),
            }
        };
        let (x0, y0) = place(left, top);
        let (x1, y1) = place(right, bottom);
        Rect::new(x0, y0, x1, y1)
    }
}

/// Concrete [`DocumentBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    page_ids: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path).map_err(map_load_error)?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(map_load_error)?;
        Self::from_document(doc)
    }

    /// Load from a reader.
    pub fn load_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(Error::EmptyDocument);
        }

        log::debug!("Loaded PDF {} with {} pages", doc.version, page_ids.len());
        Ok(Self { doc, page_ids })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index, self.page_ids.len()))
    }

    fn page_box(&self, page_id: ObjectId, key: &[u8]) -> Option<MediaBox> {
        inherited_attribute(&self.doc, page_id, key).and_then(|obj| MediaBox::from_object(&self.doc, obj))
    }

    fn frame(&self, page_id: ObjectId) -> PageFrame {
        let media_box = self.page_box(page_id, b"MediaBox").unwrap_or(LETTER_MEDIA_BOX);
        let view = match self.page_box(page_id, b"CropBox") {
            Some(crop_box) => crop_box.intersect(&media_box).unwrap_or_else(|| {
                log::warn!("CropBox of page {:?} lies outside its MediaBox, ignoring it", page_id);
                media_box
            }),
            None => media_box,
        };
        let rotation = inherited_attribute(&self.doc, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        PageFrame::new(view).with_rotation(rotation)
    }
}

impl DocumentBackend for LopdfBackend {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_height(&self, index: usize) -> Result<f32> {
        let page_id = self.page_id(index)?;
        Ok(self.frame(page_id).height())
    }

    fn load_page(&self, index: usize) -> Result<Page> {
        let page_id = self.page_id(index)?;
        let frame = self.frame(page_id);
        let resources = inherited_attribute(&self.doc, page_id, b"Resources")
            .and_then(|obj| resolve_dict(&self.doc, obj));

        PageInterpreter::new(&self.doc).interpret_page(page_id, index, frame, resources)
    }

    fn decode_image(&self, image: &ImageRecord) -> Result<DynamicImage> {
        let id: ObjectId = image.xref.into();
        match self.doc.get_object(id)? {
            Object::Stream(stream) => raster::decode_image_stream(&self.doc, stream),
            _ => Err(Error::ImageExtract(format!("{} is not an image stream", image.xref))),
        }
    }
}

fn map_load_error(e: lopdf::Error) -> Error {
    match e {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        _ => Error::from(e),
    }
}

/// Look up a page attribute, following the `Parent` chain for inheritable keys.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page_id;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Resolve a direct or referenced dictionary.
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Raw (decompressed) content stream bytes of a page.
///
/// A page without `Contents` yields an empty stream.
pub(crate) fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let contents = match contents {
        Object::Reference(r) => doc.get_object(*r)?,
        other => other,
    };

    match contents {
        Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for obj in arr {
                if let Object::Reference(r) = obj {
                    if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

/// Helper: extract a number from a PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
