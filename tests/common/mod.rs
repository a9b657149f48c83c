//! Shared fixtures: small disassembly manuals built with lopdf.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// Height of every fixture page, in points.
pub const PAGE_HEIGHT: f32 = 800.0;

/// An image drawn on a fixture page.
///
/// The pixel width identifies the image once it has been saved as PNG.
pub struct FixtureImage {
    pub name: &'static str,
    pub pixel_width: u32,
    /// `(x, y, width, height)` of the placement in user space (y up)
    pub placement: (f32, f32, f32, f32),
    pub jpeg: bool,
    /// Draw the image from inside a form XObject
    pub in_form: bool,
}

impl FixtureImage {
    /// Place an image so that it covers `[top, bottom]` in page space (y down).
    pub fn at(name: &'static str, pixel_width: u32, top: f32, bottom: f32) -> Self {
        Self {
            name,
            pixel_width,
            placement: (50.0, PAGE_HEIGHT - bottom, 100.0, bottom - top),
            jpeg: false,
            in_form: false,
        }
    }

    pub fn jpeg(mut self) -> Self {
        self.jpeg = true;
        self
    }

    pub fn in_form(mut self) -> Self {
        self.in_form = true;
        self
    }
}

/// One fixture page: text lines by `(x, baseline)` plus images.
#[derive(Default)]
pub struct FixturePage {
    pub lines: Vec<(f32, f32, String)>,
    pub images: Vec<FixtureImage>,
    /// `CropBox` in user space, `[llx, lly, urx, ury]`
    pub crop_box: Option<[i64; 4]>,
}

impl FixturePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a 12pt line whose top lands at `top` in page space.
    pub fn line(self, text: &str, top: f32) -> Self {
        self.line_at(text, 72.0, top)
    }

    /// Add a 12pt line starting at `x`.
    pub fn line_at(mut self, text: &str, x: f32, top: f32) -> Self {
        // top of a 12pt line sits 0.8 * 12 above its baseline
        let baseline = PAGE_HEIGHT - top - 9.6;
        self.lines.push((x, baseline, text.to_string()));
        self
    }

    pub fn crop_box(mut self, crop_box: [i64; 4]) -> Self {
        self.crop_box = Some(crop_box);
        self
    }

    pub fn image(mut self, image: FixtureImage) -> Self {
        self.images.push(image);
        self
    }
}

fn pixels(width: u32) -> RgbImage {
    RgbImage::from_fn(width, 2, |x, y| image::Rgb([(x * 40) as u8, (y * 90) as u8, 200]))
}

fn image_stream(image: &FixtureImage) -> Stream {
    let rgb = pixels(image.pixel_width);
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.pixel_width as i64,
        "Height" => 2i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8i64,
    };

    if image.jpeg {
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut encoded, ImageFormat::Jpeg)
            .expect("failed to encode fixture JPEG");
        dict.set("Filter", "DCTDecode");
        Stream::new(dict, encoded.into_inner())
    } else {
        Stream::new(dict, rgb.into_raw())
    }
}

/// Build a PDF manual from fixture pages.
pub fn build_manual(pages: Vec<FixturePage>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in &pages {
        let mut xobjects = Dictionary::new();
        let mut ops = String::new();

        for image in &page.images {
            let image_id = doc.add_object(Object::Stream(image_stream(image)));
            let (x, y, w, h) = image.placement;
            if image.in_form {
                // the form carries the translation, its content the scale
                let form_name = format!("Fm{}", image.name);
                let form = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![Object::Real(0.0), Object::Real(0.0), Object::Real(w), Object::Real(h)],
                        "Matrix" => [1.0, 0.0, 0.0, 1.0, x, y].iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
                        "Resources" => Object::Dictionary(dictionary! {
                            "XObject" => Object::Dictionary(dictionary! {
                                image.name => image_id,
                            }),
                        }),
                    },
                    format!("q {} 0 0 {} 0 0 cm /{} Do Q", w, h, image.name).into_bytes(),
                );
                let form_id = doc.add_object(Object::Stream(form));
                xobjects.set(form_name.clone(), form_id);
                ops.push_str(&format!("/{} Do\n", form_name));
            } else {
                xobjects.set(image.name, image_id);
                ops.push_str(&format!("q {} 0 0 {} {} {} cm /{} Do Q\n", w, h, x, y, image.name));
            }
        }

        for (x, baseline, text) in &page.lines {
            ops.push_str(&format!("BT /F1 12 Tf {} {} Td ({}) Tj ET\n", x, baseline, text));
        }

        let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), ops.into_bytes())));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 600.into(), (PAGE_HEIGHT as i64).into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! {
                    "F1" => font_id,
                }),
                "XObject" => Object::Dictionary(xobjects),
            }),
        };
        if let Some(crop_box) = page.crop_box {
            page_dict.set("CropBox", crop_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>());
        }
        let page_id = doc.add_object(page_dict);
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// The three-page manual used across the integration tests.
///
/// With the default 0.2 margin ratio (bands above 160 and below 640):
/// - `Step 1` runs from page 0 y=200 to page 1 y=500 and owns images 1 and 3
/// - image 2 sits in the header band of page 1
/// - `Step 2` runs from page 1 y=500 to page 2 y=400 and owns images 4 and 5
/// - image 6 lies below the `Section 1:` marker and belongs to no step
pub fn three_page_manual() -> Vec<FixturePage> {
    vec![
        FixturePage::new()
            .line("Battery Pack Teardown", 60.0)
            .line("Step 1: Remove the top cover", 200.0)
            .image(FixtureImage::at("ImA", 1, 300.0, 400.0)),
        FixturePage::new()
            .image(FixtureImage::at("ImB", 2, 10.0, 20.0))
            .image(FixtureImage::at("ImC", 3, 250.0, 350.0))
            .line("Step 2: Disconnect the BMS harness", 500.0)
            .image(FixtureImage::at("ImD", 4, 550.0, 600.0)),
        FixturePage::new()
            .line("Section 1: Reassembly", 400.0)
            .image(FixtureImage::at("ImE", 5, 200.0, 300.0).jpeg())
            .image(FixtureImage::at("ImF", 6, 450.0, 500.0)),
    ]
}

/// Pixel widths of saved images, identifying which fixture image each is.
pub fn widths(paths: &[std::path::PathBuf]) -> Vec<u32> {
    paths
        .iter()
        .map(|p| image::open(p).expect("saved image should decode").width())
        .collect()
}
