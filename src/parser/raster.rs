//! Image XObject decoding.
//!
//! Handles the encodings battery-pack manuals embed: JPEG (`DCTDecode`) and
//! Flate or unfiltered samples at 1, 2, 4, 8 or 16 bits per component, in a
//! gray, RGB, CMYK or indexed (palette) color space. A soft mask (`/SMask`)
//! becomes the alpha channel. Everything else is reported as an extraction
//! error.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};

use super::backend::get_number;

/// Decode the pixels of an image XObject stream, applying its soft mask.
pub fn decode_image_stream(doc: &LopdfDocument, stream: &Stream) -> Result<DynamicImage> {
    let image = decode_pixels(doc, stream)?;
    Ok(apply_soft_mask(doc, stream, image))
}

fn decode_pixels(doc: &LopdfDocument, stream: &Stream) -> Result<DynamicImage> {
    let filters = stream_filters(doc, stream);

    match filters.as_slice() {
        [dct] if dct == b"DCTDecode" => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| Error::ImageExtract(format!("JPEG decode failed: {}", e)))
        }
        [] => decode_samples(doc, &stream.dict, &stream.content),
        filters if filters.iter().all(|f| f == b"FlateDecode") => {
            let data = stream
                .decompressed_content()
                .map_err(|e| Error::ImageExtract(format!("Flate decode failed: {}", e)))?;
            decode_samples(doc, &stream.dict, &data)
        }
        filters => Err(Error::ImageExtract(format!(
            "Unsupported image filter chain: {}",
            filters
                .iter()
                .map(|f| String::from_utf8_lossy(f).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Filter names of a stream, in application order.
fn stream_filters(doc: &LopdfDocument, stream: &Stream) -> Vec<Vec<u8>> {
    let filter = stream.dict.get(b"Filter").ok().and_then(|obj| resolve(doc, obj));

    match filter {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Color spaces an image can be rendered from.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of `hival + 1` entries in a base space, 8 bits per component
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        palette: Vec<u8>,
    },
}

impl ColorSpace {
    fn from_components(n: i64) -> Option<Self> {
        match n {
            1 => Some(ColorSpace::Gray),
            3 => Some(ColorSpace::Rgb),
            4 => Some(ColorSpace::Cmyk),
            _ => None,
        }
    }

    /// Components per sample in the image data.
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn parse(doc: &LopdfDocument, obj: &Object) -> Option<Self> {
        match resolve(doc, obj)? {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
                b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
                _ => None,
            },
            Object::Array(items) => match items.first()?.as_name().ok()? {
                b"ICCBased" => {
                    let profile = resolve(doc, items.get(1)?)?.as_stream().ok()?;
                    ColorSpace::from_components(profile.dict.get(b"N").ok()?.as_i64().ok()?)
                }
                b"CalGray" => Some(ColorSpace::Gray),
                b"CalRGB" => Some(ColorSpace::Rgb),
                b"Indexed" | b"I" => {
                    let base = ColorSpace::parse(doc, items.get(1)?)?;
                    if matches!(base, ColorSpace::Indexed { .. }) {
                        return None;
                    }
                    let hival = get_number(resolve(doc, items.get(2)?)?)?.clamp(0.0, 255.0) as u8;
                    let palette = match resolve(doc, items.get(3)?)? {
                        Object::String(bytes, _) => bytes.clone(),
                        Object::Stream(table) => table
                            .decompressed_content()
                            .unwrap_or_else(|_| table.content.clone()),
                        _ => return None,
                    };
                    Some(ColorSpace::Indexed {
                        base: Box::new(base),
                        hival,
                        palette,
                    })
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Turn raw samples into an image.
fn decode_samples(doc: &LopdfDocument, dict: &Dictionary, data: &[u8]) -> Result<DynamicImage> {
    let width = dict_u32(dict, b"Width")?;
    let height = dict_u32(dict, b"Height")?;

    let stencil = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let bits = if stencil {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .ok()
            .and_then(get_number)
            .unwrap_or(8.0) as u32
    };
    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::ImageExtract(format!(
            "Unsupported bit depth: {} bits per component",
            bits
        )));
    }

    let space = if stencil {
        ColorSpace::Gray
    } else {
        dict.get(b"ColorSpace")
            .ok()
            .and_then(|cs| ColorSpace::parse(doc, cs))
            .ok_or_else(|| Error::ImageExtract("Unsupported color space".to_string()))?
    };

    let samples_per_row = width as usize * space.components();
    let samples = unpack_samples(data, bits, samples_per_row, height as usize).ok_or_else(|| {
        Error::ImageExtract(format!(
            "Sample data too short for {}x{} image at {} bits",
            width, height, bits
        ))
    })?;

    match space {
        ColorSpace::Indexed { base, hival, palette } => {
            let n = base.components();
            let mut expanded = Vec::with_capacity(samples.len() * n);
            for &index in &samples {
                let start = usize::from(index.min(u16::from(hival))) * n;
                match palette.get(start..start + n) {
                    Some(entry) => expanded.extend_from_slice(entry),
                    // short palette: missing entries render black
                    None => expanded.extend(std::iter::repeat(0).take(n)),
                }
            }
            build_image(width, height, &base, expanded)
        }
        space => {
            let scaled = samples.iter().map(|&v| scale_to_u8(v, bits)).collect();
            build_image(width, height, &space, scaled)
        }
    }
}

/// Split rows of packed samples into one value per component.
///
/// Rows start on byte boundaries; 16-bit samples are big-endian.
fn unpack_samples(data: &[u8], bits: u32, samples_per_row: usize, rows: usize) -> Option<Vec<u16>> {
    let row_bytes = (samples_per_row * bits as usize).div_ceil(8);
    if row_bytes == 0 || data.len() < row_bytes * rows {
        return None;
    }

    let mut samples = Vec::with_capacity(samples_per_row * rows);
    for row in data.chunks_exact(row_bytes).take(rows) {
        match bits {
            8 => samples.extend(row.iter().map(|&b| u16::from(b))),
            16 => samples.extend(row.chunks_exact(2).map(|p| u16::from_be_bytes([p[0], p[1]]))),
            _ => {
                let per_byte = (8 / bits) as usize;
                let mask = (1u16 << bits) - 1;
                samples.extend((0..samples_per_row).map(|i| {
                    let shift = 8 - bits * (i % per_byte + 1) as u32;
                    (u16::from(row[i / per_byte]) >> shift) & mask
                }));
            }
        }
    }
    Some(samples)
}

fn scale_to_u8(value: u16, bits: u32) -> u8 {
    match bits {
        8 => value as u8,
        16 => (value >> 8) as u8,
        _ => (u32::from(value) * 255 / ((1 << bits) - 1)) as u8,
    }
}

/// Build an image from 8-bit samples in a device space.
fn build_image(width: u32, height: u32, space: &ColorSpace, data: Vec<u8>) -> Result<DynamicImage> {
    let mismatch = || {
        Error::ImageExtract(format!(
            "Sample count does not match a {}x{} {:?} image",
            width, height, space
        ))
    };

    match space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, data)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(mismatch),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(mismatch),
        ColorSpace::Cmyk => {
            let rgb: Vec<u8> = data.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch)
        }
        ColorSpace::Indexed { .. } => Err(mismatch()),
    }
}

/// Use the `/SMask` image, if any, as the alpha channel.
///
/// A mask that cannot be decoded is dropped with a warning.
fn apply_soft_mask(doc: &LopdfDocument, stream: &Stream, image: DynamicImage) -> DynamicImage {
    let Some(mask) = stream
        .dict
        .get(b"SMask")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_stream().ok())
    else {
        return image;
    };

    let alpha = match decode_pixels(doc, mask) {
        Ok(alpha) => alpha.to_luma8(),
        Err(e) => {
            log::warn!("Ignoring unreadable soft mask: {}", e);
            return image;
        }
    };
    let alpha = if alpha.dimensions() == (image.width(), image.height()) {
        alpha
    } else {
        imageops::resize(&alpha, image.width(), image.height(), FilterType::Triangle)
    };

    let mut rgba = image.to_rgba8();
    for (pixel, a) in rgba.pixels_mut().zip(alpha.pixels()) {
        pixel.0[3] = a.0[0];
    }
    DynamicImage::ImageRgba8(rgba)
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v > 0)
        .ok_or_else(|| {
            Error::ImageExtract(format!(
                "Missing or invalid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - u16::from(px[3]);
    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}
