//! Production codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → WebP (lossy) | `webp::Encoder` (libwebp) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! The `image` crate's own WebP encoder only writes lossless files, which
//! ignore quality entirely, so lossy WebP goes through libwebp.

use super::backend::{BackendError, ImageBackend};
use super::params::{ExportFormat, Quality};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use std::path::Path;

/// Extensions whose decoders are compiled in, with the format they map to.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Media type for a file on disk, judged by extension.
///
/// Files without a decodable image extension get `application/octet-stream`,
/// which the session treats as "not an image" and ignores.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    INPUT_CANDIDATES
        .iter()
        .find(|(candidate, fmt)| *candidate == ext && fmt.reading_enabled())
        .map(|(_, fmt)| fmt.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Codec backend built on the `image` crate and libwebp.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop alpha for formats that cannot carry it.
///
/// Transparent pixels come out black, matching what a browser canvas does
/// when exporting JPEG.
fn flatten_alpha(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let premul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        image::Rgb([premul(r), premul(g), premul(b)])
    })
}

fn encode_jpeg(image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = flatten_alpha(image);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.percent())
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::EncodeFailed {
            format: "JPEG",
            message: e.to_string(),
        })?;
    Ok(buf)
}

fn encode_webp(image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let encoder = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height());
    let mem = encoder
        .encode_simple(false, quality.percent() as f32)
        .map_err(|e| BackendError::EncodeFailed {
            format: "WebP",
            message: format!("{e:?}"),
        })?;
    Ok(mem.to_vec())
}

/// Encode as AVIF using rav1e (speed=6 for reasonable throughput).
fn encode_avif(image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, quality.percent())
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::EncodeFailed {
            format: "AVIF",
            message: e.to_string(),
        })?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::DecodeFailure(e.to_string()))?;
        Ok(img.to_rgba8())
    }

    fn encode(
        &self,
        image: &RgbaImage,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            ExportFormat::Jpeg => encode_jpeg(image, quality),
            ExportFormat::Webp => encode_webp(image, quality),
            ExportFormat::Avif => encode_avif(image, quality),
        }
    }
}
