//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the rest of the
//! crate needs from a codec stack: decode input bytes into an RGBA raster, and
//! encode a raster at a given format and quality.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests drive the quality
//! search through `MockBackend`, which returns scripted output sizes.

use super::params::{ExportFormat, Quality};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),
    #[error("{format} encode failed: {message}")]
    EncodeFailed {
        format: &'static str,
        message: String,
    },
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image codec backends.
///
/// Each call is independent: backends hold no per-export state, so concurrent
/// exports can share one backend.
pub trait ImageBackend {
    /// Decode an encoded image (any supported input format) to RGBA.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Encode a raster at the given quality.
    fn encode(
        &self,
        image: &RgbaImage,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
