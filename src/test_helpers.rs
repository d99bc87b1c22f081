//! Shared test utilities for the framefit test suite.
//!
//! Provides synthetic rasters and encoded fixtures so tests never depend on
//! image files checked into the repo.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient_image(64, 48);
//! let bytes = png_bytes(&img);
//! ```

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Rasters
// =========================================================================

/// Single-color raster.
pub fn solid_image(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(pixel))
}

/// Opaque raster with a diagonal color ramp. Compresses less trivially than
/// a solid fill, so quality levels produce visibly different sizes.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x ^ y) & 0xff) as u8;
        Rgba([r, g, b, 255])
    })
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// PNG-encode a raster in memory.
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}
