//! Image processing: decode, composite, and bounded-size encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Scale into frame** | `imageops::resize` (Lanczos3) + `imageops::replace` |
//! | **Paint overlay** | `imageops::overlay` (alpha blend) |
//! | **Encode** | JPEG / AVIF via `image`, lossy WebP via `webp` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the quality schedule and scaled sizes (unit testable)
//! - **Parameters**: Data structures describing an export
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Frame rendering and the quality search

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{MAX_QUALITY_STEPS, MIN_QUALITY_STEP, quality_at, quality_steps};
pub use operations::{
    decode_source, encode_under_budget, encode_under_budget_blocking, render_frame,
};
pub use params::{ExportFormat, Quality, QualitySearch};
pub use rust_backend::{RustBackend, media_type_for_path};
