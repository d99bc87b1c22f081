//! Parameter types for encoding.
//!
//! These structs describe *what* to produce, not *how*. The
//! [`operations`](super::operations) module decides which quality to try next;
//! the [`backend`](super::backend) does the pixel work. Keeping them apart lets
//! the quality search run against a mock backend in tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality in `0.0..=1.0`. Clamped on construction.
//! - [`ExportFormat`]: Output codec (JPEG, WebP, AVIF) with its MIME type and extension.
//! - [`QualitySearch`]: Byte budget plus the quality schedule used to meet it.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy encoding, `0.0` (worst) to `1.0` (best).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Quality(f32);

impl Quality {
    pub const MAX: Quality = Quality(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale most codecs take.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

/// Encoded output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Webp,
    Avif,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
            ExportFormat::Avif => "avif",
        }
    }

    /// Byte ceiling used when the config leaves `max_bytes` unset.
    pub fn default_max_bytes(self) -> u64 {
        match self {
            ExportFormat::Jpeg | ExportFormat::Avif => 80 * 1024,
            ExportFormat::Webp => 100 * 1024,
        }
    }
}

/// Budget and schedule for a bounded-size export.
///
/// Quality starts at `1.0` and drops by `step` per attempt until the encoded
/// size fits `max_bytes`. The final attempt always runs at exactly
/// `min_quality` and is accepted whatever its size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualitySearch {
    pub format: ExportFormat,
    pub max_bytes: u64,
    pub min_quality: Quality,
    pub step: f32,
}

impl QualitySearch {
    pub fn new(format: ExportFormat, max_bytes: u64) -> Self {
        Self {
            format,
            max_bytes,
            min_quality: Quality::new(0.3),
            step: 0.05,
        }
    }

    pub fn with_min_quality(mut self, min_quality: f32) -> Self {
        self.min_quality = Quality::new(min_quality);
        self
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }
}

impl Default for QualitySearch {
    fn default() -> Self {
        let format = ExportFormat::default();
        Self::new(format, format.default_max_bytes())
    }
}
