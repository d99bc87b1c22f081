//! Application configuration.
//!
//! Handles loading and validating `framefit.toml`. Every key is optional;
//! stock defaults fill whatever the file leaves out.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [frame]
//! preset = "landscape"      # "landscape" (1024x576) or "mobile" (340x650)
//!
//! [export]
//! format = "jpeg"           # "jpeg", "webp" or "avif"
//! # max_bytes = 81920       # Byte budget; defaults per format (JPEG 80 KiB, WebP 100 KiB)
//! min_quality = 0.3         # Lowest quality the search will try (0.0-1.0)
//! quality_step = 0.05       # Quality decrement per attempt (0.01-1.0)
//! filename_prefix = "framefit"
//!
//! [brush]
//! width = 8.0               # Stroke width in output pixels
//! color = "#ff3b30"
//! opacity = 0.6
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ExportFormat, MIN_QUALITY_STEP, QualitySearch};
use crate::overlay::BrushStyle;
use crate::viewport::FramePreset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `framefit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Output frame selection.
    pub frame: FrameConfig,
    /// Export format and byte budget.
    pub export: ExportConfig,
    /// Paint brush.
    pub brush: BrushConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let export = &self.export;
        if !(export.min_quality > 0.0 && export.min_quality <= 1.0) {
            return Err(ConfigError::Validation(
                "export.min_quality must be in (0, 1]".into(),
            ));
        }
        if !(export.quality_step >= MIN_QUALITY_STEP && export.quality_step <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "export.quality_step must be in [{MIN_QUALITY_STEP}, 1]"
            )));
        }
        if export.max_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "export.max_bytes must be positive".into(),
            ));
        }
        if export.filename_prefix.is_empty()
            || export.filename_prefix.contains(['/', '\\'])
        {
            return Err(ConfigError::Validation(
                "export.filename_prefix must be a non-empty name without path separators".into(),
            ));
        }
        if !(self.brush.width > 0.0) {
            return Err(ConfigError::Validation(
                "brush.width must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.brush.opacity) {
            return Err(ConfigError::Validation(
                "brush.opacity must be 0.0-1.0".into(),
            ));
        }
        parse_hex_color(&self.brush.color)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Frame used until another preset is chosen.
    pub preset: FramePreset,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Byte ceiling. When absent, the format's default budget applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
    /// Lowest quality tried; the search stops here even if over budget.
    pub min_quality: f32,
    /// Quality decrement between attempts, at least `0.01`.
    pub quality_step: f32,
    /// First component of every exported filename.
    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            max_bytes: None,
            min_quality: 0.3,
            quality_step: 0.05,
            filename_prefix: "framefit".to_string(),
        }
    }
}

impl ExportConfig {
    /// Budget after filling in the per-format default.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
            .unwrap_or_else(|| self.format.default_max_bytes())
    }

    pub fn search(&self) -> QualitySearch {
        QualitySearch::new(self.format, self.max_bytes())
            .with_min_quality(self.min_quality)
            .with_step(self.quality_step)
    }
}

/// Paint brush settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrushConfig {
    /// Stroke width in output-frame pixels.
    pub width: f32,
    /// `#rrggbb` color.
    pub color: String,
    /// Stroke opacity, 0.0-1.0.
    pub opacity: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        let style = BrushStyle::default();
        let [r, g, b] = style.color;
        Self {
            width: style.width,
            color: format!("#{r:02x}{g:02x}{b:02x}"),
            opacity: style.opacity,
        }
    }
}

impl BrushConfig {
    pub fn style(&self) -> Result<BrushStyle, ConfigError> {
        Ok(BrushStyle {
            width: self.width,
            color: parse_hex_color(&self.color)?,
            opacity: self.opacity,
        })
    }
}

/// Parse a `#rrggbb` color.
pub fn parse_hex_color(value: &str) -> Result<[u8; 3], ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid color {value:?}, expected #rrggbb"));
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults; a file that exists must parse
/// and validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `framefit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# framefit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output frame
# ---------------------------------------------------------------------------
[frame]
# "landscape" = 1024x576, "mobile" = 340x650.
preset = "landscape"

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# "jpeg", "webp" or "avif".
format = "jpeg"

# Byte budget for the exported file. Quality is lowered step by step until
# the file fits. When omitted: 81920 (80 KiB) for JPEG and AVIF,
# 102400 (100 KiB) for WebP.
# max_bytes = 81920

# Lowest quality the search will try (0.0-1.0). If the file is still over
# budget at this quality it is exported anyway.
min_quality = 0.3

# Quality decrement between attempts (0.01-1.0).
quality_step = 0.05

# Exported files are named <prefix>-<original name>[-suffix].<ext>
filename_prefix = "framefit"

# ---------------------------------------------------------------------------
# Paint brush
# ---------------------------------------------------------------------------
[brush]
# Stroke width in output-frame pixels.
width = 8.0

color = "#ff3b30"

# 0.0 = invisible, 1.0 = opaque.
opacity = 0.6
"##
}
