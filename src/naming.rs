//! Export filename convention.
//!
//! Every exported file is named
//!
//! ```text
//! <prefix>-<original name without extension>[-<suffix>].<ext>
//! ```
//!
//! - `framefit-beach.jpg`: plain resize into the frame
//! - `framefit-beach-compressed.jpg`: compress-only, original dimensions
//! - `framefit-beach-cropped.webp`: repositioned in crop mode
//! - `framefit-beach-painted.jpg`: with a paint overlay

use crate::imaging::ExportFormat;
use crate::types::ExportKind;

/// Basename used when the original filename has nothing left after
/// stripping its extension.
const FALLBACK_BASENAME: &str = "image";

/// Strip the final extension from a filename.
///
/// Only a trailing `.ext` with a non-empty extension is removed:
/// - `"beach.jpg"` → `"beach"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `"README"` → `"README"`
/// - `"trailing."` → `"trailing."`
/// - `".jpg"` → `"image"`
pub fn file_basename(filename: &str) -> &str {
    let stem = match filename.rfind('.') {
        Some(dot) if dot + 1 < filename.len() => &filename[..dot],
        _ => filename,
    };
    if stem.is_empty() {
        FALLBACK_BASENAME
    } else {
        stem
    }
}

/// Build the suggested download name for an export.
pub fn export_filename(
    prefix: &str,
    basename: &str,
    kind: ExportKind,
    format: ExportFormat,
) -> String {
    match kind.suffix() {
        Some(suffix) => format!("{prefix}-{basename}-{suffix}.{}", format.extension()),
        None => format!("{prefix}-{basename}.{}", format.extension()),
    }
}
