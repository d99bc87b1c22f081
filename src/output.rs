//! CLI output formatting.
//!
//! Output leads with what happened to the image (loaded, fitted, encoded),
//! with numbers shown as indented context lines underneath.
//!
//! # Output Format
//!
//! ```text
//! Loaded beach.jpg (2048x576)
//!     Frame: 1024x576, scale 1.0000, offset (-512, 0)
//!     01 quality 1.00: 204.8 KiB
//!     02 quality 0.95: 150.2 KiB
//!     03 quality 0.90: 70.1 KiB
//!     accepted after 3 attempts
//! Exported framefit-beach.jpg → out/framefit-beach.jpg
//!     Size: 70.1 KiB (budget 80.0 KiB)
//!     Quality: 0.90
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::Dimensions;
use crate::session::SessionExport;
use crate::types::ExportEvent;
use crate::viewport::{Frame, Placement};
use serde::Serialize;
use std::path::Path;

/// Human-readable byte count: bytes below 1 KiB, one decimal above.
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

/// Format an offset without a trailing `.0` on whole pixels.
fn format_offset(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

// ============================================================================
// Load
// ============================================================================

/// Format the result of loading a file and fitting it to the frame.
pub fn format_load(
    filename: &str,
    dims: Dimensions,
    frame: Frame,
    placement: &Placement,
) -> Vec<String> {
    vec![
        format!("Loaded {} ({}x{})", filename, dims.width, dims.height),
        format!(
            "    Frame: {}x{}, scale {:.4}, offset ({}, {})",
            frame.width,
            frame.height,
            placement.scale,
            format_offset(placement.offset_x),
            format_offset(placement.offset_y)
        ),
    ]
}

pub fn print_load(filename: &str, dims: Dimensions, frame: Frame, placement: &Placement) {
    for line in format_load(filename, dims, frame, placement) {
        println!("{}", line);
    }
}

// ============================================================================
// Quality search progress
// ============================================================================

/// Format a single quality-search progress event.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Attempt {
            attempt,
            quality,
            size,
        } => vec![format!(
            "    {:0>2} quality {:.2}: {}",
            attempt,
            quality,
            format_size(*size as u64)
        )],
        ExportEvent::Finished {
            attempts,
            within_budget: true,
            ..
        } => {
            let noun = if *attempts == 1 { "attempt" } else { "attempts" };
            vec![format!("    accepted after {attempts} {noun}")]
        }
        ExportEvent::Finished {
            quality,
            within_budget: false,
            ..
        } => vec![format!(
            "    budget not reachable, keeping quality {:.2}",
            quality
        )],
    }
}

// ============================================================================
// Export summary
// ============================================================================

/// Format the final export report.
pub fn format_export_summary(export: &SessionExport, path: &Path, max_bytes: u64) -> Vec<String> {
    vec![
        format!("Exported {} \u{2192} {}", export.filename, path.display()),
        format!(
            "    Size: {} (budget {})",
            format_size(export.result.size() as u64),
            format_size(max_bytes)
        ),
        format!("    Quality: {:.2}", export.result.quality.value()),
    ]
}

pub fn print_export_summary(export: &SessionExport, path: &Path, max_bytes: u64) {
    for line in format_export_summary(export, path, max_bytes) {
        println!("{}", line);
    }
}

/// Machine-readable export report for `--json`.
#[derive(Serialize)]
struct ExportReport<'a> {
    #[serde(flatten)]
    export: &'a SessionExport,
    path: &'a Path,
    size: usize,
    max_bytes: u64,
}

pub fn format_export_json(
    export: &SessionExport,
    path: &Path,
    max_bytes: u64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ExportReport {
        export,
        path,
        size: export.result.size(),
        max_bytes,
    })
}

// ============================================================================
// Tests
// ============================================================================
