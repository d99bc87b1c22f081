//! Shared types passed between the imaging layer, the session, and the CLI.

use crate::imaging::Quality;
use serde::Serialize;

/// What produced an export. Selects the filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Cover-fit into the frame, untouched.
    Resize,
    /// Original dimensions kept, only re-encoded.
    Compress,
    /// Repositioned inside the frame.
    Crop,
    /// Freehand overlay painted on top.
    Paint,
}

impl ExportKind {
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            ExportKind::Resize => None,
            ExportKind::Compress => Some("compressed"),
            ExportKind::Crop => Some("cropped"),
            ExportKind::Paint => Some("painted"),
        }
    }
}

/// Output of one bounded-size export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Quality of the accepted encoding.
    pub quality: Quality,
    /// Encode attempts made, including the accepted one.
    pub attempts: usize,
}

impl ExportResult {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Progress of a quality search, for live reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Attempt {
        attempt: usize,
        quality: f32,
        size: usize,
    },
    Finished {
        attempts: usize,
        quality: f32,
        size: usize,
        within_budget: bool,
    },
}
