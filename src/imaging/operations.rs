//! High-level image operations.
//!
//! These functions combine calculations with backend execution: compositing
//! the output frame, and searching encoder quality until the result fits a
//! byte budget.
//!
//! ## Quality search
//!
//! ```text
//! q = 1.00 → encode → 200 KiB  > budget
//! q = 0.95 → encode → 150 KiB  > budget
//! q = 0.90 → encode →  70 KiB  ≤ budget  ✓ accept
//! ```
//!
//! The scan is linear and top-down. Encoder size curves are not reliably
//! monotonic, so a bisection could settle on the wrong side of the budget,
//! and the schedule is short enough that linear cost is fine. If the budget
//! is still missed at `min_quality`, that encoding is returned anyway.
//!
//! [`encode_under_budget`] yields to the executor between attempts so a long
//! search on a large frame does not starve other work on the same thread.
//! [`encode_under_budget_blocking`] runs the same schedule in a plain loop.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{quality_at, scaled_dimensions, visible_source_rect};
use super::params::{Quality, QualitySearch};
use crate::types::{ExportEvent, ExportResult};
use crate::viewport::{Frame, Placement};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::future::Future;
use std::sync::mpsc::Sender;
use std::task::Poll;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Composite the output frame: the source scaled and offset per `placement`,
/// then the paint overlay (if any) on top.
///
/// Only the source rectangle that reaches the frame is cropped and resampled,
/// so the work is bounded by the frame size however far cover-fit upscales.
/// The scaled crop is drawn at the floored position with a rounded-up size,
/// so a placement that covers the frame leaves no unpainted edge pixels.
pub fn render_frame(
    source: &RgbaImage,
    placement: &Placement,
    frame: Frame,
    overlay: Option<&RgbaImage>,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(frame.width, frame.height);

    let visible = visible_source_rect(
        source.dimensions(),
        placement.scale,
        (placement.offset_x, placement.offset_y),
        (frame.width, frame.height),
    );
    if let Some((x, y, w, h)) = visible {
        let cropped = imageops::crop_imm(source, x, y, w, h).to_image();
        let (sw, sh) = scaled_dimensions((w, h), placement.scale);
        let drawn = if (sw, sh) == (w, h) {
            cropped
        } else {
            imageops::resize(&cropped, sw, sh, FilterType::Lanczos3)
        };
        imageops::replace(
            &mut canvas,
            &drawn,
            (placement.offset_x + x as f64 * placement.scale).floor() as i64,
            (placement.offset_y + y as f64 * placement.scale).floor() as i64,
        );
    }

    if let Some(layer) = overlay {
        imageops::overlay(&mut canvas, layer, 0, 0);
    }
    canvas
}

/// Resolves after giving the executor one chance to run something else.
fn yield_now() -> impl Future<Output = ()> {
    let mut yielded = false;
    std::future::poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
}

/// One step of the quality search. Owns the loop counters so the async and
/// blocking forms share the acceptance rule.
struct SearchStep<'a> {
    search: &'a QualitySearch,
    events: Option<&'a Sender<ExportEvent>>,
    attempt: usize,
}

impl<'a> SearchStep<'a> {
    fn new(search: &'a QualitySearch, events: Option<&'a Sender<ExportEvent>>) -> Self {
        Self {
            search,
            events,
            attempt: 0,
        }
    }

    fn quality(&self) -> Quality {
        Quality::new(quality_at(
            self.attempt,
            self.search.min_quality.value(),
            self.search.step,
        ))
    }

    fn encode<B: ImageBackend + ?Sized>(&self, backend: &B, image: &RgbaImage) -> Result<Vec<u8>> {
        backend.encode(image, self.search.format, self.quality())
    }

    /// Judge one encoding. Returns the final result when accepted, otherwise
    /// advances to the next quality level.
    fn settle(&mut self, bytes: Vec<u8>) -> Option<ExportResult> {
        let quality = self.quality();
        let size = bytes.len();
        self.attempt += 1;

        log::debug!(
            "{} attempt {}: quality {:.2} -> {} bytes",
            self.search.format.mime_type(),
            self.attempt,
            quality.value(),
            size
        );
        self.emit(ExportEvent::Attempt {
            attempt: self.attempt,
            quality: quality.value(),
            size,
        });

        let within_budget = size as u64 <= self.search.max_bytes;
        if !within_budget && quality > self.search.min_quality {
            return None;
        }

        if !within_budget {
            log::debug!(
                "budget of {} bytes unreachable, keeping {} bytes at minimum quality",
                self.search.max_bytes,
                size
            );
        }
        self.emit(ExportEvent::Finished {
            attempts: self.attempt,
            quality: quality.value(),
            size,
            within_budget,
        });
        Some(ExportResult {
            bytes,
            mime_type: self.search.format.mime_type(),
            quality,
            attempts: self.attempt,
        })
    }

    fn emit(&self, event: ExportEvent) {
        if let Some(tx) = self.events {
            let _ = tx.send(event);
        }
    }
}

/// Encode `image` at decreasing quality until it fits `search.max_bytes`.
///
/// Yields to the executor between attempts. Always produces a result unless
/// the codec itself fails; an unreachable budget returns the encoding at
/// `search.min_quality`.
pub async fn encode_under_budget<B: ImageBackend + ?Sized>(
    backend: &B,
    image: &RgbaImage,
    search: &QualitySearch,
    events: Option<&Sender<ExportEvent>>,
) -> Result<ExportResult> {
    let mut step = SearchStep::new(search, events);
    loop {
        let bytes = step.encode(backend, image)?;
        if let Some(result) = step.settle(bytes) {
            return Ok(result);
        }
        yield_now().await;
    }
}

/// Same search as [`encode_under_budget`], run to completion without
/// yielding. Fine for small frames or callers without an executor.
pub fn encode_under_budget_blocking<B: ImageBackend + ?Sized>(
    backend: &B,
    image: &RgbaImage,
    search: &QualitySearch,
    events: Option<&Sender<ExportEvent>>,
) -> Result<ExportResult> {
    let mut step = SearchStep::new(search, events);
    loop {
        let bytes = step.encode(backend, image)?;
        if let Some(result) = step.settle(bytes) {
            return Ok(result);
        }
    }
}

/// Dimensions of a decoded source, checked through the backend.
pub fn decode_source<B: ImageBackend + ?Sized>(
    backend: &B,
    bytes: &[u8],
) -> Result<(RgbaImage, Dimensions)> {
    let image = backend.decode(bytes)?;
    let dims = Dimensions::of(&image);
    Ok((image, dims))
}
