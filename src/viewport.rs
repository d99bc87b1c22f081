//! Viewport transform: where the source image sits inside the output frame.
//!
//! A [`Placement`] is a uniform scale plus a translation from source pixels to
//! frame pixels. It starts as a centered cover-fit and afterwards only its
//! offsets move, always clamped so the scaled image covers the whole frame.
//!
//! ```text
//!   offset_x ≤ 0                    frame (W × H)
//!   ┌──────────────────────────────────────────────┐  scaled source
//!   │        ┌───────────────────────┐             │  (w·scale × h·scale)
//!   │        │                       │             │
//!   │        │      visible area     │             │
//!   │        │                       │             │
//!   │        └───────────────────────┘             │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! Per axis the offset is confined to `[frameDim − sourceDim·scale, 0]`.
//! Because the scale is cover-fit, the lower bound is never positive, so the
//! range is never empty. When the scaled image matches the frame exactly on an
//! axis the range collapses to `0` and that axis cannot be dragged.
//!
//! All functions here are pure; the [`session`](crate::session) module owns the
//! mutable state and calls into them per pointer event.

use crate::imaging::Dimensions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// The two supported output frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FramePreset {
    /// 1024×576, 16:9.
    #[default]
    Landscape,
    /// 340×650, tall phone layout.
    Mobile,
}

impl FramePreset {
    pub fn frame(self) -> Frame {
        match self {
            FramePreset::Landscape => Frame {
                width: 1024,
                height: 576,
            },
            FramePreset::Mobile => Frame {
                width: 340,
                height: 650,
            },
        }
    }
}

/// Fixed-size output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Result<Self, ViewportError> {
        check_dimensions(width, height)?;
        Ok(Self { width, height })
    }
}

impl From<FramePreset> for Frame {
    fn from(preset: FramePreset) -> Self {
        preset.frame()
    }
}

/// Scale and offset that position the source image inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Pointer position captured at the start of a drag, relative to the
/// placement offset at that moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub dx: f64,
    pub dy: f64,
}

/// A point in client (display) coordinates, as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPoint {
    pub x: f64,
    pub y: f64,
}

/// A point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

/// Position source of a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse(ClientPoint),
    /// Active touch contacts; only the first one is used.
    Touch(Vec<ClientPoint>),
}

impl PointerInput {
    /// The contact that drives the gesture: the mouse position or the first
    /// touch. `None` when a touch event carries no contacts (e.g. `touchend`).
    pub fn primary(&self) -> Option<ClientPoint> {
        match self {
            PointerInput::Mouse(p) => Some(*p),
            PointerInput::Touch(contacts) => contacts.first().copied(),
        }
    }
}

/// Rendered bounds of the canvas element in client coordinates.
///
/// The element may be displayed at any size; its width and height are
/// independent of the canvas pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBounds {
    /// Canvas shown at its own pixel size with its corner at the origin, so
    /// client coordinates are canvas coordinates.
    pub fn native(frame: Frame) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: frame.width as f64,
            height: frame.height as f64,
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), ViewportError> {
    if width == 0 || height == 0 {
        return Err(ViewportError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Smallest uniform scale at which `source` covers `frame` on both axes.
pub fn cover_scale(frame: Frame, source: Dimensions) -> Result<f64, ViewportError> {
    check_dimensions(frame.width, frame.height)?;
    check_dimensions(source.width, source.height)?;
    let sx = frame.width as f64 / source.width as f64;
    let sy = frame.height as f64 / source.height as f64;
    Ok(sx.max(sy))
}

/// Cover-fit the source into the frame and center it.
pub fn init_placement(frame: Frame, source: Dimensions) -> Result<Placement, ViewportError> {
    let scale = cover_scale(frame, source)?;
    Ok(Placement {
        scale,
        offset_x: (frame.width as f64 - source.width as f64 * scale) / 2.0,
        offset_y: (frame.height as f64 - source.height as f64 * scale) / 2.0,
    })
}

/// Lowest allowed offset on each axis: `frameDim − sourceDim·scale`.
pub fn min_offsets(placement: &Placement, frame: Frame, source: Dimensions) -> (f64, f64) {
    (
        frame.width as f64 - source.width as f64 * placement.scale,
        frame.height as f64 - source.height as f64 * placement.scale,
    )
}

/// Constrain the offsets so the scaled image fully covers the frame.
///
/// The upper bound is applied last, so if a placement was built with a
/// non-cover scale the image is pinned to the top-left edge rather than
/// producing an inverted range.
pub fn clamp(placement: Placement, frame: Frame, source: Dimensions) -> Placement {
    let (min_x, min_y) = min_offsets(&placement, frame, source);
    Placement {
        offset_x: placement.offset_x.max(min_x).min(0.0),
        offset_y: placement.offset_y.max(min_y).min(0.0),
        ..placement
    }
}

/// Map a pointer from element space into canvas pixel space.
///
/// Each axis is scaled by its own `canvasPixels / renderedPixels` factor so a
/// canvas stretched non-uniformly by CSS still maps correctly. Returns `None`
/// when there is no primary contact or the element has no rendered area.
pub fn pointer_to_canvas(
    input: &PointerInput,
    bounds: ElementBounds,
    frame: Frame,
) -> Option<CanvasPoint> {
    let p = input.primary()?;
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }
    Some(CanvasPoint {
        x: (p.x - bounds.left) * (frame.width as f64 / bounds.width),
        y: (p.y - bounds.top) * (frame.height as f64 / bounds.height),
    })
}

/// Remember where the pointer grabbed the image so moves keep that grip.
pub fn begin_drag(pointer: CanvasPoint, placement: &Placement) -> DragAnchor {
    DragAnchor {
        dx: pointer.x - placement.offset_x,
        dy: pointer.y - placement.offset_y,
    }
}

/// Move the image with the pointer, keeping it clamped to the frame.
pub fn update_drag(
    pointer: CanvasPoint,
    anchor: DragAnchor,
    placement: Placement,
    frame: Frame,
    source: Dimensions,
) -> Placement {
    let moved = Placement {
        offset_x: pointer.x - anchor.dx,
        offset_y: pointer.y - anchor.dy,
        ..placement
    };
    clamp(moved, frame, source)
}
