//! Editing session: one frame, at most one loaded image, one interaction mode.
//!
//! The session owns every piece of mutable state the input layer touches:
//!
//! | State | Created | Reset by |
//! |---|---|---|
//! | [`Frame`] | preset choice | next preset choice |
//! | source raster + [`Placement`] | successful load | next load, preset change (placement only) |
//! | [`Overlay`] | successful load | next load, preset change, [`Session::clear_overlay`] |
//! | drag / paint gesture | pointer down | pointer up/leave, mode change, load |
//!
//! ## Pointer routing
//!
//! Every pointer event is routed by the *current* [`Mode`], checked on each
//! event rather than only at gesture start. Switching mode mid-gesture ends the
//! gesture, and events that arrive with no image loaded are dropped.
//!
//! ## Stale exports
//!
//! Each load or preset change bumps a generation counter. A [`SessionExport`]
//! records the generation it was rendered from; callers that start several
//! exports can drop results for which [`Session::is_current`] is false.

use crate::config::{AppConfig, ConfigError};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, QualitySearch, RustBackend, decode_source,
    encode_under_budget, encode_under_budget_blocking, render_frame,
};
use crate::naming::{export_filename, file_basename};
use crate::overlay::{BrushStyle, Overlay};
use crate::types::{ExportEvent, ExportKind, ExportResult};
use crate::viewport::{
    DragAnchor, ElementBounds, Frame, FramePreset, Placement, PointerInput, ViewportError,
    begin_drag, init_placement, pointer_to_canvas, update_drag,
};
use image::RgbaImage;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error("No image loaded")]
    NoImage,
}

/// What pointer input does. Crop and paint are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pointer input is ignored.
    #[default]
    None,
    /// Dragging moves the image inside the frame.
    Crop,
    /// Dragging paints on the overlay.
    Paint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Pointer left the canvas; ends the gesture like `Up`.
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub input: PointerInput,
}

/// Outcome of offering a file to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Loaded(Dimensions),
    /// Not an image media type; the session is unchanged.
    Ignored,
}

/// Which raster an export encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// The composited output frame.
    Frame,
    /// The loaded image at its own dimensions (compress-only).
    Original,
}

/// A finished export plus everything the download collaborator needs.
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub result: ExportResult,
    pub filename: String,
    pub kind: ExportKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Dragging(DragAnchor),
    Painting,
}

struct LoadedImage {
    pixels: RgbaImage,
    dims: Dimensions,
    basename: String,
    placement: Placement,
    overlay: Overlay,
}

pub struct Session<B: ImageBackend = RustBackend> {
    backend: B,
    search: QualitySearch,
    brush: BrushStyle,
    filename_prefix: String,
    frame: Frame,
    mode: Mode,
    image: Option<LoadedImage>,
    gesture: Gesture,
    generation: u64,
}

impl Session<RustBackend> {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Session<B> {
    /// Create a session using a specific backend (allows testing with mock).
    pub fn with_backend(backend: B, config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            backend,
            search: config.export.search(),
            brush: config.brush.style()?,
            filename_prefix: config.export.filename_prefix.clone(),
            frame: config.frame.preset.frame(),
            mode: Mode::None,
            image: None,
            gesture: Gesture::Idle,
            generation: 0,
        })
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn search(&self) -> &QualitySearch {
        &self.search
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an export from `generation` still matches the session state.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn placement(&self) -> Option<Placement> {
        self.image.as_ref().map(|img| img.placement)
    }

    pub fn source_dimensions(&self) -> Option<Dimensions> {
        self.image.as_ref().map(|img| img.dims)
    }

    pub fn basename(&self) -> Option<&str> {
        self.image.as_ref().map(|img| img.basename.as_str())
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.image.as_ref().map(|img| &img.overlay)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging(_))
    }

    /// Switch the output frame. A loaded image is re-fitted and its overlay
    /// cleared, since both are expressed in frame pixels.
    pub fn select_preset(&mut self, preset: FramePreset) -> Result<(), SessionError> {
        let frame = preset.frame();
        if let Some(image) = self.image.as_mut() {
            image.placement = init_placement(frame, image.dims)?;
            image.overlay = Overlay::new(frame, self.brush);
        }
        self.frame = frame;
        self.gesture = Gesture::Idle;
        self.generation += 1;
        log::debug!("frame preset {:?} ({}x{})", preset, frame.width, frame.height);
        Ok(())
    }

    /// Change the interaction mode, aborting any gesture in progress.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.abort_gesture();
        self.mode = mode;
    }

    fn abort_gesture(&mut self) {
        if let (Gesture::Painting, Some(image)) = (self.gesture, self.image.as_mut()) {
            image.overlay.end_stroke();
        }
        self.gesture = Gesture::Idle;
    }

    /// Offer a file to the session.
    ///
    /// Media types outside `image/` are ignored without touching state. A
    /// decode failure is returned and also leaves the previous image in place.
    /// On success the source, placement and overlay are all replaced.
    pub fn on_file_selected(
        &mut self,
        bytes: &[u8],
        media_type: &str,
        filename: &str,
    ) -> Result<FileOutcome, SessionError> {
        if !media_type.starts_with("image/") {
            log::warn!("ignoring {filename}: media type {media_type:?} is not an image");
            return Ok(FileOutcome::Ignored);
        }

        let (pixels, dims) = decode_source(&self.backend, bytes)?;
        let placement = init_placement(self.frame, dims)?;

        self.image = Some(LoadedImage {
            pixels,
            dims,
            basename: file_basename(filename).to_string(),
            placement,
            overlay: Overlay::new(self.frame, self.brush),
        });
        self.gesture = Gesture::Idle;
        self.generation += 1;

        log::info!(
            "loaded {filename} ({}x{}), scale {:.4}",
            dims.width,
            dims.height,
            placement.scale
        );
        Ok(FileOutcome::Loaded(dims))
    }

    /// Route one pointer event. Returns true when the frame needs a redraw.
    pub fn on_pointer(&mut self, event: &PointerEvent, bounds: ElementBounds) -> bool {
        let frame = self.frame;
        let Some(image) = self.image.as_mut() else {
            return false;
        };
        let point = pointer_to_canvas(&event.input, bounds, frame);

        match (self.mode, event.phase) {
            (Mode::None, _) => {
                self.gesture = Gesture::Idle;
                false
            }

            (Mode::Crop, PointerPhase::Down) => {
                if let Some(p) = point {
                    self.gesture = Gesture::Dragging(begin_drag(p, &image.placement));
                }
                false
            }
            (Mode::Crop, PointerPhase::Move) => match (self.gesture, point) {
                (Gesture::Dragging(anchor), Some(p)) => {
                    image.placement = update_drag(p, anchor, image.placement, frame, image.dims);
                    true
                }
                _ => false,
            },
            (Mode::Crop, PointerPhase::Up | PointerPhase::Leave) => {
                self.gesture = Gesture::Idle;
                false
            }

            (Mode::Paint, PointerPhase::Down) => match point {
                Some(p) => {
                    image.overlay.begin_stroke(p);
                    self.gesture = Gesture::Painting;
                    true
                }
                None => false,
            },
            (Mode::Paint, PointerPhase::Move) => match (self.gesture, point) {
                (Gesture::Painting, Some(p)) => {
                    image.overlay.extend_stroke(p);
                    true
                }
                _ => false,
            },
            (Mode::Paint, PointerPhase::Up | PointerPhase::Leave) => {
                if self.gesture == Gesture::Painting {
                    image.overlay.end_stroke();
                }
                self.gesture = Gesture::Idle;
                false
            }
        }
    }

    /// Drop all paint. Returns false when no image is loaded.
    pub fn clear_overlay(&mut self) -> bool {
        let Some(image) = self.image.as_mut() else {
            return false;
        };
        image.overlay.clear();
        if self.gesture == Gesture::Painting {
            self.gesture = Gesture::Idle;
        }
        true
    }

    /// Composite the current frame: placed image plus overlay.
    pub fn render(&self) -> Result<RgbaImage, SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let overlay = (!image.overlay.is_empty()).then(|| image.overlay.layer());
        Ok(render_frame(
            &image.pixels,
            &image.placement,
            self.frame,
            overlay,
        ))
    }

    /// Export kind of a frame export.
    ///
    /// Any paint on the overlay is composited into the frame whatever the
    /// current mode, so a non-empty overlay always makes it `Paint`.
    /// Otherwise the mode decides.
    pub fn export_kind(&self) -> ExportKind {
        if self.overlay().is_some_and(|overlay| !overlay.is_empty()) {
            return ExportKind::Paint;
        }
        match self.mode {
            Mode::None => ExportKind::Resize,
            Mode::Crop => ExportKind::Crop,
            Mode::Paint => ExportKind::Paint,
        }
    }

    fn export_source(
        &self,
        target: ExportTarget,
    ) -> Result<(Cow<'_, RgbaImage>, ExportKind), SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        Ok(match target {
            ExportTarget::Frame => (Cow::Owned(self.render()?), self.export_kind()),
            ExportTarget::Original => (Cow::Borrowed(&image.pixels), ExportKind::Compress),
        })
    }

    fn finish(&self, kind: ExportKind, result: ExportResult) -> SessionExport {
        let basename = self.basename().unwrap_or("image");
        let filename = export_filename(&self.filename_prefix, basename, kind, self.search.format);
        log::info!(
            "exported {filename}: {} bytes at quality {:.2} after {} attempt(s)",
            result.size(),
            result.quality.value(),
            result.attempts
        );
        SessionExport {
            result,
            filename,
            kind,
            generation: self.generation,
        }
    }

    /// Encode under the configured budget, yielding between attempts.
    pub async fn export(
        &self,
        target: ExportTarget,
        events: Option<&Sender<ExportEvent>>,
    ) -> Result<SessionExport, SessionError> {
        let (raster, kind) = self.export_source(target)?;
        let result = encode_under_budget(&self.backend, &raster, &self.search, events).await?;
        Ok(self.finish(kind, result))
    }

    /// Encode under the configured budget in a tight loop.
    pub fn export_blocking(
        &self,
        target: ExportTarget,
        events: Option<&Sender<ExportEvent>>,
    ) -> Result<SessionExport, SessionError> {
        let (raster, kind) = self.export_source(target)?;
        let result = encode_under_budget_blocking(&self.backend, &raster, &self.search, events)?;
        Ok(self.finish(kind, result))
    }
}
