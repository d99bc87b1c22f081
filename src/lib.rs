//! # framefit
//!
//! Fit photos into fixed output frames, reposition or paint over them, and
//! export the result under a byte budget.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load      bytes    →  RGBA raster       (decode, reject non-images)
//! 2. Fit       raster   →  Placement         (cover-fit, centered)
//! 3. Edit      pointer  →  Placement/Overlay (crop drag or freehand paint)
//! 4. Render    state    →  frame raster      (scale, offset, composite)
//! 5. Export    frame    →  encoded bytes     (quality search under budget)
//! ```
//!
//! Steps 2 to 4 are pure geometry and raster work; only step 5 touches a codec,
//! and it does so through the [`imaging::ImageBackend`] trait so the quality
//! search runs against a mock in tests.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`viewport`] | Frame presets, cover-fit placement, clamping, pointer-to-canvas mapping, drag math |
//! | [`overlay`] | Freehand paint layer rasterised at frame size |
//! | [`imaging`] | Decode, frame compositing, and the bounded-size quality search |
//! | [`session`] | All mutable editing state: loaded image, mode, gestures, exports |
//! | [`config`] | `framefit.toml` loading, validation and the stock config |
//! | [`naming`] | Export filename convention |
//! | [`types`] | Export results and progress events shared across layers |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Cover, Never Letterbox
//!
//! The image is always scaled to cover the whole frame. Drags move it around
//! but are clamped so no empty canvas can ever show. A frame export therefore
//! always has the exact preset dimensions and no padding.
//!
//! ## Linear Quality Search
//!
//! Encoded size is not a reliably monotonic function of quality, so the
//! exporter walks quality down from `1.0` in fixed steps and keeps the first
//! encoding that fits. The schedule is short (15 steps with the defaults) and
//! the floor is always tried, so an unreachable budget still yields a file at
//! minimum quality instead of an error.
//!
//! ## Crop and Paint Are Exclusive
//!
//! Both modes consume the same pointer stream. The session holds a single
//! [`session::Mode`] and checks it on every event, so a drag can never move the
//! image and paint at the same time.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod overlay;
pub mod session;
pub mod types;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_helpers;
