//! Pure calculation functions for frame sizes and the quality schedule.
//!
//! All functions here are pure and testable without any I/O or images.

/// Tolerance for float noise when counting quality steps, so that
/// `(1.0 - 0.3) / 0.05` counts as 14 steps and not 15.
const STEP_EPSILON: f64 = 1e-6;

/// Smallest quality decrement a configuration may ask for.
pub const MIN_QUALITY_STEP: f32 = 0.01;

/// Upper bound on [`quality_steps`], reached at [`MIN_QUALITY_STEP`] over the
/// full `0.0..=1.0` range. Smaller steps are capped here rather than
/// producing an unbounded number of encodes.
pub const MAX_QUALITY_STEPS: usize = 100;

/// Number of quality decrements between `1.0` and `min_quality`.
///
/// The search makes at most `quality_steps + 1` encode attempts, and never
/// more than `MAX_QUALITY_STEPS + 1`.
///
/// # Examples
/// ```
/// # use framefit::imaging::quality_steps;
/// assert_eq!(quality_steps(0.3, 0.05), 14);
/// assert_eq!(quality_steps(0.25, 0.25), 3);
/// assert_eq!(quality_steps(1.0, 0.05), 0);
/// ```
pub fn quality_steps(min_quality: f32, step: f32) -> usize {
    let span = 1.0 - min_quality as f64;
    let step = step as f64;
    if span <= 0.0 || step.is_nan() || step <= 0.0 {
        return 0;
    }
    let steps = (span / step - STEP_EPSILON).ceil().max(0.0);
    steps.min(MAX_QUALITY_STEPS as f64) as usize
}

/// Quality used for the zero-based `attempt`.
///
/// Computed from the attempt index rather than by repeated subtraction, so
/// there is no accumulated float drift. Once the schedule reaches the floor it
/// returns `min_quality` exactly.
pub fn quality_at(attempt: usize, min_quality: f32, step: f32) -> f32 {
    if attempt >= quality_steps(min_quality, step) {
        return min_quality;
    }
    (1.0 - attempt as f64 * step as f64) as f32
}

/// Pixel size of the source after scaling, rounded up so that drawing it at a
/// floored offset still reaches the far frame edge.
pub fn scaled_dimensions(source: (u32, u32), scale: f64) -> (u32, u32) {
    let (w, h) = source;
    let sw = (w as f64 * scale).ceil().max(1.0) as u32;
    let sh = (h as f64 * scale).ceil().max(1.0) as u32;
    (sw, sh)
}

/// Source rectangle `(x, y, width, height)` that lands inside the frame.
///
/// Bounds are rounded outward, so scaling the rectangle and drawing it at
/// `offset + x·scale` covers every frame pixel the whole scaled source would.
/// `None` when nothing of the source reaches the frame.
pub fn visible_source_rect(
    source: (u32, u32),
    scale: f64,
    offset: (f64, f64),
    frame: (u32, u32),
) -> Option<(u32, u32, u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let axis = |len: u32, offset: f64, frame_len: u32| {
        if !offset.is_finite() {
            return None;
        }
        let start = (-offset / scale).floor().max(0.0);
        let end = ((frame_len as f64 - offset) / scale).ceil().min(len as f64);
        (end > start).then(|| (start as u32, (end - start) as u32))
    };
    let (x, w) = axis(source.0, offset.0, frame.0)?;
    let (y, h) = axis(source.1, offset.1, frame.1)?;
    Some((x, y, w, h))
}
