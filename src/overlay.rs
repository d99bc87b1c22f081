//! Freehand paint layer.
//!
//! The overlay is a transparent RGBA raster the size of the frame. Strokes are
//! recorded as canvas-space points and rasterised as they arrive: every
//! segment is covered with filled discs of the brush width. Within one overlay
//! the brush never builds up past its own opacity, so crossing strokes look
//! like a single pass of a marker rather than stacked layers.
//!
//! The overlay does not follow the [`Placement`](crate::viewport::Placement):
//! it is painted on the frame, not on the image.

use crate::viewport::{CanvasPoint, Frame};
use image::{Rgba, RgbaImage};
use serde::Serialize;

/// Fixed brush used for every stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrushStyle {
    /// Stroke width in canvas pixels.
    pub width: f32,
    pub color: [u8; 3],
    /// `0.0` invisible, `1.0` opaque.
    pub opacity: f32,
}

impl BrushStyle {
    fn pixel(&self) -> Rgba<u8> {
        let alpha = (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let [r, g, b] = self.color;
        Rgba([r, g, b, alpha])
    }

    fn radius(&self) -> f64 {
        (self.width as f64 / 2.0).max(0.5)
    }
}

impl Default for BrushStyle {
    fn default() -> Self {
        Self {
            width: 8.0,
            color: [0xff, 0x3b, 0x30],
            opacity: 0.6,
        }
    }
}

/// One freehand path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayStroke {
    pub points: Vec<CanvasPoint>,
}

#[derive(Debug, Clone)]
pub struct Overlay {
    layer: RgbaImage,
    brush: BrushStyle,
    strokes: Vec<OverlayStroke>,
    active: Option<OverlayStroke>,
}

impl Overlay {
    pub fn new(frame: Frame, brush: BrushStyle) -> Self {
        Self {
            layer: RgbaImage::new(frame.width, frame.height),
            brush,
            strokes: Vec::new(),
            active: None,
        }
    }

    /// Rasterised paint, ready to composite over the frame.
    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    /// Finished strokes, oldest first. The stroke in progress is not included.
    pub fn strokes(&self) -> &[OverlayStroke] {
        &self.strokes
    }

    pub fn is_painting(&self) -> bool {
        self.active.is_some()
    }

    /// True when nothing has been painted, including a stroke in progress.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.active.is_none()
    }

    /// Start a stroke. A press without motion still leaves a dot.
    ///
    /// Points with a non-finite coordinate are ignored.
    pub fn begin_stroke(&mut self, at: CanvasPoint) {
        if !is_finite(at) {
            return;
        }
        self.end_stroke();
        stamp_disc(&mut self.layer, at, self.brush.radius(), self.brush.pixel());
        self.active = Some(OverlayStroke { points: vec![at] });
    }

    /// Extend the active stroke. Ignored when no stroke is active or when
    /// `to` has a non-finite coordinate.
    pub fn extend_stroke(&mut self, to: CanvasPoint) {
        if !is_finite(to) {
            return;
        }
        let Some(stroke) = self.active.as_mut() else {
            return;
        };
        if let Some(&from) = stroke.points.last() {
            stamp_segment(&mut self.layer, from, to, &self.brush);
        }
        stroke.points.push(to);
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
        }
    }

    pub fn clear(&mut self) {
        self.layer.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
        self.strokes.clear();
        self.active = None;
    }
}

fn is_finite(point: CanvasPoint) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Stamp discs along `from..to`, limited to the part of the segment that can
/// reach the layer. The stamp count is bounded by the layer size no matter
/// how far away the endpoints are.
fn stamp_segment(layer: &mut RgbaImage, from: CanvasPoint, to: CanvasPoint, brush: &BrushStyle) {
    let radius = brush.radius();
    let pixel = brush.pixel();
    let reach = (
        (-radius, -radius),
        (layer.width() as f64 + radius, layer.height() as f64 + radius),
    );
    let Some((from, to)) = clip_segment(from, to, reach.0, reach.1) else {
        return;
    };

    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = dx.hypot(dy);
    let spacing = (radius / 2.0).max(0.5);
    let steps = (length / spacing).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let at = CanvasPoint {
            x: from.x + dx * t,
            y: from.y + dy * t,
        };
        stamp_disc(layer, at, radius, pixel);
    }
}

/// Liang-Barsky clip of a segment against the rectangle `min..=max`.
///
/// Returns `None` when no part of the segment lies inside, or when the
/// segment's extent is not finite.
fn clip_segment(
    from: CanvasPoint,
    to: CanvasPoint,
    min: (f64, f64),
    max: (f64, f64),
) -> Option<(CanvasPoint, CanvasPoint)> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, from.x - min.0),
        (dx, max.0 - from.x),
        (-dy, from.y - min.1),
        (dy, max.1 - from.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: either fully outside or unconstrained.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| CanvasPoint {
        x: from.x + dx * t,
        y: from.y + dy * t,
    };
    Some((at(t0), at(t1)))
}

/// Fill every pixel whose center lies within `radius` of `center`.
///
/// Alpha is combined with `max`, so repeated stamps of the same brush keep
/// the brush's opacity.
fn stamp_disc(layer: &mut RgbaImage, center: CanvasPoint, radius: f64, pixel: Rgba<u8>) {
    let (w, h) = (layer.width() as f64, layer.height() as f64);
    let x0 = (center.x - radius).floor().max(0.0);
    let y0 = (center.y - radius).floor().max(0.0);
    let x1 = (center.x + radius).ceil().min(w);
    let y1 = (center.y + radius).ceil().min(h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let r2 = radius * radius;
    for y in y0 as u32..y1 as u32 {
        for x in x0 as u32..x1 as u32 {
            let px = x as f64 + 0.5 - center.x;
            let py = y as f64 + 0.5 - center.y;
            if px * px + py * py > r2 {
                continue;
            }
            let existing = layer.get_pixel_mut(x, y);
            if existing.0[3] <= pixel.0[3] {
                *existing = pixel;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(40, 20).unwrap()
    }

    fn pt(x: f64, y: f64) -> CanvasPoint {
        CanvasPoint { x, y }
    }

    fn opaque_brush() -> BrushStyle {
        BrushStyle {
            width: 4.0,
            color: [255, 0, 0],
            opacity: 1.0,
        }
    }

    fn painted(overlay: &Overlay, x: u32, y: u32) -> bool {
        overlay.layer().get_pixel(x, y).0[3] > 0
    }

    #[test]
    fn new_overlay_is_transparent_and_frame_sized() {
        let overlay = Overlay::new(frame(), BrushStyle::default());
        assert_eq!(overlay.layer().dimensions(), (40, 20));
        assert!(overlay.layer().pixels().all(|p| p.0[3] == 0));
        assert!(overlay.is_empty());
    }

    #[test]
    fn press_leaves_a_dot() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(10.0, 10.0));
        assert!(painted(&overlay, 10, 10));
        assert!(painted(&overlay, 9, 9));
        assert!(!painted(&overlay, 20, 10));
        assert!(overlay.is_painting());
        assert!(!overlay.is_empty());
    }

    #[test]
    fn segment_is_continuous() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(2.0, 10.0));
        overlay.extend_stroke(pt(38.0, 10.0));
        overlay.end_stroke();
        for x in 2..38 {
            assert!(painted(&overlay, x, 10), "gap at x={x}");
        }
        assert!(!painted(&overlay, 20, 2));
        assert_eq!(overlay.strokes().len(), 1);
        assert_eq!(overlay.strokes()[0].points, vec![pt(2.0, 10.0), pt(38.0, 10.0)]);
    }

    #[test]
    fn extend_without_begin_is_ignored() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.extend_stroke(pt(5.0, 5.0));
        assert!(overlay.is_empty());
        assert!(overlay.layer().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn overlapping_strokes_keep_brush_opacity() {
        let brush = BrushStyle {
            opacity: 0.5,
            ..opaque_brush()
        };
        let mut overlay = Overlay::new(frame(), brush);
        overlay.begin_stroke(pt(5.0, 10.0));
        overlay.extend_stroke(pt(35.0, 10.0));
        overlay.end_stroke();
        overlay.begin_stroke(pt(20.0, 1.0));
        overlay.extend_stroke(pt(20.0, 19.0));
        overlay.end_stroke();

        assert_eq!(overlay.layer().get_pixel(20, 10).0, [255, 0, 0, 128]);
        assert_eq!(overlay.strokes().len(), 2);
    }

    #[test]
    fn strokes_off_canvas_are_clipped() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(-50.0, -50.0));
        overlay.extend_stroke(pt(-10.0, 100.0));
        overlay.end_stroke();
        assert!(overlay.layer().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn far_endpoint_paints_only_the_visible_part() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(5.0, 10.0));
        overlay.extend_stroke(pt(2.0e8, 10.0));
        overlay.end_stroke();

        for x in 5..40 {
            assert!(painted(&overlay, x, 10), "gap at x={x}");
        }
        assert!(!painted(&overlay, 20, 2));
        assert_eq!(overlay.strokes()[0].points, vec![pt(5.0, 10.0), pt(2.0e8, 10.0)]);
    }

    #[test]
    fn segment_crossing_the_canvas_from_far_outside() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(-1.0e12, 10.0));
        overlay.extend_stroke(pt(1.0e12, 10.0));
        overlay.end_stroke();

        assert!(painted(&overlay, 0, 10));
        assert!(painted(&overlay, 39, 10));
        assert!(!painted(&overlay, 20, 18));
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(5.0, 10.0));
        overlay.extend_stroke(pt(f64::INFINITY, 10.0));
        overlay.extend_stroke(pt(10.0, f64::NAN));
        assert!(overlay.is_painting());
        overlay.end_stroke();

        assert_eq!(overlay.strokes()[0].points, vec![pt(5.0, 10.0)]);
        assert!(!painted(&overlay, 20, 10));

        overlay.begin_stroke(pt(f64::NEG_INFINITY, 0.0));
        assert!(!overlay.is_painting());
        assert_eq!(overlay.strokes().len(), 1);
    }

    #[test]
    fn clip_keeps_inside_segment_and_drops_outside_one() {
        let inside = clip_segment(pt(1.0, 1.0), pt(3.0, 4.0), (0.0, 0.0), (10.0, 10.0));
        assert_eq!(inside, Some((pt(1.0, 1.0), pt(3.0, 4.0))));

        let clipped = clip_segment(pt(-8.0, 5.0), pt(24.0, 5.0), (0.0, 0.0), (16.0, 10.0));
        assert_eq!(clipped, Some((pt(0.0, 5.0), pt(16.0, 5.0))));

        let outside = clip_segment(pt(-10.0, -5.0), pt(20.0, -5.0), (0.0, 0.0), (10.0, 10.0));
        assert_eq!(outside, None);

        let overflow = clip_segment(pt(-f64::MAX, 0.0), pt(f64::MAX, 0.0), (0.0, 0.0), (1.0, 1.0));
        assert_eq!(overflow, None);
    }

    #[test]
    fn new_stroke_closes_the_previous_one() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(5.0, 5.0));
        overlay.begin_stroke(pt(30.0, 5.0));
        assert_eq!(overlay.strokes().len(), 1);
        overlay.end_stroke();
        assert_eq!(overlay.strokes().len(), 2);
    }

    #[test]
    fn clear_resets_pixels_and_strokes() {
        let mut overlay = Overlay::new(frame(), opaque_brush());
        overlay.begin_stroke(pt(10.0, 10.0));
        overlay.extend_stroke(pt(30.0, 10.0));
        overlay.clear();
        assert!(overlay.is_empty());
        assert!(!overlay.is_painting());
        assert!(overlay.layer().pixels().all(|p| p.0[3] == 0));
    }
}
