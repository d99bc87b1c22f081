//! End-to-end export through the real codec stack.
//!
//! Loads synthetic PNGs into a [`Session`], edits them the way the CLI does,
//! and decodes the exported bytes to check what actually landed in the file.
//!
//! Run with: cargo test --test export_flow

use framefit::config::AppConfig;
use framefit::imaging::{ExportFormat, ImageBackend, RustBackend};
use framefit::session::{
    ExportTarget, FileOutcome, Mode, PointerEvent, PointerPhase, Session,
};
use framefit::types::{ExportEvent, ExportKind};
use framefit::viewport::{ClientPoint, ElementBounds, FramePreset, PointerInput};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x * 7 + y * 13) & 0xff) as u8,
            255,
        ])
    })
}

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn session_with(config: &AppConfig, image: &RgbaImage, name: &str) -> Session {
    let mut session = Session::new(config).unwrap();
    let outcome = session
        .on_file_selected(&png(image), "image/png", name)
        .unwrap();
    assert!(matches!(outcome, FileOutcome::Loaded(_)));
    session
}

fn mouse(phase: PointerPhase, x: f64, y: f64) -> PointerEvent {
    PointerEvent {
        phase,
        input: PointerInput::Mouse(ClientPoint { x, y }),
    }
}

#[test]
fn landscape_jpeg_export_has_frame_dimensions() {
    let config = AppConfig::default();
    let session = session_with(&config, &gradient(2048, 1152), "sunset.png");

    let export = pollster::block_on(session.export(ExportTarget::Frame, None)).unwrap();

    assert_eq!(export.filename, "framefit-sunset.jpg");
    assert_eq!(export.result.mime_type, "image/jpeg");
    assert!(export.result.attempts >= 1 && export.result.attempts <= 15);
    assert!(
        export.result.size() as u64 <= config.export.max_bytes()
            || export.result.quality.value() == config.export.min_quality
    );

    let decoded = RustBackend::new().decode(&export.result.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1024, 576));
}

#[test]
fn unreachable_budget_stops_at_minimum_quality() {
    let mut config = AppConfig::default();
    config.export.max_bytes = Some(500);
    let session = session_with(&config, &gradient(1024, 576), "busy.png");
    let (tx, rx) = std::sync::mpsc::channel();

    let export = session
        .export_blocking(ExportTarget::Frame, Some(&tx))
        .unwrap();
    drop(tx);

    assert_eq!(export.result.quality.value(), 0.3);
    assert_eq!(export.result.attempts, 15);
    assert!(export.result.size() > 500);

    let events: Vec<ExportEvent> = rx.into_iter().collect();
    assert_eq!(events.len(), 16);
    assert!(matches!(
        events.last(),
        Some(ExportEvent::Finished {
            attempts: 15,
            within_budget: false,
            ..
        })
    ));
}

#[test]
fn webp_export_on_mobile_frame() {
    let mut config = AppConfig::default();
    config.export.format = ExportFormat::Webp;
    let mut session = session_with(&config, &gradient(800, 600), "portrait.png");
    session.select_preset(FramePreset::Mobile).unwrap();

    let export = session.export_blocking(ExportTarget::Frame, None).unwrap();

    assert_eq!(export.filename, "framefit-portrait.webp");
    assert_eq!(&export.result.bytes[..4], b"RIFF");
    assert!(export.result.size() as u64 <= 100 * 1024);
    let decoded = RustBackend::new().decode(&export.result.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (340, 650));
}

#[test]
fn compress_only_keeps_source_dimensions() {
    let session = session_with(&AppConfig::default(), &gradient(300, 200), "small.png");

    let export = session
        .export_blocking(ExportTarget::Original, None)
        .unwrap();

    assert_eq!(export.kind, ExportKind::Compress);
    assert_eq!(export.filename, "framefit-small-compressed.jpg");
    let decoded = RustBackend::new().decode(&export.result.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (300, 200));
}

#[test]
fn crop_drag_changes_exported_pixels() {
    // Left half red, right half blue. Centered, the frame shows both.
    let source = RgbaImage::from_fn(2048, 576, |x, _| {
        if x < 1024 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    let mut session = session_with(&AppConfig::default(), &source, "split.png");
    let bounds = ElementBounds::native(session.frame());

    // Drag right far enough to hit the clamp: the left half fills the frame.
    session.set_mode(Mode::Crop);
    session.on_pointer(&mouse(PointerPhase::Down, 100.0, 300.0), bounds);
    session.on_pointer(&mouse(PointerPhase::Move, 900.0, 300.0), bounds);
    session.on_pointer(&mouse(PointerPhase::Up, 900.0, 300.0), bounds);
    assert_eq!(session.placement().unwrap().offset_x, 0.0);

    let export = session.export_blocking(ExportTarget::Frame, None).unwrap();
    assert_eq!(export.filename, "framefit-split-cropped.jpg");

    let decoded = RustBackend::new().decode(&export.result.bytes).unwrap();
    for x in [10, 512, 1010] {
        let [r, _, b, _] = decoded.get_pixel(x, 288).0;
        assert!(r > 200 && b < 60, "pixel at x={x} is not red: r={r} b={b}");
    }
}

#[test]
fn painted_export_carries_the_stroke() {
    let source = RgbaImage::from_pixel(1024, 576, Rgba([255, 255, 255, 255]));
    let mut config = AppConfig::default();
    config.brush.color = "#000000".into();
    config.brush.opacity = 1.0;
    config.brush.width = 20.0;
    let mut session = session_with(&config, &source, "blank.png");
    let bounds = ElementBounds::native(session.frame());

    session.set_mode(Mode::Paint);
    session.on_pointer(&mouse(PointerPhase::Down, 100.0, 288.0), bounds);
    session.on_pointer(&mouse(PointerPhase::Move, 900.0, 288.0), bounds);
    session.on_pointer(&mouse(PointerPhase::Up, 900.0, 288.0), bounds);

    let export = session.export_blocking(ExportTarget::Frame, None).unwrap();
    assert_eq!(export.filename, "framefit-blank-painted.jpg");

    let decoded = RustBackend::new().decode(&export.result.bytes).unwrap();
    assert!(decoded.get_pixel(500, 288).0[0] < 60);
    assert!(decoded.get_pixel(500, 100).0[0] > 200);
}
