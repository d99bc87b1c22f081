use clap::{Parser, Subcommand};
use framefit::config::{self, AppConfig};
use framefit::imaging::{ExportFormat, media_type_for_path};
use framefit::output;
use framefit::session::{
    ExportTarget, FileOutcome, Mode, PointerEvent, PointerPhase, Session,
};
use framefit::viewport::{CanvasPoint, ClientPoint, ElementBounds, FramePreset, PointerInput};
use std::error::Error;
use std::path::{Path, PathBuf};

/// A freehand stroke given on the command line as `"x,y x,y ..."`.
#[derive(Debug, Clone)]
struct Stroke(Vec<CanvasPoint>);

fn parse_point(value: &str) -> Result<CanvasPoint, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {value:?}"))?;
    let coord = |s: &str| {
        let v = s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate {s:?}: {e}"))?;
        if !v.is_finite() {
            return Err(format!("coordinate must be finite, got {s:?}"));
        }
        Ok(v)
    };
    Ok(CanvasPoint {
        x: coord(x)?,
        y: coord(y)?,
    })
}

fn parse_stroke(value: &str) -> Result<Stroke, String> {
    let points = value
        .split_whitespace()
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err("a stroke needs at least one point".into());
    }
    Ok(Stroke(points))
}

#[derive(clap::Args, Clone)]
struct FrameArgs {
    /// Image to load
    file: PathBuf,

    /// Output frame (defaults to the configured preset)
    #[arg(long, value_enum)]
    preset: Option<FramePreset>,
}

#[derive(Parser)]
#[command(name = "framefit")]
#[command(about = "Fit images to fixed frames and export them under a byte budget")]
#[command(long_about = "\
Fit images to fixed frames and export them under a byte budget

The image is scaled to cover the frame and centered. It can then be moved
inside the frame (resize --offset) or painted over (paint --stroke). The
export lowers encoder quality step by step until the file fits the budget.

Frames:
  landscape   1024x576
  mobile      340x650

Exported files are named <prefix>-<name>[-cropped|-painted|-compressed].<ext>

Run 'framefit gen-config' to generate a documented framefit.toml.")]
#[command(version = env!("FRAMEFIT_VERSION"))]
struct Cli {
    /// Config file
    #[arg(long, default_value = "framefit.toml", global = true)]
    config: PathBuf,

    /// Directory exported files are written to
    #[arg(long, default_value = ".", global = true)]
    out: PathBuf,

    /// Override the configured export format
    #[arg(long, value_enum, global = true)]
    format: Option<ExportFormat>,

    /// Run the quality search without yielding between attempts
    #[arg(long, global = true)]
    blocking: bool,

    /// Print the export report as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cover-fit an image to a frame and export it
    Resize {
        #[command(flatten)]
        frame: FrameArgs,

        /// Move the image to this offset (clamped to keep the frame covered)
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        offset: Option<CanvasPoint>,
    },
    /// Paint freehand strokes over the framed image and export it
    Paint {
        #[command(flatten)]
        frame: FrameArgs,

        /// Stroke as space-separated frame coordinates: "x,y x,y ..."
        #[arg(long = "stroke", value_parser = parse_stroke, required = true, allow_hyphen_values = true)]
        strokes: Vec<Stroke>,
    },
    /// Re-encode an image at its own size to fit the byte budget
    Compress {
        /// Image to load
        file: PathBuf,
    },
    /// Print a stock framefit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Resize { frame, offset } => {
            let mut session = open_session(&cli, &frame.file, frame.preset)?;
            if let Some(target) = offset {
                drag_to(&mut session, *target);
            }
            export(&session, ExportTarget::Frame, &cli)?;
        }
        Command::Paint { frame, strokes } => {
            let mut session = open_session(&cli, &frame.file, frame.preset)?;
            paint(&mut session, strokes);
            export(&session, ExportTarget::Frame, &cli)?;
        }
        Command::Compress { file } => {
            let session = open_session(&cli, file, None)?;
            export(&session, ExportTarget::Original, &cli)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_app_config(cli: &Cli) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = config::load_config(&cli.config)?;
    if let Some(format) = cli.format {
        config.export.format = format;
    }
    config.validate()?;
    Ok(config)
}

/// Build a session from config and load `file` into it.
fn open_session(
    cli: &Cli,
    file: &Path,
    preset: Option<FramePreset>,
) -> Result<Session, Box<dyn Error>> {
    let config = load_app_config(cli)?;
    let mut session = Session::new(&config)?;
    if let Some(preset) = preset {
        session.select_preset(preset)?;
    }

    let bytes = std::fs::read(file)?;
    let filename = file
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    match session.on_file_selected(&bytes, media_type_for_path(file), &filename)? {
        FileOutcome::Loaded(dims) => {
            match session.placement() {
                Some(placement) if !cli.json => {
                    output::print_load(&filename, dims, session.frame(), &placement)
                }
                _ => {}
            }
            Ok(session)
        }
        FileOutcome::Ignored => Err(format!("{} is not a supported image", file.display()).into()),
    }
}

fn pointer(phase: PointerPhase, at: CanvasPoint) -> PointerEvent {
    PointerEvent {
        phase,
        input: PointerInput::Mouse(ClientPoint { x: at.x, y: at.y }),
    }
}

/// Move the image to `target` with a crop-mode drag on a native-size canvas.
fn drag_to(session: &mut Session, target: CanvasPoint) {
    let Some(current) = session.placement() else {
        return;
    };
    let bounds = ElementBounds::native(session.frame());
    let grab = CanvasPoint {
        x: current.offset_x,
        y: current.offset_y,
    };

    session.set_mode(Mode::Crop);
    session.on_pointer(&pointer(PointerPhase::Down, grab), bounds);
    session.on_pointer(&pointer(PointerPhase::Move, target), bounds);
    session.on_pointer(&pointer(PointerPhase::Up, target), bounds);
}

fn paint(session: &mut Session, strokes: &[Stroke]) {
    let bounds = ElementBounds::native(session.frame());
    session.set_mode(Mode::Paint);
    for Stroke(points) in strokes {
        let Some((first, rest)) = points.split_first() else {
            continue;
        };
        session.on_pointer(&pointer(PointerPhase::Down, *first), bounds);
        for point in rest {
            session.on_pointer(&pointer(PointerPhase::Move, *point), bounds);
        }
        let last = rest.last().unwrap_or(first);
        session.on_pointer(&pointer(PointerPhase::Up, *last), bounds);
    }
}

/// Run the quality search, report progress, and write the result to `--out`.
fn export(session: &Session, target: ExportTarget, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let quiet = cli.json;
    let printer = std::thread::spawn(move || {
        for event in rx {
            if quiet {
                continue;
            }
            for line in output::format_export_event(&event) {
                println!("{}", line);
            }
        }
    });

    let result = if cli.blocking {
        session.export_blocking(target, Some(&tx))
    } else {
        pollster::block_on(session.export(target, Some(&tx)))
    };
    drop(tx);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let export = result?;

    std::fs::create_dir_all(&cli.out)?;
    let path = cli.out.join(&export.filename);
    std::fs::write(&path, &export.result.bytes)?;

    let max_bytes = session.search().max_bytes;
    if cli.json {
        println!("{}", output::format_export_json(&export, &path, max_bytes)?);
    } else {
        output::print_export_summary(&export, &path, max_bytes);
    }
    Ok(())
}
