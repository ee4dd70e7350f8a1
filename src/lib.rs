//! Labelbridge: viewer annotations <-> label volumes.
//!
//! Labelbridge converts the free-hand polygon drawings a dwv viewer stores as
//! JSON into a 3-D label volume, and turns an edited label volume back into
//! drawings the viewer can display. A [`session::Session`] keeps the
//! name -> value registry and the per-label colors consistent across both
//! directions.
//!
//! # Modules
//!
//! - [`label`]: Label values, the registry and the description ledger
//! - [`document`]: Viewer document schema and I/O
//! - [`raster`]: Convex-hull fill of drawings onto a grid
//! - [`volume`]: Label volume helpers (slice mapping, regions, seeds)
//! - [`session`]: Decode and encode sessions with their reports
//! - [`error`]: Error types for labelbridge operations

pub mod document;
pub mod error;
pub mod label;
pub mod raster;
pub mod session;
pub mod volume;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde_json::Number;

pub use error::LabelBridgeError;
pub use session::{DecodeOptions, Session, SessionOptions, SessionReport};

use document::{Position, Viewport};
use label::CollisionPolicy;
use session::SessionState;
use volume::LabelVolume;

/// The labelbridge CLI application.
#[derive(Parser)]
#[command(name = "labelbridge")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log label assignments and per-slice counts to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Rasterize a viewer document into a label volume.
    Decode(DecodeArgs),
    /// Turn a label volume into viewer drawings.
    Encode(EncodeArgs),
    /// Build a seed volume for one label.
    Seeds(SeedsArgs),
}

/// Output format for session reports.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the decode subcommand.
#[derive(clap::Args)]
struct DecodeArgs {
    /// Viewer document to decode.
    input: PathBuf,

    /// Volume shape as Z,X,Y.
    #[arg(long, value_delimiter = ',', required = true)]
    shape: Vec<usize>,

    /// Output label volume (.npy).
    #[arg(short, long)]
    output: PathBuf,

    /// Session file; loaded when present and written back afterwards.
    #[arg(long)]
    session: Option<PathBuf>,

    /// Seed for automatically assigned label values.
    #[arg(long)]
    seed: Option<u64>,

    /// Draw automatic values only among values not yet in use.
    #[arg(long)]
    avoid_collisions: bool,

    /// Only decode drawings with these names (comma-separated).
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t)]
    report: ReportFormat,
}

/// Arguments for the encode subcommand.
#[derive(clap::Args)]
struct EncodeArgs {
    /// Label volume (.npy) to encode.
    input: PathBuf,

    /// Output viewer document.
    #[arg(short, long)]
    output: PathBuf,

    /// Session file holding label names and colors.
    #[arg(long)]
    session: PathBuf,

    /// Existing document to append the drawings to.
    #[arg(long)]
    document: Option<PathBuf>,

    /// Window center of a newly created document.
    #[arg(long, default_value_t = 50.0, allow_negative_numbers = true)]
    window_center: f64,

    /// Window width of a newly created document.
    #[arg(long, default_value_t = 350.0)]
    window_width: f64,

    /// Zoom scale of a newly created document.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Slice position of a newly created document as I,J,K.
    #[arg(long, value_delimiter = ',', default_values_t = [0i64, 0, 0])]
    position: Vec<i64>,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t)]
    report: ReportFormat,
}

/// Arguments for the seeds subcommand.
#[derive(clap::Args)]
struct SeedsArgs {
    /// Label volume (.npy).
    input: PathBuf,

    /// Session file holding label names.
    #[arg(long)]
    session: PathBuf,

    /// Label to mark with 1; every other label is marked with 2.
    #[arg(long)]
    label: String,

    /// Output seed volume (.npy).
    #[arg(short, long)]
    output: PathBuf,
}

/// Run the labelbridge CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelBridgeError> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    // Fails only when a logger is already installed by an embedding program.
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();

    match cli.command {
        Some(Commands::Decode(args)) => run_decode(args),
        Some(Commands::Encode(args)) => run_encode(args),
        Some(Commands::Seeds(args)) => run_seeds(args),
        None => {
            println!("labelbridge {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Viewer annotations <-> label volumes.");
            println!();
            println!("Run 'labelbridge --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the decode subcommand.
fn run_decode(args: DecodeArgs) -> Result<(), LabelBridgeError> {
    let [depth, rows, cols] = <[usize; 3]>::try_from(args.shape.as_slice()).map_err(|_| {
        LabelBridgeError::InvalidArgument(format!(
            "--shape needs three values Z,X,Y, got {}",
            args.shape.len()
        ))
    })?;

    let opts = SessionOptions {
        seed: args.seed,
        collision_policy: if args.avoid_collisions {
            CollisionPolicy::Avoid
        } else {
            CollisionPolicy::Allow
        },
    };
    let mut session = match &args.session {
        Some(path) if path.exists() => Session::from_state(session::read_session(path)?, &opts)?,
        _ => Session::new(&opts),
    };

    let document = document::read_document(&args.input)?;
    let decode_opts = if args.labels.is_empty() {
        DecodeOptions::default()
    } else {
        DecodeOptions::only(args.labels)
    };

    let mut volume = LabelVolume::zeros((depth, rows, cols));
    let report = session
        .decode(&document, &mut volume, &decode_opts)
        .map_err(|e| at_path(e, &args.input))?;

    volume::write_volume(&args.output, &volume)?;
    if let Some(path) = &args.session {
        session::write_session(path, &session.state())?;
    }

    print_report(&report, args.report)
}

/// Execute the encode subcommand.
fn run_encode(args: EncodeArgs) -> Result<(), LabelBridgeError> {
    let state = session::read_session(&args.session)?;
    let session = Session::from_state(state, &SessionOptions::default())?;
    let volume = volume::read_volume(&args.input)?;

    let (document, report) = match &args.document {
        Some(path) => {
            let mut document = document::read_document(path)?;
            let report = session
                .encode_into(&volume, &mut document)
                .map_err(|e| at_path(e, path))?;
            (document, report)
        }
        None => {
            let [i, j, k] = <[i64; 3]>::try_from(args.position.as_slice()).map_err(|_| {
                LabelBridgeError::InvalidArgument(format!(
                    "--position needs three values I,J,K, got {}",
                    args.position.len()
                ))
            })?;
            let viewport = Viewport {
                position: Position {
                    i: i.into(),
                    j: j.into(),
                    k: k.into(),
                },
                window_center: number("--window-center", args.window_center)?,
                window_width: number("--window-width", args.window_width)?,
                scale: number("--scale", args.scale)?,
                ..Viewport::default()
            };
            session.encode(&volume, &viewport)?
        }
    };

    document::write_document(&args.output, &document)?;
    print_report(&report, args.report)
}

/// Execute the seeds subcommand.
fn run_seeds(args: SeedsArgs) -> Result<(), LabelBridgeError> {
    let state: SessionState = session::read_session(&args.session)?;
    let session = Session::from_state(state, &SessionOptions::default())?;
    let volume = volume::read_volume(&args.input)?;

    let seeds = session.seeds(&volume, &args.label)?;
    volume::write_volume(&args.output, &seeds)?;

    println!(
        "seeds for '{}' written to {}",
        args.label,
        args.output.display()
    );
    Ok(())
}

fn print_report(report: &SessionReport, format: ReportFormat) -> Result<(), LabelBridgeError> {
    match format {
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).map_err(LabelBridgeError::ReportWrite)?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }
    Ok(())
}

/// Whole numbers stay integers so documents keep the viewer's formatting.
fn number(flag: &str, value: f64) -> Result<Number, LabelBridgeError> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Ok(Number::from(value as i64));
    }
    Number::from_f64(value)
        .ok_or_else(|| LabelBridgeError::InvalidArgument(format!("{flag} must be finite")))
}

/// Replaces the placeholder path of core layout errors with the real file.
fn at_path(err: LabelBridgeError, path: &Path) -> LabelBridgeError {
    match err {
        LabelBridgeError::DocumentInvalid { message, .. } => LabelBridgeError::DocumentInvalid {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    }
}
