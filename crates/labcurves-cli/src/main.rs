//! labcurves - Lab curve grading from the command line
//!
//! Runs the LabCurves pipeline in job mode on whole images and edits
//! `.dlc` curve files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use labcurves_core::LabView;
use labcurves_curve::CurveChannel;
use labcurves_ops::{SaturationKey, SaturationMode};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "labcurves")]
#[command(author, version, about = "Lab curve grading for 16-bit images")]
#[command(long_about = "
Applies L, a, b and saturation curves to images in CIE Lab.

Examples:
  labcurves process in.tif -o out.tif --curve-l contrast.dlc
  labcurves process in.png --in-place --settings job.yaml
  labcurves process in.tif -o out.tif --curve-sat boost.dlc --sat-key lightness
  labcurves batch -i 'shots/*.tif' -o graded --settings job.yaml
  labcurves curve new s.dlc 0,0 0.25,0.2 0.75,0.8 1,1
  labcurves curve info s.dlc
  labcurves curve dump s.dlc -o s.dat
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one image at full resolution
    #[command(visible_alias = "p")]
    Process(ProcessArgs),

    /// Grade every image matching a pattern
    Batch(BatchArgs),

    /// Create and inspect curve files
    #[command(subcommand)]
    Curve(CurveCommand),
}

/// Curve and pipeline options shared by `process` and `batch`.
#[derive(Args, Clone)]
struct GradeArgs {
    /// YAML settings file; the flags below override it
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// L curve file
    #[arg(long = "curve-l")]
    curve_l: Option<PathBuf>,

    /// a curve file
    #[arg(long = "curve-a")]
    curve_a: Option<PathBuf>,

    /// b curve file
    #[arg(long = "curve-b")]
    curve_b: Option<PathBuf>,

    /// Saturation curve file
    #[arg(long = "curve-sat")]
    curve_sat: Option<PathBuf>,

    /// Saturation scaling
    #[arg(long = "sat-mode", value_enum)]
    sat_mode: Option<SatModeArg>,

    /// Saturation curve input
    #[arg(long = "sat-key", value_enum)]
    sat_key: Option<SatKeyArg>,
}

#[derive(Args)]
struct ProcessArgs {
    /// Input image (PNG or TIFF)
    input: PathBuf,

    /// Output image; format from the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite the input when no output is given
    #[arg(long)]
    in_place: bool,

    #[command(flatten)]
    grade: GradeArgs,

    /// Also write a binned sRGB preview PNG
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Channels shown in the preview
    #[arg(long, value_enum)]
    view: Option<ViewArg>,
}

#[derive(Args)]
struct BatchArgs {
    /// Input pattern (glob)
    #[arg(short, long)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Output format extension (png, tif)
    #[arg(short, long)]
    format: Option<String>,

    #[command(flatten)]
    grade: GradeArgs,
}

#[derive(Subcommand)]
enum CurveCommand {
    /// Write a curve file from x,y points
    New(CurveNewArgs),

    /// Print anchors and table samples
    Info(CurveInfoArgs),

    /// Write table samples for plotting
    Dump(CurveDumpArgs),
}

#[derive(Args)]
struct CurveNewArgs {
    /// Output curve file
    output: PathBuf,

    /// Anchors as x,y pairs in [0, 1], x increasing
    #[arg(required = true, num_args = 2..)]
    points: Vec<String>,

    /// Piecewise linear instead of spline
    #[arg(long)]
    linear: bool,

    /// Text added to the file header
    #[arg(short, long)]
    description: Option<String>,

    /// Channel the curve is meant for
    #[arg(short, long, value_enum, default_value = "l")]
    channel: ChannelArg,
}

#[derive(Args)]
struct CurveInfoArgs {
    /// Curve file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Number of table samples to print
    #[arg(short, long, default_value = "9")]
    samples: usize,
}

#[derive(Args)]
struct CurveDumpArgs {
    /// Curve file
    input: PathBuf,

    /// Output data file
    #[arg(short, long)]
    output: PathBuf,

    /// Input levels per line; both columns are divided by it
    #[arg(short, long, default_value = "256")]
    scale: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum SatModeArg {
    Adaptive,
    Absolute,
}

impl From<SatModeArg> for SaturationMode {
    fn from(arg: SatModeArg) -> Self {
        match arg {
            SatModeArg::Adaptive => SaturationMode::Adaptive,
            SatModeArg::Absolute => SaturationMode::Absolute,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SatKeyArg {
    Hue,
    Lightness,
}

impl From<SatKeyArg> for SaturationKey {
    fn from(arg: SatKeyArg) -> Self {
        match arg {
            SatKeyArg::Hue => SaturationKey::Hue,
            SatKeyArg::Lightness => SaturationKey::Lightness,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Lab,
    L,
    A,
    B,
}

impl From<ViewArg> for LabView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Lab => LabView::Lab,
            ViewArg::L => LabView::L,
            ViewArg::A => LabView::A,
            ViewArg::B => LabView::B,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    L,
    A,
    B,
    #[value(alias = "sat")]
    Saturation,
}

impl From<ChannelArg> for CurveChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::L => CurveChannel::Lightness,
            ChannelArg::A => CurveChannel::ChromaA,
            ChannelArg::B => CurveChannel::ChromaB,
            ChannelArg::Saturation => CurveChannel::Saturation,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "labcurves=warn",
        1 => "labcurves=debug",
        _ => "labcurves=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Process(args) => commands::process::run(args, cli.verbose),
        Commands::Batch(args) => commands::batch::run(args, cli.verbose),
        Commands::Curve(CurveCommand::New(args)) => commands::curve::run_new(args, cli.verbose),
        Commands::Curve(CurveCommand::Info(args)) => commands::curve::run_info(args),
        Commands::Curve(CurveCommand::Dump(args)) => commands::curve::run_dump(args, cli.verbose),
    }
}
