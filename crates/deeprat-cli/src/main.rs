//! deeprat - inspect and decode planar image sources
//!
//! Sources are described in YAML (see `deeprat_io::source`).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deeprat_core::{ChannelSet, Rect};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "deeprat")]
#[command(author, version, about = "Inspect and decode flat and deep planar image sources")]
#[command(long_about = "
Decodes planar image sources (color, depth and accumulated-opacity planes)
into caller-chosen channel sets. Deep sources carry a variable number of
depth-ordered samples per pixel.

Examples:
  deeprat info shadow.yaml                        # Planes, channel map, source info
  deeprat flat beauty.yaml --channels r,g,b,a      # Decode the whole image
  deeprat flat beauty.yaml --box 0,0,16,16 --scanline
  deeprat deep shadow.yaml --channels a,front,back --discrete
  deeprat deep shadow.yaml --composite --premult --json
  deeprat -v deep shadow.yaml --config decode.yaml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Show planes, channel map and source info
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Decode a flat source
    #[command(visible_alias = "f")]
    Flat(DecodeArgs),

    /// Decode a deep source
    #[command(visible_alias = "d")]
    Deep(DecodeArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Source description(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Map luminance to red only
    #[arg(long)]
    raw: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DecodeArgs {
    /// Source description
    input: PathBuf,

    /// Box to decode as x,y,w,h (default: whole image)
    #[arg(long = "box", value_name = "X,Y,W,H")]
    rect: Option<Rect>,

    /// Channels to decode, comma-separated
    #[arg(short, long, default_value = "r,g,b,a")]
    channels: ChannelSet,

    /// Decode config file (YAML); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the scanline strategy instead of raster
    #[arg(long)]
    scanline: bool,

    /// Do not flip rows
    #[arg(long)]
    no_reverse: bool,

    /// Read samples as stored
    #[arg(long)]
    raw: bool,

    /// Back depth equals front depth
    #[arg(long)]
    discrete: bool,

    /// Premultiply color by alpha
    #[arg(long)]
    premult: bool,

    /// Input is already accumulated (skip uncompositing)
    #[arg(long)]
    composite: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "deeprat_io=debug,deeprat=debug",
        _ => "deeprat_io=trace,deeprat=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
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
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Flat(args) => commands::flat::run(args, cli.verbose),
        Commands::Deep(args) => commands::deep::run(args, cli.verbose),
    }
}
