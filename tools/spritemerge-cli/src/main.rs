//! spritemerge CLI — Combine sprite regions into a single PNG.
//!
//! Usage:
//!   spritemerge horizontal [REGIONS..]   Lay regions out left to right
//!   spritemerge vertical [REGIONS..]     Stack regions top to bottom
//!   spritemerge overlay [REGIONS..]      Center and alpha-blend regions
//!   spritemerge init <NAME>              Write a new combine manifest
//!   spritemerge validate <MANIFEST>      Check a combine manifest
//!   spritemerge info <MANIFEST>          Show what a manifest combines
//!
//! A region is `PATH` (the whole image) or `PATH@x,y,width,height`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spritemerge_common::config::AppConfig;
use spritemerge_sprite_model::LayoutMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "spritemerge",
    about = "Combine sprite regions into a single lossless sprite",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the three combine commands.
#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    /// Regions to combine, in order: PATH or PATH@x,y,width,height
    pub regions: Vec<String>,

    /// Read regions from a combine manifest (appended before REGIONS)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output directory (defaults to the configured one)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Never change source readability; rely on offscreen readback instead
    #[arg(long)]
    pub no_toggle: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine regions left to right, top-aligned
    Horizontal(CombineArgs),

    /// Combine regions top to bottom, left-aligned
    Vertical(CombineArgs),

    /// Center regions and alpha-blend them, later regions on top
    Overlay(CombineArgs),

    /// Write a new combine manifest
    Init {
        /// Manifest name
        name: String,

        /// Layout mode: horizontal|vertical|overlay
        #[arg(long, default_value = "horizontal")]
        mode: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Regions to list, relative to the output directory
        regions: Vec<String>,
    },

    /// Validate a combine manifest
    Validate {
        /// Path to the manifest file
        path: PathBuf,
    },

    /// Show manifest information
    Info {
        /// Path to the manifest file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    spritemerge_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Horizontal(args) => commands::combine::run(LayoutMode::Horizontal, args, &config),
        Commands::Vertical(args) => commands::combine::run(LayoutMode::Vertical, args, &config),
        Commands::Overlay(args) => commands::combine::run(LayoutMode::Overlay, args, &config),
        Commands::Init {
            name,
            mode,
            output,
            regions,
        } => commands::init::run(name, mode, output, regions),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
    }
}
