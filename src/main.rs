// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "media-picker")]
#[command(about = "Pick photos from a library or the camera")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the media in a directory, newest first
    List {
        /// Library directory
        dir: PathBuf,

        /// Include videos
        #[arg(long)]
        video: bool,
    },

    /// Run a scripted picker session and save the picked images
    Pick {
        /// Library directory
        dir: PathBuf,

        /// Session configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Grid indices to tap, in order (from 'media-picker list')
        #[arg(short, long, num_args = 1..)]
        select: Vec<usize>,

        /// Number of shutter presses
        #[arg(long, default_value = "0")]
        shutter: usize,

        /// Output directory (default: ~/Pictures/picker)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=media_picker=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { dir, video } => cli::list_assets(dir, video),
        Commands::Pick {
            dir,
            config,
            select,
            shutter,
            output,
        } => cli::pick(dir, config, select, shutter, output),
    }
}
