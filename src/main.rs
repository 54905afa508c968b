// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use nutricam::capture::HandoffMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "nutricam")]
#[command(about = "Scan barcodes and recognize food for the nutrition tracker")]
#[command(version = nutricam::constants::app_info::version())]
struct Cli {
    /// Nutrition server base URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// How results reach the food log: in-page or navigate
    #[arg(long, global = true)]
    handoff: Option<HandoffMode>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Scan a barcode and look up the product
    Scan {
        /// Camera index to use (from 'nutricam list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Decode from an image file instead of a camera
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Look up a barcode typed in by hand
    Lookup {
        /// Barcode digits (at least 8)
        barcode: String,
    },

    /// Photograph food and ask the server what it is
    Recognize {
        /// Camera index to use (from 'nutricam list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Use an image file instead of a camera
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Keep the uploaded snapshot in this directory
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },

    /// Search foods by name
    Search {
        /// Food name (at least 2 characters)
        query: String,
    },

    /// Show tips for better food recognition
    Tips,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=nutricam=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref(), cli.server, cli.handoff)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match cli.command {
            Commands::List => cli::list_cameras(&config),
            Commands::Scan { camera, image } => cli::scan_barcode(&config, camera, image).await,
            Commands::Lookup { barcode } => cli::lookup_barcode(&config, &barcode).await,
            Commands::Recognize {
                camera,
                image,
                save_dir,
            } => cli::recognize_food(&config, camera, image, save_dir).await,
            Commands::Search { query } => cli::search_food(&config, &query).await,
            Commands::Tips => cli::show_tips(),
        }
    })
}
