//! `touristctl`: drive the Tourist pin-photo engine from a terminal.
#![allow(missing_docs)]

mod bootstrap;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tourist_core::model::{MarkerId, SlotId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "touristctl", version)]
#[command(about = "Place map markers and fill their albums with nearby Flickr photos")]
struct Cli {
    /// Path to a tourist.toml configuration file
    #[arg(long, global = true, env = "TOURIST_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Seed for photo selection, for reproducible albums
    #[arg(long, global = true, env = "TOURIST_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drop a marker at the given coordinates
    Place {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// List all markers in creation order
    List,
    /// Look up the marker stored at exactly these coordinates
    Find {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Open a marker's album and fetch photos for every pending slot
    Open { marker_id: MarkerId },
    /// Discard and refetch every photo of a complete album
    Refresh { marker_id: MarkerId },
    /// Discard the photo of a single slot
    Clear { slot_id: SlotId },
    /// Delete a marker together with its album and cached photos
    Delete { marker_id: MarkerId },
    /// Show or store the last viewed map region
    #[command(subcommand)]
    Viewport(ViewportCommand),
}

#[derive(Debug, Subcommand)]
enum ViewportCommand {
    /// Print the stored viewport as JSON
    Show,
    /// Store a viewport
    Set {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Visible latitude span in degrees
        #[arg(long)]
        lat_delta: f64,
        /// Visible longitude span in degrees
        #[arg(long)]
        lon_delta: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = bootstrap::connect(&cli).await?;
    let result = commands::run(&app, cli.command).await;
    app.close().await;
    result
}
