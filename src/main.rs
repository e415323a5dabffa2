// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "tactile-picture")]
#[command(about = "Turn a color image and an encoded depth image into a 3D relief")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: platform config dir, else built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the relief and write it as STL
    Export {
        /// Depth-encoded image
        depth: PathBuf,

        /// Color image of the same size
        color: PathBuf,

        /// Output file or directory (default: ~/Downloads/picture3D.stl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write binary STL instead of ASCII
        #[arg(short, long)]
        binary: bool,
    },

    /// Render one frame offscreen and save it as PNG
    Snapshot {
        /// Depth-encoded image
        depth: PathBuf,

        /// Color image of the same size
        color: PathBuf,

        /// Output PNG (default: relief_TIMESTAMP.png in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the frame loop, refreshing when the input files change
    ///
    /// Commands on stdin: `refresh`, `export [PATH]`, `quit`.
    View {
        /// Depth-encoded image
        depth: PathBuf,

        /// Color image of the same size
        color: PathBuf,

        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Write binary STL on export
        #[arg(short, long)]
        binary: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=tactile_picture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = tactile_picture::Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            depth,
            color,
            output,
            binary,
        } => cli::export(&config, &depth, &color, output, binary),
        Commands::Snapshot {
            depth,
            color,
            output,
        } => cli::snapshot(&config, &depth, &color, output),
        Commands::View {
            depth,
            color,
            fps,
            binary,
        } => cli::view(config, cli.config, depth, color, fps, binary),
    }
}
