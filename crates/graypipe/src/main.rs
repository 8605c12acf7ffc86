//! graypipe CLI - resize and grayscale a batch of images through a staged pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Process images/image1.jpeg .. image4.jpeg concurrently
//! graypipe run
//!
//! # Same batch, one image at a time
//! graypipe run --concurrent false
//!
//! # Every image under a directory, as JSON lines
//! graypipe run --dir ./photos/images --discover --format jsonl
//!
//! # View configuration
//! graypipe config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// graypipe - batch resize and grayscale images through a staged pipeline.
#[derive(Parser, Debug)]
#[command(name = "graypipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "GRAYPIPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, resize, grayscale and save a batch of images
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) if path.exists() => graypipe_core::Config::load_from(path)?,
        Some(path) => {
            eprintln!(
                "Warning: Config file {} does not exist. Using default configuration.",
                path.display()
            );
            graypipe_core::Config::default()
        }
        None => graypipe_core::Config::load().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `graypipe config path`."
            );
            graypipe_core::Config::default()
        }),
    };
    logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("graypipe v{}", graypipe_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => {
            cli::config::execute(args, &config, cli.config.as_deref()).await
        }
    }
}
