//! The `graypipe run` command: process a batch of images.

pub mod types;

pub use types::OutputFormat;

use clap::{ArgAction, Args};
use graypipe_core::job::derive_destination;
use graypipe_core::{BatchSummary, Config, Driver, ExecutionMode, FileDiscovery, Outcome};
use std::io::{self, Write};
use std::path::PathBuf;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Images to process (defaults to the configured file list under --dir)
    pub paths: Vec<PathBuf>,

    /// Use concurrent processing (true) or sequential processing (false)
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub concurrent: bool,

    /// Directory containing images
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Process every supported image under --dir instead of the fixed list
    #[arg(long, conflicts_with = "paths")]
    pub discover: bool,

    /// Length of the longer edge after resizing
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// JPEG quality for saved images
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Per-item output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the run command.
///
/// Item failures are reported but never turn into an error; only setup
/// problems (such as invalid overrides) do.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    run_batch(args, config, &mut std::io::stdout()).await?;
    Ok(())
}

/// Process the batch and write the report to `out`.
///
/// The header and summary are written even when there is nothing to do.
async fn run_batch<W: Write>(
    args: RunArgs,
    mut config: Config,
    out: &mut W,
) -> anyhow::Result<BatchSummary> {
    apply_overrides(&args, &mut config)?;

    let sources = resolve_sources(&args, &config);
    if sources.is_empty() {
        tracing::warn!("No images to process in {:?}", config.input_dir());
    }

    let mode = ExecutionMode::from_concurrent_flag(args.concurrent);
    writeln!(out, "Processing {} images...", sources.len())?;
    writeln!(out, "Mode: {}", mode.label())?;

    let driver = Driver::new(&config);
    let format = args.format;
    let summary = driver
        .run(sources, mode, |outcome| {
            let written = render_outcome(outcome, format)
                .map_err(io::Error::from)
                .and_then(|line| writeln!(out, "{line}"));
            if let Err(e) = written {
                tracing::error!("Failed to report outcome for {:?}: {}", outcome.source, e);
            }
        })
        .await;

    for line in summary_lines(&summary) {
        writeln!(out, "{line}")?;
    }
    Ok(summary)
}

/// Apply CLI overrides on top of the loaded config and re-validate.
fn apply_overrides(args: &RunArgs, config: &mut Config) -> anyhow::Result<()> {
    if let Some(dir) = &args.dir {
        config.input.dir = dir.clone();
    }
    if let Some(max_dimension) = args.max_dimension {
        config.resize.max_dimension = max_dimension;
    }
    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
    config.validate()?;
    Ok(())
}

/// Explicit paths win, then discovery, then the configured file list.
fn resolve_sources(args: &RunArgs, config: &Config) -> Vec<PathBuf> {
    if !args.paths.is_empty() {
        return args.paths.clone();
    }
    if !args.discover {
        return config.default_sources();
    }

    let dir = config.input_dir();
    // Skip previous results when the output tree lives under the input dir.
    let dir_with_slash = PathBuf::from(format!("{}/", dir.to_string_lossy().trim_end_matches('/')));
    let output_dir = derive_destination(
        &dir_with_slash,
        &config.output.path_segment,
        &config.output.replacement,
    );
    let exclude = (output_dir != dir_with_slash).then_some(output_dir);

    let files = FileDiscovery::new(config.input.clone()).discover(&dir, exclude.as_deref());
    tracing::info!("Found {} image(s) in {:?}", files.len(), dir);
    files
}

/// One report line for an outcome.
fn render_outcome(outcome: &Outcome, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Jsonl => serde_json::to_string(outcome),
        OutputFormat::Text => Ok(match &outcome.error {
            None => format!(
                "Successfully processed {} -> {}",
                outcome.source.display(),
                outcome.destination.display()
            ),
            Some(error) => format!("Failed to process {}: {}", outcome.source.display(), error),
        }),
    }
}

fn summary_lines(summary: &BatchSummary) -> [String; 2] {
    [
        format!(
            "{} processing completed: {} successes, {} failures",
            summary.mode, summary.succeeded, summary.failed
        ),
        format!("Total processing time: {:?}", summary.elapsed),
    ]
}
