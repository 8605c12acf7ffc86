//! graypipe core - batch resize and grayscale conversion.
//!
//! Images flow through four stages, each running as its own task and
//! handing jobs to the next over a bounded channel:
//!
//! ```text
//! path → Load → Resize (500px) → Grayscale → Save (JPEG q90) → Outcome
//! ```
//!
//! A failure at any stage is recorded on the job and carried through the
//! remaining stages untouched, so every input produces exactly one outcome.
//! The same stages can also be run one item at a time with
//! [`pipeline::SequentialRunner`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use graypipe_core::{Config, Driver, ExecutionMode};
//!
//! #[tokio::main]
//! async fn main() -> graypipe_core::Result<()> {
//!     let config = Config::load()?;
//!     let driver = Driver::new(&config);
//!
//!     let summary = driver
//!         .run(config.default_sources(), ExecutionMode::Concurrent, |outcome| {
//!             println!("{:?}", outcome);
//!         })
//!         .await;
//!     println!("{} ok, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod driver;
pub mod error;
pub mod job;
pub mod pipeline;

// Re-exports for convenient access
pub use config::Config;
pub use driver::{BatchSummary, Driver, ExecutionMode, Outcome, OutcomeStatus};
pub use error::{ConfigError, GraypipeError, PipelineError, PipelineResult, Result};
pub use job::{Job, JobState, StageKind};
pub use pipeline::{FileDiscovery, Pipeline, SequentialRunner, Stage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
