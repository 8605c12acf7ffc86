//! Batch driver: runs a source list in either mode and tallies the results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::job::{Job, JobState, StageKind};
use crate::pipeline::stage::missing_payload;
use crate::pipeline::{Pipeline, SequentialRunner, StageSet};

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One task per stage, connected by channels
    Concurrent,
    /// One item at a time through all stages
    Sequential,
}

impl ExecutionMode {
    pub fn from_concurrent_flag(concurrent: bool) -> Self {
        if concurrent {
            ExecutionMode::Concurrent
        } else {
            ExecutionMode::Sequential
        }
    }

    /// Upper-case label, e.g. `CONCURRENT`.
    pub fn label(self) -> &'static str {
        match self {
            ExecutionMode::Concurrent => "CONCURRENT",
            ExecutionMode::Sequential => "SEQUENTIAL",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Concurrent => write!(f, "Concurrent"),
            ExecutionMode::Sequential => write!(f, "Sequential"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Reportable result for one terminal job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: OutcomeStatus,

    /// Stage that failed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

impl From<Job> for Outcome {
    fn from(job: Job) -> Self {
        let (source, destination, state) = job.into_parts();
        match state {
            JobState::Failed(failure) => Outcome {
                source,
                destination,
                status: OutcomeStatus::Failure,
                stage: Some(failure.stage),
                error: Some(failure.error.to_string()),
            },
            // Save keeps the payload, so only Ready counts as done
            JobState::Ready(_) => Outcome {
                source,
                destination,
                status: OutcomeStatus::Success,
                stage: None,
                error: None,
            },
            JobState::Pending => {
                tracing::error!("{:?} reached the end of the pipeline without an image", source);
                let error = missing_payload(&source, StageKind::Save);
                Outcome {
                    source,
                    destination,
                    status: OutcomeStatus::Failure,
                    stage: Some(StageKind::Save),
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

/// Aggregate counts and timing for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub mode: ExecutionMode,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Selects a runner, consumes every terminal job once, and reports.
pub struct Driver {
    pipeline: Pipeline,
    sequential: SequentialRunner,
}

impl Driver {
    pub fn new(config: &Config) -> Self {
        let stages = StageSet::new(config);
        Self {
            pipeline: Pipeline::with_stages(stages.clone(), config.pipeline.clone()),
            sequential: SequentialRunner::with_stages(stages, config.pipeline.clone()),
        }
    }

    /// Process `sources` and call `on_outcome` once per item as it finishes.
    ///
    /// Individual failures never abort the batch. The elapsed time covers
    /// the whole batch, including reporting.
    pub async fn run<F>(
        &self,
        sources: Vec<PathBuf>,
        mode: ExecutionMode,
        mut on_outcome: F,
    ) -> BatchSummary
    where
        F: FnMut(&Outcome),
    {
        let start = Instant::now();
        let expected = sources.len();
        tracing::info!("Processing {} images ({} mode)", expected, mode);

        let mut jobs = match mode {
            ExecutionMode::Concurrent => self.pipeline.run(sources),
            ExecutionMode::Sequential => self.sequential.clone().spawn(sources),
        };

        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(job) = jobs.recv().await {
            let outcome = Outcome::from(job);
            if outcome.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            on_outcome(&outcome);
        }

        if succeeded + failed != expected {
            tracing::error!(
                "Expected {} outcomes but received {}",
                expected,
                succeeded + failed
            );
        }

        let summary = BatchSummary {
            mode,
            succeeded,
            failed,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "{} processing completed: {} successes, {} failures in {:?}",
            mode,
            summary.succeeded,
            summary.failed,
            summary.elapsed
        );
        summary
    }

    /// Run and collect outcomes in the order they were reported.
    pub async fn run_collect(
        &self,
        sources: Vec<PathBuf>,
        mode: ExecutionMode,
    ) -> (BatchSummary, Vec<Outcome>) {
        let mut outcomes = Vec::new();
        let summary = self
            .run(sources, mode, |outcome| outcomes.push(outcome.clone()))
            .await;
        (summary, outcomes)
    }
}
