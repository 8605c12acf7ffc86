//! Sequential runner: the same four stages, one item at a time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::config::{Config, PipelineConfig};
use crate::job::Job;

use super::channel::bounded_channel;
use super::stage::{abandoned_job, Stage, StageSet};

/// Runs load → resize → grayscale → save for each source before moving
/// on to the next, so results arrive strictly in input order.
#[derive(Clone)]
pub struct SequentialRunner {
    stages: StageSet,
    channels: PipelineConfig,
}

impl SequentialRunner {
    pub fn new(config: &Config) -> Self {
        Self::with_stages(StageSet::new(config), config.pipeline.clone())
    }

    pub fn with_stages(stages: StageSet, channels: PipelineConfig) -> Self {
        Self { stages, channels }
    }

    /// Process a single source to completion.
    ///
    /// Stops at the first failing stage; the remaining stages never run.
    pub fn run_one(&self, source: &Path) -> Job {
        run_stages(self.stages.load.job_for(source), &self.stages.ordered())
    }

    /// Lazily process `sources` in order.
    pub fn iter<'a>(&'a self, sources: &'a [PathBuf]) -> impl Iterator<Item = Job> + 'a {
        sources.iter().map(move |source| self.run_one(source))
    }

    /// Process every source and collect the results in input order.
    pub fn run(&self, sources: &[PathBuf]) -> Vec<Job> {
        self.iter(sources).collect()
    }

    /// Run on a single blocking thread, streaming finished jobs.
    ///
    /// Gives the sequential path the same shape as [`super::Pipeline::run`].
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, sources: Vec<PathBuf>) -> mpsc::Receiver<Job> {
        let (tx, rx) = bounded_channel(&self.channels);
        tokio::task::spawn_blocking(move || {
            for job in self.iter(&sources) {
                if tx.blocking_send(job).is_err() {
                    tracing::debug!("sequential runner: receiver closed");
                    break;
                }
            }
        });
        rx
    }
}

/// Run `job` through `stages` in order, stopping at the first failure.
///
/// A panicking stage fails this job only; the caller's loop carries on
/// with the next source.
fn run_stages(mut job: Job, stages: &[&dyn Stage]) -> Job {
    for stage in stages {
        let source = job.source().to_path_buf();
        let destination = job.destination().to_path_buf();

        job = match panic::catch_unwind(AssertUnwindSafe(move || stage.process(job))) {
            Ok(job) => job,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("{} stage panicked for {:?}: {}", stage.kind(), source, message);
                abandoned_job(source, destination, stage.kind(), message)
            }
        };
        if job.is_failed() {
            break;
        }
    }
    job
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
