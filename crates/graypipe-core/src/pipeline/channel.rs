//! Bounded channels and the per-stage task loop.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::PipelineConfig;
use crate::job::Job;

use super::stage::{abandoned_job, Stage};

/// Create a bounded channel pair with the configured buffer size.
///
/// With the default size of 1 a sender waits until the next stage has
/// taken the previous job, so a slow stage throttles everything upstream.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// Run one job through `stage` on the blocking pool.
///
/// Failed jobs are forwarded without leaving the task. If the blocking task
/// panics the job is rebuilt from its paths and marked failed, so the
/// one-out-per-one-in guarantee still holds.
pub async fn process_blocking<S: Stage>(stage: &Arc<S>, job: Job) -> Job {
    if job.is_failed() {
        return job;
    }

    let source = job.source().to_path_buf();
    let destination = job.destination().to_path_buf();
    let worker = Arc::clone(stage);

    match tokio::task::spawn_blocking(move || worker.process(job)).await {
        Ok(job) => job,
        Err(e) => {
            tracing::error!("{} task for {:?} did not complete: {}", stage.kind(), source, e);
            abandoned_job(source, destination, stage.kind(), e.to_string())
        }
    }
}

/// A pipeline stage bound to its input and output channels.
///
/// Handles one job at a time: receive, process, send. When the input
/// closes the stage returns, dropping its sender and closing the next hop.
pub struct PipelineStage<S> {
    stage: Arc<S>,
    input: mpsc::Receiver<Job>,
    output: mpsc::Sender<Job>,
}

impl<S: Stage> PipelineStage<S> {
    /// Create a new pipeline stage.
    pub fn new(stage: Arc<S>, input: mpsc::Receiver<Job>, output: mpsc::Sender<Job>) -> Self {
        Self {
            stage,
            input,
            output,
        }
    }

    /// Drain the input, forwarding one job per job received.
    ///
    /// Returns the number of jobs forwarded.
    pub async fn run(mut self) -> usize {
        let mut forwarded = 0;
        while let Some(job) = self.input.recv().await {
            let job = process_blocking(&self.stage, job).await;
            if self.output.send(job).await.is_err() {
                // Downstream closed, stop processing
                tracing::debug!("{} stage: downstream closed", self.stage.kind());
                break;
            }
            forwarded += 1;
        }
        tracing::trace!("{} stage finished after {} jobs", self.stage.kind(), forwarded);
        forwarded
    }
}
