//! Pipeline assembly: wires load → resize → grayscale → save.

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::config::{Config, PipelineConfig};
use crate::job::Job;

use super::channel::{bounded_channel, process_blocking, PipelineStage};
use super::stage::StageSet;

/// The concurrent pipeline: one task per stage, linked by bounded channels.
///
/// ```text
/// sources ─▶ load ─▶ resize ─▶ grayscale ─▶ save ─▶ terminal jobs
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: StageSet,
    channels: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_stages(StageSet::new(config), config.pipeline.clone())
    }

    pub fn with_stages(stages: StageSet, channels: PipelineConfig) -> Self {
        Self { stages, channels }
    }

    /// Start all four stages and feed them `sources` in order.
    ///
    /// Returns the receiving end of the save stage. It yields exactly one
    /// job per source, not necessarily in input order, and closes once every
    /// stage has drained. Must be called from within a tokio runtime.
    pub fn run(&self, sources: Vec<PathBuf>) -> mpsc::Receiver<Job> {
        let (loaded_tx, loaded_rx) = bounded_channel(&self.channels);
        let (resized_tx, resized_rx) = bounded_channel(&self.channels);
        let (gray_tx, gray_rx) = bounded_channel(&self.channels);
        let (saved_tx, saved_rx) = bounded_channel(&self.channels);

        tracing::debug!("Starting pipeline for {} sources", sources.len());

        tokio::spawn(PipelineStage::new(self.stages.save.clone(), gray_rx, saved_tx).run());
        tokio::spawn(
            PipelineStage::new(self.stages.grayscale.clone(), resized_rx, gray_tx).run(),
        );
        tokio::spawn(PipelineStage::new(self.stages.resize.clone(), loaded_rx, resized_tx).run());

        let load = self.stages.load.clone();
        tokio::spawn(async move {
            for source in sources {
                let job = process_blocking(&load, load.job_for(&source)).await;
                if loaded_tx.send(job).await.is_err() {
                    tracing::debug!("load stage: downstream closed");
                    break;
                }
            }
        });

        saved_rx
    }

    /// Run the pipeline to completion and collect every terminal job.
    pub async fn run_to_end(&self, sources: Vec<PathBuf>) -> Vec<Job> {
        let mut rx = self.run(sources);
        let mut jobs = Vec::new();
        while let Some(job) = rx.recv().await {
            jobs.push(job);
        }
        jobs
    }
}
