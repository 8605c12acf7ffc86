//! The stage abstraction shared by the concurrent and sequential paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::job::{Job, StageKind};

use super::decode::LoadStage;
use super::encode::SaveStage;
use super::grayscale::GrayscaleStage;
use super::resize::ResizeStage;

/// One step of the pipeline.
///
/// Implementors only provide [`Stage::apply`]; [`Stage::process`] handles
/// the failure-passthrough rule so every stage treats failed jobs the same way.
pub trait Stage: Send + Sync + 'static {
    /// Which step this is.
    fn kind(&self) -> StageKind;

    /// Transform the job in place. Only called on jobs that have not failed.
    fn apply(&self, job: &mut Job) -> PipelineResult<()>;

    /// Apply the stage to a job, or forward it untouched if it already failed.
    ///
    /// An error from `apply` is recorded on the job, which also drops its payload.
    fn process(&self, mut job: Job) -> Job {
        if job.is_failed() {
            return job;
        }
        if let Err(error) = self.apply(&mut job) {
            tracing::warn!("{} stage failed for {:?}: {}", self.kind(), job.source(), error);
            job.fail(self.kind(), error);
        }
        job
    }
}

/// Take the payload a transform stage needs, or report that none was loaded.
pub(crate) fn require_payload(job: &mut Job, stage: StageKind) -> PipelineResult<DynamicImage> {
    job.take_payload()
        .ok_or_else(|| missing_payload(job.source(), stage))
}

pub(crate) fn missing_payload(path: &Path, stage: StageKind) -> PipelineError {
    PipelineError::MissingPayload {
        path: path.to_path_buf(),
        stage: stage.to_string(),
    }
}

/// Rebuild a job whose stage never returned it, failed with a `Join` error.
pub(crate) fn abandoned_job(
    source: PathBuf,
    destination: PathBuf,
    stage: StageKind,
    message: String,
) -> Job {
    let mut job = Job::new(source.clone(), destination);
    job.fail(
        stage,
        PipelineError::Join {
            path: source,
            stage: stage.to_string(),
            message,
        },
    );
    job
}

/// The four configured stages, shared between runners.
#[derive(Clone)]
pub struct StageSet {
    pub load: Arc<LoadStage>,
    pub resize: Arc<ResizeStage>,
    pub grayscale: Arc<GrayscaleStage>,
    pub save: Arc<SaveStage>,
}

impl StageSet {
    /// Build every stage from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            load: Arc::new(LoadStage::new(config.output.clone())),
            resize: Arc::new(ResizeStage::new(config.resize.clone())),
            grayscale: Arc::new(GrayscaleStage),
            save: Arc::new(SaveStage::new(config.output.jpeg_quality)),
        }
    }

    /// The stages in pipeline order.
    pub fn ordered(&self) -> [&dyn Stage; 4] {
        [
            self.load.as_ref(),
            self.resize.as_ref(),
            self.grayscale.as_ref(),
            self.save.as_ref(),
        ]
    }
}
