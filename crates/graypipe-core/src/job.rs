//! The per-item unit of work that flows through the pipeline.
//!
//! A [`Job`] is owned by exactly one stage at a time; ownership moves with
//! it through each channel hop. Its payload and failure live in a single
//! [`JobState`], so a Job can never carry both an image and an error.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// The four pipeline steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Load,
    Resize,
    Grayscale,
    Save,
}

impl StageKind {
    /// All stages in pipeline order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Load,
        StageKind::Resize,
        StageKind::Grayscale,
        StageKind::Save,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Load => "load",
            StageKind::Resize => "resize",
            StageKind::Grayscale => "grayscale",
            StageKind::Save => "save",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first failure recorded on a job, and where it happened.
#[derive(Debug)]
pub struct JobFailure {
    pub stage: StageKind,
    pub error: PipelineError,
}

/// Payload-or-failure state of a job.
#[derive(Debug, Default)]
pub enum JobState {
    /// Not loaded yet
    #[default]
    Pending,
    /// Holds the current image
    Ready(DynamicImage),
    /// Failed; terminal
    Failed(JobFailure),
}

/// One input image on its way through the pipeline.
#[derive(Debug)]
pub struct Job {
    source: PathBuf,
    destination: PathBuf,
    state: JobState,
}

impl Job {
    /// Create a pending job. Source and destination are fixed for its lifetime.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            state: JobState::Pending,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// The current image, if the job is loaded and has not failed.
    pub fn payload(&self) -> Option<&DynamicImage> {
        match &self.state {
            JobState::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.state {
            JobState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, JobState::Failed(_))
    }

    /// Take the payload out for transformation, leaving the job pending.
    ///
    /// Callers are expected to follow with [`Job::set_payload`] or
    /// [`Job::fail`].
    pub fn take_payload(&mut self) -> Option<DynamicImage> {
        match std::mem::take(&mut self.state) {
            JobState::Ready(image) => Some(image),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Replace the payload. Ignored once the job has failed.
    pub fn set_payload(&mut self, image: DynamicImage) {
        if !self.is_failed() {
            self.state = JobState::Ready(image);
        }
    }

    /// Record a failure and drop the payload.
    ///
    /// Only the first failure sticks; later calls are no-ops.
    pub fn fail(&mut self, stage: StageKind, error: PipelineError) {
        if self.is_failed() {
            tracing::debug!(
                "Ignoring {} failure for already-failed {:?}: {}",
                stage,
                self.source,
                error
            );
            return;
        }
        self.state = JobState::Failed(JobFailure { stage, error });
    }

    /// Split into source, destination and the final state.
    pub fn into_parts(self) -> (PathBuf, PathBuf, JobState) {
        (self.source, self.destination, self.state)
    }
}

/// Derive an output path by replacing the first occurrence of `segment`
/// with `replacement` anywhere in the source path string.
///
/// This is a plain substring replacement, not a path-prefix match:
/// `myimages/a.jpg` becomes `myimages/output/a.jpg` with the default
/// segments. A source that doesn't contain `segment`, or isn't valid
/// UTF-8, maps to itself; the load stage refuses such jobs.
pub fn derive_destination(source: &Path, segment: &str, replacement: &str) -> PathBuf {
    let Some(source_str) = source.to_str() else {
        tracing::warn!("Source {:?} is not valid UTF-8; it will not be processed", source);
        return source.to_path_buf();
    };
    if segment.is_empty() || !source_str.contains(segment) {
        tracing::warn!(
            "Source {:?} does not contain {:?}; it will not be processed",
            source,
            segment
        );
        return source.to_path_buf();
    }
    PathBuf::from(source_str.replacen(segment, replacement, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("images/a.jpeg", "images/output/a.jpeg")
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = job();
        assert!(matches!(job.state(), JobState::Pending));
        assert!(job.payload().is_none());
        assert!(job.failure().is_none());
        assert_eq!(job.source(), Path::new("images/a.jpeg"));
        assert_eq!(job.destination(), Path::new("images/output/a.jpeg"));
    }

    #[test]
    fn test_set_and_take_payload() {
        let mut job = job();
        job.set_payload(DynamicImage::new_rgb8(4, 2));
        assert_eq!(job.payload().map(|img| img.width()), Some(4));

        let image = job.take_payload().unwrap();
        assert_eq!(image.height(), 2);
        assert!(job.payload().is_none());
        assert!(!job.is_failed());
    }

    #[test]
    fn test_fail_clears_payload() {
        let mut job = job();
        job.set_payload(DynamicImage::new_rgb8(4, 4));
        job.fail(
            StageKind::Resize,
            PipelineError::Resize {
                path: PathBuf::from("images/a.jpeg"),
                message: "boom".to_string(),
            },
        );
        assert!(job.payload().is_none());
        assert_eq!(job.failure().unwrap().stage, StageKind::Resize);
    }

    #[test]
    fn test_failure_is_monotonic() {
        let mut job = job();
        job.fail(
            StageKind::Load,
            PipelineError::FileNotFound(PathBuf::from("images/a.jpeg")),
        );
        job.fail(
            StageKind::Save,
            PipelineError::Write {
                path: PathBuf::from("images/output/a.jpeg"),
                message: "disk full".to_string(),
            },
        );
        job.set_payload(DynamicImage::new_rgb8(1, 1));

        let failure = job.failure().unwrap();
        assert_eq!(failure.stage, StageKind::Load);
        assert!(matches!(failure.error, PipelineError::FileNotFound(_)));
        assert!(job.payload().is_none());
        assert!(job.take_payload().is_none());
        assert!(job.is_failed());
    }

    #[test]
    fn test_derive_destination_default_segments() {
        let dest = derive_destination(Path::new("images/image1.jpeg"), "images/", "images/output/");
        assert_eq!(dest, PathBuf::from("images/output/image1.jpeg"));
    }

    #[test]
    fn test_derive_destination_nested_dir() {
        let dest = derive_destination(
            Path::new("/data/images/2024/cat.png"),
            "images/",
            "images/output/",
        );
        assert_eq!(dest, PathBuf::from("/data/images/output/2024/cat.png"));
    }

    #[test]
    fn test_derive_destination_matches_inside_component() {
        // Substring semantics: the segment need not start a path component.
        let dest = derive_destination(Path::new("myimages/a.jpg"), "images/", "images/output/");
        assert_eq!(dest, PathBuf::from("myimages/output/a.jpg"));
    }

    #[test]
    fn test_derive_destination_first_occurrence_only() {
        let dest = derive_destination(
            Path::new("images/images/a.jpg"),
            "images/",
            "images/output/",
        );
        assert_eq!(dest, PathBuf::from("images/output/images/a.jpg"));
    }

    #[test]
    fn test_derive_destination_without_segment() {
        let dest = derive_destination(Path::new("photos/a.jpg"), "images/", "images/output/");
        assert_eq!(dest, PathBuf::from("photos/a.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_derive_destination_non_utf8_is_not_rewritten() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"images/caf\xe9.jpg"));
        let dest = derive_destination(source, "images/", "images/output/");
        assert_eq!(dest, source);
        assert!(!dest.to_string_lossy().contains("output"));
    }

    #[test]
    fn test_stage_kind_order() {
        let names: Vec<_> = StageKind::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["load", "resize", "grayscale", "save"]);
    }
}
