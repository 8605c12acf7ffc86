//! Load stage: read an image file and decode it with format detection.

use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use crate::config::OutputConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::job::{derive_destination, Job, StageKind};

use super::stage::Stage;

/// Creates jobs from source paths and decodes their images.
pub struct LoadStage {
    output: OutputConfig,
}

impl LoadStage {
    /// Create a load stage; `output` supplies the destination path rewrite.
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Create the pending job for a source path.
    pub fn job_for(&self, source: &Path) -> Job {
        let destination =
            derive_destination(source, &self.output.path_segment, &self.output.replacement);
        Job::new(source, destination)
    }

    /// Read and decode an image from disk.
    pub fn read_image(path: &Path) -> PipelineResult<DynamicImage> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        Self::decode_bytes(bytes, path)
    }

    /// Decode an in-memory image, detecting the format from content and
    /// falling back to the file extension.
    pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> PipelineResult<DynamicImage> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        if reader.format().is_none() {
            let format =
                ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: path
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                })?;
            reader.set_format(format);
        }

        reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl Stage for LoadStage {
    fn kind(&self) -> StageKind {
        StageKind::Load
    }

    fn apply(&self, job: &mut Job) -> PipelineResult<()> {
        if job.destination() == job.source() {
            return Err(PipelineError::DestinationIsSource(job.source().to_path_buf()));
        }
        let image = Self::read_image(job.source())?;
        tracing::debug!(
            "Loaded {:?} ({}x{})",
            job.source(),
            image.width(),
            image.height()
        );
        job.set_payload(image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::new_rgb8(width, height).save(&path).unwrap();
        path
    }

    #[test]
    fn test_job_for_derives_destination() {
        let stage = LoadStage::new(OutputConfig::default());
        let job = stage.job_for(Path::new("images/image1.jpeg"));
        assert_eq!(job.source(), Path::new("images/image1.jpeg"));
        assert_eq!(job.destination(), Path::new("images/output/image1.jpeg"));
        assert!(job.payload().is_none());
    }

    #[test]
    fn test_read_missing_file() {
        let err = LoadStage::read_image(Path::new("does/not/exist.jpeg")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_read_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), "a.png", 30, 20);
        let image = LoadStage::read_image(&path).unwrap();
        assert_eq!((image.width(), image.height()), (30, 20));
    }

    #[test]
    fn test_format_detected_by_content() {
        // A PNG saved under a .jpg name still decodes.
        let dir = tempfile::tempdir().unwrap();
        let png = fixture(dir.path(), "real.png", 8, 8);
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        let image = LoadStage::read_image(&misnamed).unwrap();
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpeg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = LoadStage::read_image(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_unknown_extension_and_content() {
        let err = LoadStage::decode_bytes(b"??".to_vec(), Path::new("blob.xyz")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_apply_sets_payload() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        let path = fixture(&images, "b.png", 12, 6);
        let stage = LoadStage::new(OutputConfig::default());

        let job = stage.process(stage.job_for(&path));
        assert_eq!(job.payload().map(|img| img.width()), Some(12));
        assert_eq!(job.destination(), images.join("output/b.png"));
    }

    #[test]
    fn test_source_outside_segment_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), "cat.png", 80, 40);
        let before = std::fs::read(&path).unwrap();
        let stage = LoadStage::new(OutputConfig::default());

        let job = stage.process(stage.job_for(&path));
        let failure = job.failure().unwrap();
        assert_eq!(failure.stage, StageKind::Load);
        assert!(matches!(failure.error, PipelineError::DestinationIsSource(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_apply_missing_file_fails_at_load() {
        let stage = LoadStage::new(OutputConfig::default());
        let job = stage.process(stage.job_for(Path::new("images/nope.jpeg")));
        let failure = job.failure().unwrap();
        assert_eq!(failure.stage, StageKind::Load);
        assert!(job.payload().is_none());
    }
}
