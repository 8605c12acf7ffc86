//! Save stage: JPEG encoding to the job's destination.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::job::{Job, StageKind};

use super::stage::{missing_payload, Stage};

/// Writes each payload as a JPEG, creating parent directories as needed.
pub struct SaveStage {
    quality: u8,
}

impl SaveStage {
    /// Create a save stage with a JPEG quality of 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` to `path`, creating the parent directory first.
    ///
    /// A partially written file is removed if encoding fails.
    pub fn write_image(&self, path: &Path, image: &DynamicImage) -> PipelineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::CreateDir {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let file = File::create(path).map_err(|e| PipelineError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);

        if let Err(e) = self.encode(&mut writer, image, path) {
            drop(writer);
            let _ = std::fs::remove_file(path);
            return Err(e);
        }

        writer.flush().map_err(|e| PipelineError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn encode<W: Write>(&self, writer: W, image: &DynamicImage, path: &Path) -> PipelineResult<()> {
        let encoder = JpegEncoder::new_with_quality(writer, self.quality);
        let result = match image.color() {
            ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
            // JPEG has no alpha or 16-bit support
            color if color.has_color() => {
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
            }
            _ => DynamicImage::ImageLuma8(image.to_luma8()).write_with_encoder(encoder),
        };
        result.map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl Stage for SaveStage {
    fn kind(&self) -> StageKind {
        StageKind::Save
    }

    fn apply(&self, job: &mut Job) -> PipelineResult<()> {
        let image = job
            .payload()
            .ok_or_else(|| missing_payload(job.source(), StageKind::Save))?;
        self.write_image(job.destination(), image)?;
        tracing::debug!("Saved {:?} -> {:?}", job.source(), job.destination());
        Ok(())
    }
}
