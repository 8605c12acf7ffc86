//! Resize stage: bound the longer edge while keeping the aspect ratio.

use image::{DynamicImage, GenericImageView};
use std::path::Path;

use crate::config::ResizeConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::job::{Job, StageKind};

use super::stage::{require_payload, Stage};

/// Scales every image so its longer edge equals `max_dimension`.
pub struct ResizeStage {
    config: ResizeConfig,
}

impl ResizeStage {
    pub fn new(config: ResizeConfig) -> Self {
        Self { config }
    }

    /// Resample `image` to the bounded dimensions.
    pub fn resize(&self, image: &DynamicImage, path: &Path) -> PipelineResult<DynamicImage> {
        let (width, height) = image.dimensions();
        let (new_width, new_height) =
            target_dimensions(width, height, self.config.max_dimension).ok_or_else(|| {
                PipelineError::Resize {
                    path: path.to_path_buf(),
                    message: format!("cannot resize a {}x{} image", width, height),
                }
            })?;

        tracing::trace!(
            "Resizing {:?}: {}x{} -> {}x{}",
            path,
            width,
            height,
            new_width,
            new_height
        );
        Ok(image.resize_exact(new_width, new_height, self.config.filter.filter_type()))
    }
}

impl Stage for ResizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Resize
    }

    fn apply(&self, job: &mut Job) -> PipelineResult<()> {
        let image = require_payload(job, StageKind::Resize)?;
        let resized = self.resize(&image, job.source())?;
        job.set_payload(resized);
        Ok(())
    }
}

/// Dimensions whose longer edge is `max_dimension`, the shorter edge scaled
/// proportionally and rounded down, both at least 1.
///
/// Square inputs map to `max_dimension` on both edges. Returns `None` for
/// a zero-sized input or a zero maximum.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || max_dimension == 0 {
        return None;
    }

    let scale = |side: u32, longer: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(longer);
        (scaled as u32).max(1)
    };

    if width > height {
        Some((max_dimension, scale(height, width)))
    } else {
        Some((scale(width, height), max_dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResizeFilter;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                128,
            ])
        }))
    }

    #[test]
    fn test_target_dimensions_square() {
        assert_eq!(target_dimensions(100, 100, 500), Some((500, 500)));
        assert_eq!(target_dimensions(50, 50, 500), Some((500, 500)));
    }

    #[test]
    fn test_target_dimensions_landscape() {
        assert_eq!(target_dimensions(800, 400, 500), Some((500, 250)));
    }

    #[test]
    fn test_target_dimensions_portrait() {
        assert_eq!(target_dimensions(400, 800, 500), Some((250, 500)));
    }

    #[test]
    fn test_target_dimensions_rounds_down() {
        // 333 * 500 / 1000 = 166.5
        assert_eq!(target_dimensions(1000, 333, 500), Some((500, 166)));
        assert_eq!(target_dimensions(333, 1000, 500), Some((166, 500)));
    }

    #[test]
    fn test_target_dimensions_floor_of_one() {
        assert_eq!(target_dimensions(10_000, 1, 500), Some((500, 1)));
        assert_eq!(target_dimensions(1, 10_000, 500), Some((1, 500)));
    }

    #[test]
    fn test_target_dimensions_zero() {
        assert_eq!(target_dimensions(0, 10, 500), None);
        assert_eq!(target_dimensions(10, 0, 500), None);
        assert_eq!(target_dimensions(10, 10, 0), None);
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let stage = ResizeStage::new(ResizeConfig::default());
        for (width, height) in [(100, 100), (800, 400), (400, 800), (50, 50), (640, 480)] {
            let resized = stage.resize(&gradient(width, height), Path::new("t.png")).unwrap();
            let (new_width, new_height) = resized.dimensions();

            assert_eq!(new_width.max(new_height), 500, "{width}x{height}");
            let original_ratio = width as f64 / height as f64;
            let new_ratio = new_width as f64 / new_height as f64;
            assert!(
                (original_ratio - new_ratio).abs() <= 0.1,
                "ratio {original_ratio:.2} became {new_ratio:.2}"
            );
        }
    }

    #[test]
    fn test_resize_with_fast_filter() {
        let stage = ResizeStage::new(ResizeConfig {
            max_dimension: 64,
            filter: ResizeFilter::Nearest,
        });
        let resized = stage.resize(&gradient(256, 128), Path::new("t.png")).unwrap();
        assert_eq!(resized.dimensions(), (64, 32));
    }

    #[test]
    fn test_resize_zero_sized_image_fails() {
        let stage = ResizeStage::new(ResizeConfig::default());
        let err = stage
            .resize(&DynamicImage::new_rgb8(0, 0), Path::new("empty.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Resize { .. }));
    }

    #[test]
    fn test_stage_replaces_payload() {
        let stage = ResizeStage::new(ResizeConfig::default());
        let mut job = Job::new("images/a.png", "images/output/a.png");
        job.set_payload(gradient(800, 400));

        let job = stage.process(job);
        assert_eq!(job.payload().map(|img| img.dimensions()), Some((500, 250)));
    }

    #[test]
    fn test_stage_fails_on_pending_job() {
        let stage = ResizeStage::new(ResizeConfig::default());
        let job = stage.process(Job::new("images/a.png", "images/output/a.png"));
        let failure = job.failure().unwrap();
        assert_eq!(failure.stage, StageKind::Resize);
        assert!(matches!(failure.error, PipelineError::MissingPayload { .. }));
    }
}
