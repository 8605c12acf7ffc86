//! Grayscale stage: per-pixel luminance conversion.

use image::{DynamicImage, GrayImage, Luma, Rgba};

use crate::error::PipelineResult;
use crate::job::{Job, StageKind};

use super::stage::{require_payload, Stage};

/// Converts images to single-channel 8-bit luminance.
pub struct GrayscaleStage;

impl GrayscaleStage {
    /// Convert to `Luma8`, keeping the image bounds.
    pub fn convert(image: &DynamicImage) -> DynamicImage {
        let rgba = image.to_rgba8();
        let gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            Luma([luminance(*rgba.get_pixel(x, y))])
        });
        DynamicImage::ImageLuma8(gray)
    }
}

impl Stage for GrayscaleStage {
    fn kind(&self) -> StageKind {
        StageKind::Grayscale
    }

    fn apply(&self, job: &mut Job) -> PipelineResult<()> {
        let image = require_payload(job, StageKind::Grayscale)?;
        job.set_payload(Self::convert(&image));
        Ok(())
    }
}

/// Rec. 601 luma of an alpha-premultiplied pixel, in 16.16 fixed point.
///
/// The weights (19595, 38470, 7471) sum to 65536, so white stays 255.
pub fn luminance(Rgba([r, g, b, a]): Rgba<u8>) -> u8 {
    let premultiply = |c: u8| u32::from(c) * u32::from(a) / 255;
    let y = 19595 * premultiply(r) + 38470 * premultiply(g) + 7471 * premultiply(b) + (1 << 15);
    (y >> 16) as u8
}
