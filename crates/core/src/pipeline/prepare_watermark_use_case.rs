use std::path::Path;

use crate::shared::error::WatermarkError;
use crate::watermark::domain::watermark_image::WatermarkImage;
use crate::watermark::domain::watermark_loader::WatermarkLoader;

/// Watermark preparation: load, then strip transparent padding.
///
/// Scaling waits until the video width is known, see
/// [`WatermarkImage::scale_to_fraction`].
pub struct PrepareWatermarkUseCase {
    loader: Box<dyn WatermarkLoader>,
}

impl PrepareWatermarkUseCase {
    pub fn new(loader: Box<dyn WatermarkLoader>) -> Self {
        Self { loader }
    }

    pub fn execute(&self, path: &Path) -> Result<WatermarkImage, WatermarkError> {
        let image = self.loader.load(path)?;
        let (w0, h0) = (image.width(), image.height());

        let cropped = image.crop_to_opaque_bounds();
        if (cropped.width(), cropped.height()) == (w0, h0) {
            log::debug!("Watermark {w0}x{h0} has no transparent border");
        } else {
            log::info!(
                "Watermark cropped from {w0}x{h0} to {}x{}",
                cropped.width(),
                cropped.height()
            );
        }
        Ok(cropped)
    }
}
