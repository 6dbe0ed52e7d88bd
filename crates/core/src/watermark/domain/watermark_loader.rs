use std::path::Path;

use crate::shared::error::WatermarkError;
use crate::watermark::domain::watermark_image::WatermarkImage;

/// Decodes a watermark image file into RGBA pixels.
pub trait WatermarkLoader {
    /// Fails with [`WatermarkError::ResourceNotFound`] when the file is
    /// missing or cannot be decoded.
    fn load(&self, path: &Path) -> Result<WatermarkImage, WatermarkError>;
}
