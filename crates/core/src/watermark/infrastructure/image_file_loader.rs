use std::path::Path;

use crate::shared::error::WatermarkError;
use crate::watermark::domain::watermark_image::WatermarkImage;
use crate::watermark::domain::watermark_loader::WatermarkLoader;

/// Loads watermarks with the `image` crate.
///
/// Sources without an alpha channel come back fully opaque.
pub struct ImageFileLoader;

impl WatermarkLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<WatermarkImage, WatermarkError> {
        let decoded = image::open(path).map_err(|e| WatermarkError::ResourceNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !decoded.color().has_alpha() {
            log::debug!("{} has no alpha channel, treating as opaque", path.display());
        }

        Ok(WatermarkImage::new(decoded.to_rgba8()))
    }
}
