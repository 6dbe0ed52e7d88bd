use std::path::PathBuf;

use crate::shared::constants::{
    DEFAULT_INTERMEDIATE_PATH, DEFAULT_MARGIN, DEFAULT_WATERMARK_FRACTION,
};
use crate::shared::error::WatermarkError;

/// Tunables for one watermarking run.
#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkConfig {
    /// Pixels between the watermark and the bottom/right edges.
    pub margin: u32,
    /// Watermark width as a fraction of the frame width, in `(0, 1]`.
    pub fraction: f64,
    /// Where the video-only intermediate is written before remuxing.
    pub intermediate_path: PathBuf,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            fraction: DEFAULT_WATERMARK_FRACTION,
            intermediate_path: PathBuf::from(DEFAULT_INTERMEDIATE_PATH),
        }
    }
}

impl WatermarkConfig {
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !self.fraction.is_finite() || self.fraction <= 0.0 || self.fraction > 1.0 {
            return Err(WatermarkError::InvalidConfig(format!(
                "watermark fraction must be in (0, 1], got {}",
                self.fraction
            )));
        }
        if self.intermediate_path.as_os_str().is_empty() {
            return Err(WatermarkError::InvalidConfig(
                "intermediate path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
