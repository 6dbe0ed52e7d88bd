use std::path::Path;

use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sink side of the compositor: encodes frames into a video-only file
/// with the source's geometry and frame rate.
pub trait VideoWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), WatermarkError>;

    fn write(&mut self, frame: &Frame) -> Result<(), WatermarkError>;

    /// Flushes the encoder and finalises the container.
    fn close(&mut self) -> Result<(), WatermarkError>;
}
