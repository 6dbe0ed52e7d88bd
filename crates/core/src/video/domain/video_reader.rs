use std::path::Path;

use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Source side of the compositor: decodes frames one at a time.
///
/// Implementations hide codec and container details; the pipeline only
/// sees [`Frame`] and [`VideoMetadata`].
pub trait VideoReader {
    /// Opens a video and reports its geometry and frame rate.
    ///
    /// Fails with [`WatermarkError::ResourceNotFound`] when the file is
    /// missing and [`WatermarkError::UnsupportedFormat`] when it cannot be
    /// demuxed or decoded.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, WatermarkError>;

    /// Returns an iterator over frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, WatermarkError>> + '_>;

    /// Releases any resources held by the reader. Safe to call twice.
    fn close(&mut self);
}
