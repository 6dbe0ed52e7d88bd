use std::path::Path;

use crate::shared::error::WatermarkError;

/// Combines a video-only file with the audio of the original input.
///
/// The video stream of `video_only` and the first audio stream of
/// `original` are stream-copied into `output` without re-encoding.
pub trait AudioRemuxer {
    fn remux(
        &self,
        video_only: &Path,
        original: &Path,
        output: &Path,
    ) -> Result<(), WatermarkError>;
}
