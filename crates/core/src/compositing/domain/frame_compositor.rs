use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::placement::Placement;

/// Applies the watermark to a single frame.
///
/// Implementations modify the frame in place (`&mut Frame`); the caller
/// keeps ownership and hands the same frame on to the writer.
pub trait FrameCompositor {
    fn composite(&self, frame: &mut Frame, placement: &Placement) -> Result<(), WatermarkError>;
}
