use ndarray::{s, Axis, Zip};

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::placement::Placement;
use crate::watermark::domain::watermark_image::ScaledWatermark;

/// CPU compositor blending a prepared watermark with
/// `out = alpha * wm + (1 - alpha) * frame`.
pub struct AlphaBlendCompositor {
    watermark: ScaledWatermark,
}

impl AlphaBlendCompositor {
    pub fn new(watermark: ScaledWatermark) -> Self {
        Self { watermark }
    }

    pub fn watermark(&self) -> &ScaledWatermark {
        &self.watermark
    }
}

impl FrameCompositor for AlphaBlendCompositor {
    fn composite(&self, frame: &mut Frame, placement: &Placement) -> Result<(), WatermarkError> {
        blend_region(frame, placement, &self.watermark)
    }
}

/// Blends one channel value. Computed in `f32` and truncated, so alpha 1
/// yields `wm` exactly and alpha 0 yields `base` exactly.
#[inline]
pub fn blend_channel(wm: u8, base: u8, alpha: f32) -> u8 {
    (alpha * f32::from(wm) + (1.0 - alpha) * f32::from(base)) as u8
}

/// Blends `watermark` into the `placement` rectangle of `frame`, in place.
///
/// The rectangle must match the watermark size and lie fully inside the
/// frame.
pub fn blend_region(
    frame: &mut Frame,
    placement: &Placement,
    watermark: &ScaledWatermark,
) -> Result<(), WatermarkError> {
    if frame.channels() != 3 {
        return Err(WatermarkError::InvalidConfig(format!(
            "expected 3-channel frames, got {}",
            frame.channels()
        )));
    }
    if placement.width() != i64::from(watermark.width())
        || placement.height() != i64::from(watermark.height())
    {
        return Err(WatermarkError::InvalidConfig(format!(
            "placement {}x{} does not match watermark {}x{}",
            placement.width(),
            placement.height(),
            watermark.width(),
            watermark.height()
        )));
    }
    if !placement.fits_within(frame.width(), frame.height()) {
        return Err(WatermarkError::WatermarkTooLarge {
            wm_width: watermark.width(),
            wm_height: watermark.height(),
            margin: (i64::from(frame.width()) - placement.x2).max(0) as u32,
            frame_width: frame.width(),
            frame_height: frame.height(),
        });
    }

    let (x1, y1) = (placement.x1 as usize, placement.y1 as usize);
    let (x2, y2) = (placement.x2 as usize, placement.y2 as usize);

    let mut pixels = frame.as_ndarray_mut();
    let mut roi = pixels.slice_mut(s![y1..y2, x1..x2, ..]);

    Zip::from(roi.lanes_mut(Axis(2)))
        .and(watermark.color().lanes(Axis(2)))
        .and(watermark.alpha())
        .for_each(|mut px, wm_px, &alpha| {
            for c in 0..3 {
                px[c] = blend_channel(wm_px[c], px[c], alpha);
            }
        });

    Ok(())
}
