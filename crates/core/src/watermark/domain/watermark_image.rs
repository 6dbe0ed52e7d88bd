use image::imageops::{self, FilterType};
use image::RgbaImage;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::shared::error::WatermarkError;

/// Resampling filter for watermark rescaling. The triangle filter widens
/// with the scale factor, so shrinking averages over the covered area.
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// A decoded watermark with 8-bit colour and alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkImage {
    pixels: RgbaImage,
}

impl WatermarkImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Bounding box `(x, y, width, height)` of every pixel with alpha > 0,
    /// or `None` when the image is fully transparent.
    pub fn opaque_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, px) in self.pixels.enumerate_pixels() {
            if px[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x1, y1, x2, y2)) => (x1.min(x), y1.min(y), x2.max(x), y2.max(y)),
            });
        }
        bounds.map(|(x1, y1, x2, y2)| (x1, y1, x2 - x1 + 1, y2 - y1 + 1))
    }

    /// Strips fully transparent padding. A fully transparent image is
    /// returned as-is.
    pub fn crop_to_opaque_bounds(self) -> Self {
        match self.opaque_bounds() {
            Some((x, y, w, h)) if (w, h) != (self.width(), self.height()) => Self {
                pixels: imageops::crop_imm(&self.pixels, x, y, w, h).to_image(),
            },
            _ => self,
        }
    }

    /// Resizes so the width becomes `floor(frame_width * fraction)`,
    /// keeping the aspect ratio. Returns the image untouched when the
    /// width already matches.
    pub fn resize_to_fraction(
        &self,
        frame_width: u32,
        fraction: f64,
    ) -> Result<Self, WatermarkError> {
        let target_width = (f64::from(frame_width) * fraction).floor();
        if !(target_width >= 1.0) {
            return Err(WatermarkError::InvalidConfig(format!(
                "watermark width {target_width} ({fraction} of {frame_width}px) must be at least 1px"
            )));
        }
        if self.width() == 0 || self.height() == 0 {
            return Err(WatermarkError::InvalidConfig(
                "watermark image has no pixels".to_string(),
            ));
        }
        let target_width = target_width as u32;
        let scale = f64::from(target_width) / f64::from(self.width());
        if scale == 1.0 {
            return Ok(self.clone());
        }
        let target_height = ((f64::from(self.height()) * scale).round() as u32).max(1);
        Ok(Self {
            pixels: imageops::resize(&self.pixels, target_width, target_height, RESAMPLE_FILTER),
        })
    }

    /// Resizes to the frame fraction and splits colour from normalised alpha.
    pub fn scale_to_fraction(
        &self,
        frame_width: u32,
        fraction: f64,
    ) -> Result<ScaledWatermark, WatermarkError> {
        Ok(ScaledWatermark::from(self.resize_to_fraction(frame_width, fraction)?))
    }
}

/// Watermark ready for blending: integer colour plus `[0, 1]` alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledWatermark {
    color: Array3<u8>,
    alpha: Array2<f32>,
}

impl ScaledWatermark {
    /// Builds from raw planes. `color` is `height x width x 3`, `alpha` is
    /// `height x width`.
    pub fn from_planes(color: Array3<u8>, alpha: Array2<f32>) -> Result<Self, WatermarkError> {
        let (h, w, c) = color.dim();
        if c != 3 || alpha.dim() != (h, w) {
            return Err(WatermarkError::InvalidConfig(format!(
                "colour plane {h}x{w}x{c} does not match alpha plane {:?}",
                alpha.dim()
            )));
        }
        if alpha.iter().any(|a| !(0.0..=1.0).contains(a)) {
            return Err(WatermarkError::InvalidConfig(
                "alpha values must lie in [0, 1]".to_string(),
            ));
        }
        Ok(Self { color, alpha })
    }

    pub fn width(&self) -> u32 {
        self.color.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.color.dim().0 as u32
    }

    pub fn color(&self) -> ArrayView3<'_, u8> {
        self.color.view()
    }

    pub fn alpha(&self) -> ArrayView2<'_, f32> {
        self.alpha.view()
    }
}

impl From<WatermarkImage> for ScaledWatermark {
    fn from(image: WatermarkImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let mut color = Array3::<u8>::zeros((h, w, 3));
        let mut alpha = Array2::<f32>::zeros((h, w));
        for (x, y, px) in image.pixels.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                color[[y, x, c]] = px[c];
            }
            alpha[[y, x]] = (f64::from(px[3]) / 255.0) as f32;
        }
        Self { color, alpha }
    }
}
