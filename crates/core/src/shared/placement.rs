use crate::shared::error::WatermarkError;

/// Target rectangle for the watermark inside a frame, in pixel coordinates.
///
/// `x2`/`y2` are exclusive. Coordinates are signed so a rectangle that
/// would hang off the frame can be represented and rejected explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Placement {
    /// Anchors a `wm_width x wm_height` rectangle to the bottom-right
    /// corner, inset by `margin` from both edges. No clamping.
    pub fn bottom_right(
        frame_width: u32,
        frame_height: u32,
        wm_width: u32,
        wm_height: u32,
        margin: u32,
    ) -> Self {
        let x2 = i64::from(frame_width) - i64::from(margin);
        let y2 = i64::from(frame_height) - i64::from(margin);
        Self {
            x1: x2 - i64::from(wm_width),
            y1: y2 - i64::from(wm_height),
            x2,
            y2,
        }
    }

    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x1 >= 0
            && self.y1 >= 0
            && self.x2 <= i64::from(frame_width)
            && self.y2 <= i64::from(frame_height)
    }

    /// Computes the bottom-right placement and rejects it when it leaves
    /// the frame.
    pub fn checked_bottom_right(
        frame_width: u32,
        frame_height: u32,
        wm_width: u32,
        wm_height: u32,
        margin: u32,
    ) -> Result<Self, WatermarkError> {
        let placement = Self::bottom_right(frame_width, frame_height, wm_width, wm_height, margin);
        if placement.fits_within(frame_width, frame_height) {
            Ok(placement)
        } else {
            Err(WatermarkError::WatermarkTooLarge {
                wm_width,
                wm_height,
                margin,
                frame_width,
                frame_height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_bottom_right_matches_scenario_geometry() {
        let p = Placement::bottom_right(100, 100, 40, 20, 5);
        assert_eq!(
            p,
            Placement {
                x1: 55,
                y1: 75,
                x2: 95,
                y2: 95
            }
        );
        assert_eq!(p.width(), 40);
        assert_eq!(p.height(), 20);
    }

    #[test]
    fn test_bottom_right_hd_defaults() {
        // 1920 * 0.205 = 393 wide logo, 35px margin
        let p = Placement::bottom_right(1920, 1080, 393, 120, 35);
        assert_eq!(p.x2, 1885);
        assert_eq!(p.x1, 1492);
        assert_eq!(p.y2, 1045);
        assert_eq!(p.y1, 925);
    }

    #[test]
    fn test_oversized_rectangle_goes_negative() {
        let p = Placement::bottom_right(100, 100, 120, 10, 5);
        assert_eq!(p.x1, -25);
        assert!(!p.fits_within(100, 100));
    }

    #[rstest]
    #[case(100, 100, 40, 20, 5, true)]
    #[case(100, 100, 95, 95, 5, true)]
    #[case(100, 100, 96, 20, 5, false)]
    #[case(100, 100, 20, 96, 5, false)]
    #[case(100, 100, 10, 10, 101, false)]
    #[case(64, 48, 64, 48, 0, true)]
    fn test_fits_within(
        #[case] fw: u32,
        #[case] fh: u32,
        #[case] ww: u32,
        #[case] wh: u32,
        #[case] margin: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(
            Placement::bottom_right(fw, fh, ww, wh, margin).fits_within(fw, fh),
            expected
        );
    }

    #[test]
    fn test_checked_rejects_oversized() {
        let err = Placement::checked_bottom_right(100, 100, 120, 10, 5).unwrap_err();
        assert!(matches!(
            err,
            WatermarkError::WatermarkTooLarge {
                wm_width: 120,
                frame_width: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_checked_accepts_fitting() {
        let p = Placement::checked_bottom_right(100, 100, 40, 20, 5).unwrap();
        assert_eq!(p.x1, 55);
    }
}
