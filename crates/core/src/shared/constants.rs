/// Distance in pixels between the watermark and the bottom/right frame edges.
pub const DEFAULT_MARGIN: u32 = 35;

/// Watermark width as a fraction of the video frame width.
pub const DEFAULT_WATERMARK_FRACTION: f64 = 0.205;

/// Video-only intermediate written before the audio is reattached.
pub const DEFAULT_INTERMEDIATE_PATH: &str = ".__wm_temp__.mp4";

/// Frame rate used when the container does not report a usable one.
pub const FALLBACK_FPS: i32 = 30;

pub const FFMPEG_BINARY: &str = "ffmpeg";
