use std::path::{Path, PathBuf};

use crate::shared::constants::FALLBACK_FPS;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes RGB frames into a video-only MPEG-4 Part 2 stream via
/// ffmpeg-next.
///
/// MPEG-4 / YUV420P decodes almost everywhere and is what the audio
/// remux later stream-copies untouched.
pub struct FfmpegWriter {
    output_path: Option<PathBuf>,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output_path: None,
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(1, FALLBACK_FPS),
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn write_err(&self, reason: impl ToString) -> WatermarkError {
        WatermarkError::write(self.output_path.clone().unwrap_or_default(), reason)
    }

    fn open_inner(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), WatermarkError> {
        let err = |reason: String| WatermarkError::write(path, reason);

        ffmpeg_next::init().map_err(|e| err(e.to_string()))?;

        let mut octx = ffmpeg_next::format::output(path).map_err(|e| err(e.to_string()))?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or_else(|| err("MPEG4 encoder not found".to_string()))?;

        let mut ost = octx.add_stream(Some(codec)).map_err(|e| err(e.to_string()))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| err(e.to_string()))?;

        let (num, den) = frame_rate_fraction(metadata.fps);
        let time_base = ffmpeg_next::Rational(den, num);

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(num, den)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .map_err(|e| err(e.to_string()))?;
        ost.set_parameters(&encoder);

        octx.write_header().map_err(|e| err(e.to_string()))?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| err(e.to_string()))?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = time_base;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    /// Moves every packet the encoder has ready into the container.
    fn drain_packets(&mut self) -> Result<(), WatermarkError> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err(self.write_err("FfmpegWriter: not opened"));
        };
        let ost_time_base = octx
            .stream(0)
            .map(|s| s.time_base())
            .unwrap_or(self.time_base);

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.time_base, ost_time_base);
            if let Err(e) = encoded.write_interleaved(octx) {
                return Err(self.write_err(e));
            }
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), WatermarkError> {
        self.output_path = Some(path.to_path_buf());
        let result = self.open_inner(path, metadata);
        if result.is_err() {
            self.octx = None;
            self.encoder = None;
            self.scaler = None;
            // The muxer may already have created the file.
            let _ = std::fs::remove_file(path);
        }
        result
    }

    fn write(&mut self, frame: &Frame) -> Result<(), WatermarkError> {
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err(self.write_err("FfmpegWriter: not opened"));
        };
        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(self.write_err(format!(
                "frame {} is {}x{}x{}, sink expects {}x{}x3",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )));
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let data = rgb_frame.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        let converted = scaler.run(&rgb_frame, &mut yuv_frame);
        yuv_frame.set_pts(Some(self.frame_count as i64));
        let sent = converted.and_then(|()| encoder.send_frame(&yuv_frame));
        if let Err(e) = sent {
            return Err(self.write_err(e));
        }

        self.drain_packets()?;
        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), WatermarkError> {
        if self.encoder.is_none() {
            return Ok(());
        }

        let flushed = match self.encoder.as_mut().map(|enc| enc.send_eof()) {
            Some(Err(e)) => Err(self.write_err(e)),
            _ => self.drain_packets(),
        };
        let finished = flushed.and_then(|()| match self.octx.as_mut().map(|o| o.write_trailer()) {
            Some(Err(e)) => Err(self.write_err(e)),
            _ => Ok(()),
        });

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        if finished.is_ok() {
            if let Some(path) = &self.output_path {
                log::info!(
                    "Video (no audio) written to {} ({} frames)",
                    path.display(),
                    self.frame_count
                );
            }
        }
        finished
    }
}

/// Turns a floating frame rate into `(numerator, denominator)`.
///
/// Whole rates map to `n/1`, NTSC-style rates to `n*1000/1001`, anything
/// else to millisecond precision. Rates that are non-finite or round to
/// zero fall back to 30 fps.
pub fn frame_rate_fraction(fps: f64) -> (i32, i32) {
    if !fps.is_finite() || fps <= 0.0 {
        return (FALLBACK_FPS, 1);
    }

    let whole = fps.round();
    if (fps - whole).abs() < 1e-3 && whole >= 1.0 {
        return (whole as i32, 1);
    }

    let ntsc = (fps * 1.001).round();
    if ntsc >= 1.0 && (fps - ntsc * 1000.0 / 1001.0).abs() < 1e-3 {
        return (ntsc as i32 * 1000, 1001);
    }

    let num = (fps * 1000.0).round() as i32;
    if num <= 0 {
        return (FALLBACK_FPS, 1);
    }
    let g = gcd(num, 1000);
    (num / g, 1000 / g)
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs().max(1)
}
