use std::path::Path;

use crate::compositing::infrastructure::alpha_blend_compositor::AlphaBlendCompositor;
use crate::pipeline::composite_video_use_case::CompositeVideoUseCase;
use crate::pipeline::prepare_watermark_use_case::PrepareWatermarkUseCase;
use crate::remux::domain::audio_remuxer::AudioRemuxer;
use crate::shared::config::WatermarkConfig;
use crate::shared::error::WatermarkError;
use crate::shared::paths::same_file;
use crate::shared::placement::Placement;
use crate::shared::scoped_file::ScopedFile;
use crate::watermark::domain::watermark_image::WatermarkImage;

/// End-to-end run: prepare the watermark, composite every frame into a
/// video-only intermediate, then remux the original audio back in.
///
/// The intermediate is removed on every exit path.
pub struct WatermarkVideoUseCase {
    preparer: PrepareWatermarkUseCase,
    compositing: CompositeVideoUseCase,
    remuxer: Box<dyn AudioRemuxer>,
    config: WatermarkConfig,
}

impl WatermarkVideoUseCase {
    pub fn new(
        preparer: PrepareWatermarkUseCase,
        compositing: CompositeVideoUseCase,
        remuxer: Box<dyn AudioRemuxer>,
        config: WatermarkConfig,
    ) -> Self {
        Self {
            preparer,
            compositing,
            remuxer,
            config,
        }
    }

    /// Returns the number of frames written.
    pub fn execute(
        &mut self,
        input_path: &Path,
        watermark_path: &Path,
        output_path: &Path,
    ) -> Result<usize, WatermarkError> {
        self.config.validate()?;
        let intermediate_path = self.config.intermediate_path.clone();
        check_distinct(input_path, output_path, &intermediate_path)?;

        // The logo is checked before the video is touched.
        let logo = self.preparer.execute(watermark_path)?;

        let metadata = self.compositing.open_source(input_path)?;

        let (compositor, placement) = match self.place(&logo, metadata.width, metadata.height) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.compositing.close();
                return Err(e);
            }
        };

        let intermediate = ScopedFile::new(intermediate_path);
        log::info!("Writing intermediate to {}", intermediate.path().display());
        let frames = self
            .compositing
            .run(&compositor, &placement, intermediate.path())?;
        log::info!("Composited {frames} frames");

        log::info!("Restoring audio from {}", input_path.display());
        self.remuxer
            .remux(intermediate.path(), input_path, output_path)?;
        log::info!("Output written to {}", output_path.display());

        Ok(frames)
    }

    fn place(
        &self,
        logo: &WatermarkImage,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(AlphaBlendCompositor, Placement), WatermarkError> {
        let scaled = logo.scale_to_fraction(frame_width, self.config.fraction)?;
        log::info!(
            "Watermark scaled to {}x{} for {frame_width}x{frame_height} video",
            scaled.width(),
            scaled.height()
        );
        let placement = Placement::checked_bottom_right(
            frame_width,
            frame_height,
            scaled.width(),
            scaled.height(),
            self.config.margin,
        )?;
        Ok((AlphaBlendCompositor::new(scaled), placement))
    }
}

/// Input, output and intermediate must be three different files, however
/// they are spelled.
fn check_distinct(
    input: &Path,
    output: &Path,
    intermediate: &Path,
) -> Result<(), WatermarkError> {
    let collision = |a: &str, b: &str, path: &Path| {
        WatermarkError::InvalidConfig(format!("{a} and {b} are the same file: {}", path.display()))
    };
    if same_file(input, output) {
        return Err(collision("input", "output", output));
    }
    if same_file(intermediate, input) {
        return Err(collision("intermediate", "input", intermediate));
    }
    if same_file(intermediate, output) {
        return Err(collision("intermediate", "output", intermediate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::composite_video_use_case::tests::{StubReader, StubWriter};
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::watermark::domain::watermark_loader::WatermarkLoader;
    use crate::watermark::infrastructure::image_file_loader::ImageFileLoader;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubLoader {
        image: RgbaImage,
    }

    impl WatermarkLoader for StubLoader {
        fn load(&self, _path: &Path) -> Result<WatermarkImage, WatermarkError> {
            Ok(WatermarkImage::new(self.image.clone()))
        }
    }

    type RemuxCall = (PathBuf, PathBuf, PathBuf);

    #[derive(Default)]
    struct StubRemuxer {
        calls: Arc<Mutex<Vec<RemuxCall>>>,
        intermediate_existed: Arc<Mutex<bool>>,
        fail: bool,
    }

    impl AudioRemuxer for StubRemuxer {
        fn remux(
            &self,
            video_only: &Path,
            original: &Path,
            output: &Path,
        ) -> Result<(), WatermarkError> {
            *self.intermediate_existed.lock().unwrap() = video_only.exists();
            self.calls.lock().unwrap().push((
                video_only.to_path_buf(),
                original.to_path_buf(),
                output.to_path_buf(),
            ));
            if self.fail {
                return Err(WatermarkError::ExternalTool {
                    tool: "ffmpeg".to_string(),
                    reason: "exit status 1".to_string(),
                });
            }
            Ok(())
        }
    }

    // --- Helpers ---

    fn red_logo() -> RgbaImage {
        RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]))
    }

    fn black_frames(count: usize) -> Vec<Frame> {
        (0..count).map(|i| Frame::filled(100, 100, [0, 0, 0], i)).collect()
    }

    fn config(dir: &Path) -> WatermarkConfig {
        WatermarkConfig {
            margin: 5,
            fraction: 0.4,
            intermediate_path: dir.join("intermediate.mp4"),
        }
    }

    fn build(
        loader: Box<dyn WatermarkLoader>,
        reader: StubReader,
        writer: StubWriter,
        remuxer: StubRemuxer,
        config: WatermarkConfig,
    ) -> WatermarkVideoUseCase {
        WatermarkVideoUseCase::new(
            PrepareWatermarkUseCase::new(loader),
            CompositeVideoUseCase::new(
                Box::new(reader),
                Box::new(writer),
                Box::new(NullPipelineLogger),
            ),
            Box::new(remuxer),
            config,
        )
    }

    // --- Tests ---

    #[test]
    fn test_red_logo_on_black_frames() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StubWriter {
            touch: true,
            ..StubWriter::default()
        };
        let written = writer.written.clone();
        let remuxer = StubRemuxer::default();
        let calls = remuxer.calls.clone();
        let existed = remuxer.intermediate_existed.clone();
        let cfg = config(dir.path());
        let intermediate = cfg.intermediate_path.clone();

        let mut uc = build(
            Box::new(StubLoader { image: red_logo() }),
            StubReader::new(black_frames(10), 100, 100),
            writer,
            remuxer,
            cfg,
        );
        let frames = uc
            .execute(
                Path::new("in.mp4"),
                Path::new("logo.png"),
                Path::new("out.mp4"),
            )
            .unwrap();

        assert_eq!(frames, 10);
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 10);
        for frame in written.iter() {
            for y in 0..100 {
                for x in 0..100 {
                    let inside = (55..95).contains(&x) && (75..95).contains(&y);
                    let expected: &[u8] = if inside { &[255, 0, 0] } else { &[0, 0, 0] };
                    assert_eq!(frame.pixel(x, y), expected, "pixel ({x}, {y})");
                }
            }
        }

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                intermediate.clone(),
                PathBuf::from("in.mp4"),
                PathBuf::from("out.mp4")
            )]
        );
        assert!(*existed.lock().unwrap());
        assert!(!intermediate.exists());
    }

    #[test]
    fn test_bordered_logo_is_cropped_before_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let mut logo = RgbaImage::from_pixel(70, 70, Rgba([0, 0, 0, 0]));
        for y in 10..60 {
            for x in 10..60 {
                logo.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let writer = StubWriter::default();
        let written = writer.written.clone();

        // fraction 0.5 of a 100 px frame scales the 50x50 crop 1:1.
        let cfg = WatermarkConfig {
            margin: 0,
            fraction: 0.5,
            intermediate_path: dir.path().join("tmp.mp4"),
        };
        let mut uc = build(
            Box::new(StubLoader { image: logo }),
            StubReader::new(black_frames(1), 100, 100),
            writer,
            StubRemuxer::default(),
            cfg,
        );
        uc.execute(Path::new("in.mp4"), Path::new("logo.png"), Path::new("out.mp4"))
            .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written[0].pixel(50, 50), &[0, 0, 255]);
        assert_eq!(written[0].pixel(99, 99), &[0, 0, 255]);
        assert_eq!(written[0].pixel(49, 99), &[0, 0, 0]);
    }

    #[test]
    fn test_missing_watermark_never_opens_video() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StubReader::new(black_frames(3), 100, 100);
        let opened = reader.opened.clone();
        let remuxer = StubRemuxer::default();
        let calls = remuxer.calls.clone();

        let mut uc = build(
            Box::new(ImageFileLoader),
            reader,
            StubWriter::default(),
            remuxer,
            config(dir.path()),
        );
        let err = uc
            .execute(
                Path::new("in.mp4"),
                &dir.path().join("missing.png"),
                Path::new("out.mp4"),
            )
            .unwrap_err();

        assert!(matches!(err, WatermarkError::ResourceNotFound { .. }));
        assert_eq!(*opened.lock().unwrap(), 0);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sink_failure_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StubWriter {
            fail_open: true,
            ..StubWriter::default()
        };
        let written = writer.written.clone();
        let remuxer = StubRemuxer::default();
        let calls = remuxer.calls.clone();
        let output = dir.path().join("out.mp4");

        let mut uc = build(
            Box::new(StubLoader { image: red_logo() }),
            StubReader::new(black_frames(3), 100, 100),
            writer,
            remuxer,
            config(dir.path()),
        );
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("logo.png"), &output)
            .unwrap_err();

        assert!(matches!(err, WatermarkError::Write { .. }));
        assert!(written.lock().unwrap().is_empty());
        assert!(calls.lock().unwrap().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_intermediate_removed_when_remux_fails() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StubWriter {
            touch: true,
            ..StubWriter::default()
        };
        let remuxer = StubRemuxer {
            fail: true,
            ..StubRemuxer::default()
        };
        let cfg = config(dir.path());
        let intermediate = cfg.intermediate_path.clone();

        let mut uc = build(
            Box::new(StubLoader { image: red_logo() }),
            StubReader::new(black_frames(2), 100, 100),
            writer,
            remuxer,
            cfg,
        );
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("logo.png"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, WatermarkError::ExternalTool { .. }));
        assert!(!intermediate.exists());
    }

    #[test]
    fn test_oversized_watermark_is_rejected_before_sink() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StubReader::new(black_frames(2), 100, 100);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::default();
        let opened_at = writer.opened_at.clone();

        // 1.0 x 100 px leaves no room for a 5 px margin.
        let cfg = WatermarkConfig {
            fraction: 1.0,
            ..config(dir.path())
        };
        let mut uc = build(
            Box::new(StubLoader { image: red_logo() }),
            reader,
            writer,
            StubRemuxer::default(),
            cfg,
        );
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("logo.png"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, WatermarkError::WatermarkTooLarge { .. }));
        assert!(opened_at.lock().unwrap().is_none());
        assert_eq!(*reader_closed.lock().unwrap(), 1);
    }

    fn assert_collision_rejected(input: &Path, output: &Path, intermediate: PathBuf) {
        let reader = StubReader::new(black_frames(1), 100, 100);
        let opened = reader.opened.clone();
        let cfg = WatermarkConfig {
            margin: 5,
            fraction: 0.4,
            intermediate_path: intermediate,
        };
        let mut uc = build(
            Box::new(StubLoader { image: red_logo() }),
            reader,
            StubWriter {
                touch: true,
                ..StubWriter::default()
            },
            StubRemuxer::default(),
            cfg,
        );
        let err = uc
            .execute(input, Path::new("logo.png"), output)
            .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidConfig(_)), "{err}");
        assert_eq!(*opened.lock().unwrap(), 0);
    }

    #[test]
    fn test_intermediate_colliding_with_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        assert_collision_rejected(
            &dir.path().join("in.mp4"),
            &output,
            dir.path().join(".").join("out.mp4"),
        );
    }

    #[test]
    fn test_intermediate_spelled_differently_from_input_keeps_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"source video").unwrap();

        assert_collision_rejected(
            &input,
            &dir.path().join("out.mp4"),
            dir.path().join("sub").join("..").join("in.mp4"),
        );
        assert_collision_rejected(
            &input,
            &dir.path().join("out.mp4"),
            dir.path().join(".").join("in.mp4"),
        );
        assert_eq!(std::fs::read(&input).unwrap(), b"source video");
    }

    #[test]
    fn test_relative_intermediate_matching_absolute_input_is_rejected() {
        let name = "vidmark-collision-check.mp4";
        let cwd = std::env::current_dir().unwrap();
        assert_collision_rejected(
            &cwd.join(name),
            &cwd.join("vidmark-collision-out.mp4"),
            PathBuf::from(format!("./{name}")),
        );
    }

    #[test]
    fn test_output_spelled_differently_from_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"source video").unwrap();

        assert_collision_rejected(
            &input,
            &dir.path().join(".").join("in.mp4"),
            dir.path().join("tmp.mp4"),
        );
        assert_eq!(std::fs::read(&input).unwrap(), b"source video");
    }

    #[test]
    fn test_end_to_end_with_ffmpeg() {
        use crate::remux::infrastructure::ffmpeg_stream_remuxer::FfmpegStreamRemuxer;
        use crate::video::domain::video_reader::VideoReader;
        use crate::video::infrastructure::ffmpeg_reader::tests::create_test_video;
        use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
        use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        let logo_path = dir.path().join("logo.png");
        let output = dir.path().join("out.mp4");
        create_test_video(&input, &[[0, 0, 0]; 10], 100, 100);
        red_logo().save(&logo_path).unwrap();

        let cfg = config(dir.path());
        let intermediate = cfg.intermediate_path.clone();
        let mut uc = WatermarkVideoUseCase::new(
            PrepareWatermarkUseCase::new(Box::new(ImageFileLoader)),
            CompositeVideoUseCase::new(
                Box::new(FfmpegReader::new()),
                Box::new(FfmpegWriter::new()),
                Box::new(NullPipelineLogger),
            ),
            Box::new(FfmpegStreamRemuxer),
            cfg,
        );
        let frames = uc.execute(&input, &logo_path, &output).unwrap();
        assert_eq!(frames, 10);
        assert!(!intermediate.exists());

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&output).unwrap();
        assert_eq!((meta.width, meta.height), (100, 100));
        let decoded: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(decoded.len(), 10);

        // Lossy codec: compare loosely, away from the block edges.
        let inside = decoded[5].pixel(75, 85);
        assert!(inside[0] > 200 && inside[1] < 60 && inside[2] < 60, "{inside:?}");
        let outside = decoded[5].pixel(20, 20);
        assert!(outside.iter().all(|&c| c < 40), "{outside:?}");
    }
}
