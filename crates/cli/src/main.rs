use std::path::PathBuf;
use std::process;

use clap::Parser;

use vidmark_core::pipeline::composite_video_use_case::CompositeVideoUseCase;
use vidmark_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use vidmark_core::pipeline::prepare_watermark_use_case::PrepareWatermarkUseCase;
use vidmark_core::pipeline::watermark_video_use_case::WatermarkVideoUseCase;
use vidmark_core::remux::domain::audio_remuxer::AudioRemuxer;
use vidmark_core::remux::infrastructure::ffmpeg_cli_remuxer::FfmpegCliRemuxer;
use vidmark_core::remux::infrastructure::ffmpeg_stream_remuxer::FfmpegStreamRemuxer;
use vidmark_core::shared::config::WatermarkConfig;
use vidmark_core::shared::constants::{
    DEFAULT_INTERMEDIATE_PATH, DEFAULT_MARGIN, DEFAULT_WATERMARK_FRACTION,
};
use vidmark_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use vidmark_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use vidmark_core::watermark::infrastructure::image_file_loader::ImageFileLoader;

const REMUXERS: [&str; 2] = ["ffmpeg", "native"];

/// Stamp a logo onto every frame of a video, keeping the original audio.
#[derive(Parser, Debug)]
#[command(name = "vidmark", version)]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Watermark image (PNG with transparency recommended).
    watermark: PathBuf,

    /// Output video file.
    output: PathBuf,

    /// Distance in pixels from the bottom and right edges.
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    margin: u32,

    /// Watermark width as a fraction of the video width (0.0-1.0].
    #[arg(long, default_value_t = DEFAULT_WATERMARK_FRACTION)]
    fraction: f64,

    /// Where the video-only intermediate is written.
    #[arg(long, default_value = DEFAULT_INTERMEDIATE_PATH)]
    temp_path: PathBuf,

    /// Audio remux backend: ffmpeg (external binary) or native.
    #[arg(long, default_value = "ffmpeg")]
    remuxer: String,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            process::exit(1);
        }
        Err(e) => e.exit(),
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate(&cli)?;

    let config = WatermarkConfig {
        margin: cli.margin,
        fraction: cli.fraction,
        intermediate_path: cli.temp_path,
    };
    config.validate()?;

    let mut use_case = WatermarkVideoUseCase::new(
        PrepareWatermarkUseCase::new(Box::new(ImageFileLoader)),
        CompositeVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(StdoutPipelineLogger::default()),
        ),
        build_remuxer(&cli.remuxer),
        config,
    );

    let frames = use_case.execute(&cli.input, &cli.watermark, &cli.output)?;
    log::info!("Watermarked {frames} frames into {}", cli.output.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !REMUXERS.contains(&cli.remuxer.as_str()) {
        return Err(format!(
            "Remuxer must be 'ffmpeg' or 'native', got '{}'",
            cli.remuxer
        )
        .into());
    }
    Ok(())
}

fn build_remuxer(name: &str) -> Box<dyn AudioRemuxer> {
    if name == "native" {
        Box::new(FfmpegStreamRemuxer)
    } else {
        Box::new(FfmpegCliRemuxer::new())
    }
}
