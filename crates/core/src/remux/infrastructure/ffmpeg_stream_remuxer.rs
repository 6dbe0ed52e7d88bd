use std::path::Path;

use crate::remux::domain::audio_remuxer::AudioRemuxer;
use crate::shared::error::WatermarkError;

const TOOL: &str = "libavformat";

/// In-process remuxer built on ffmpeg-next: stream-copies the first video
/// stream of the intermediate and the first audio stream of the original.
///
/// Needs no `ffmpeg` binary. When the original has no audio the video is
/// copied on its own and a warning is logged.
pub struct FfmpegStreamRemuxer;

impl AudioRemuxer for FfmpegStreamRemuxer {
    fn remux(
        &self,
        video_only: &Path,
        original: &Path,
        output: &Path,
    ) -> Result<(), WatermarkError> {
        ffmpeg_next::init().map_err(|e| WatermarkError::external(TOOL, e))?;

        let mut ictx_video = open_input(video_only)?;
        let mut ictx_audio = open_input(original)?;

        let video_src = ictx_video
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .map(|s| (s.index(), s.time_base(), s.parameters()))
            .ok_or_else(|| {
                WatermarkError::external(
                    TOOL,
                    format!("no video stream in {}", video_only.display()),
                )
            })?;

        let audio_src = first_audio_stream(&ictx_audio);
        if audio_src.is_none() {
            log::warn!(
                "{} has no audio stream, writing video only",
                original.display()
            );
        }

        let mut octx = ffmpeg_next::format::output(output)
            .map_err(|e| WatermarkError::write(output, e))?;

        let video_ost = add_copy_stream(&mut octx, video_src.2)?;
        let audio_ost = match audio_src {
            Some((_, _, ref params)) => Some(add_copy_stream(&mut octx, params.clone())?),
            None => None,
        };

        octx.write_header()
            .map_err(|e| WatermarkError::write(output, e))?;

        copy_packets(&mut ictx_video, &mut octx, video_src.0, video_src.1, video_ost, output)?;
        if let (Some((idx, tb, _)), Some(ost)) = (audio_src, audio_ost) {
            copy_packets(&mut ictx_audio, &mut octx, idx, tb, ost, output)?;
        }

        octx.write_trailer()
            .map_err(|e| WatermarkError::write(output, e))?;

        log::info!("Final video with audio at {}", output.display());
        Ok(())
    }
}

fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, WatermarkError> {
    ffmpeg_next::format::input(path).map_err(|e| WatermarkError::ResourceNotFound {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn first_audio_stream(
    ictx: &ffmpeg_next::format::context::Input,
) -> Option<(usize, ffmpeg_next::Rational, ffmpeg_next::codec::Parameters)> {
    ictx.streams()
        .find(|s| s.parameters().medium() == ffmpeg_next::media::Type::Audio)
        .map(|s| (s.index(), s.time_base(), s.parameters()))
}

fn add_copy_stream(
    octx: &mut ffmpeg_next::format::context::Output,
    params: ffmpeg_next::codec::Parameters,
) -> Result<usize, WatermarkError> {
    let mut ost = octx
        .add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))
        .map_err(|e| WatermarkError::external(TOOL, e))?;
    ost.set_parameters(params);
    // Let the output container choose its own codec tag.
    unsafe {
        (*ost.parameters().as_mut_ptr()).codec_tag = 0;
    }
    Ok(ost.index())
}

fn copy_packets(
    ictx: &mut ffmpeg_next::format::context::Input,
    octx: &mut ffmpeg_next::format::context::Output,
    source_index: usize,
    source_time_base: ffmpeg_next::Rational,
    ost_index: usize,
    output: &Path,
) -> Result<(), WatermarkError> {
    let ost_time_base = octx
        .stream(ost_index)
        .map(|s| s.time_base())
        .ok_or_else(|| WatermarkError::external(TOOL, "output stream disappeared"))?;

    for (stream, mut packet) in ictx.packets() {
        if stream.index() != source_index {
            continue;
        }
        packet.rescale_ts(source_time_base, ost_time_base);
        packet.set_position(-1);
        packet.set_stream(ost_index);
        packet
            .write_interleaved(octx)
            .map_err(|e| WatermarkError::write(output, e))?;
    }
    Ok(())
}
