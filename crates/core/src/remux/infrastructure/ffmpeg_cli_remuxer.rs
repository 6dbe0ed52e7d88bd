use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::remux::domain::audio_remuxer::AudioRemuxer;
use crate::shared::constants::FFMPEG_BINARY;
use crate::shared::error::WatermarkError;

/// Runs the `ffmpeg` binary to copy video from one input and audio from
/// the other.
///
/// Invocation:
/// `ffmpeg -y -i <video-only> -i <original> -c copy -map 0:v:0 -map 1:a:0 <output>`
pub struct FfmpegCliRemuxer {
    binary: PathBuf,
}

impl FfmpegCliRemuxer {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(FFMPEG_BINARY),
        }
    }

    /// Uses a specific executable instead of `ffmpeg` from `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn args(video_only: &Path, original: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(14);
        args.extend(["-y", "-loglevel", "error", "-i"].map(OsString::from));
        args.push(video_only.into());
        args.push("-i".into());
        args.push(original.into());
        args.extend(["-c", "copy", "-map", "0:v:0", "-map", "1:a:0"].map(OsString::from));
        args.push(output.into());
        args
    }
}

impl Default for FfmpegCliRemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioRemuxer for FfmpegCliRemuxer {
    fn remux(
        &self,
        video_only: &Path,
        original: &Path,
        output: &Path,
    ) -> Result<(), WatermarkError> {
        let tool = self.binary.display().to_string();
        log::info!("Running {tool} to reattach audio");

        let result = Command::new(&self.binary)
            .args(Self::args(video_only, original, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| WatermarkError::external(&tool, format!("could not start: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(WatermarkError::external(
                &tool,
                format!("{} ({})", result.status, stderr.trim()),
            ));
        }

        log::info!("Final video with audio at {}", output.display());
        Ok(())
    }
}
