use std::path::PathBuf;

use thiserror::Error;

/// Every failure the watermarking pipeline can report.
///
/// All variants are fatal: callers propagate them to the driver, which
/// prints the message and exits non-zero.
#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("resource not found: {path}: {reason}")]
    ResourceNotFound { path: PathBuf, reason: String },

    #[error("unsupported format: {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("failed to decode frame: {0}")]
    Decode(String),

    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("{tool} failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "watermark {wm_width}x{wm_height} with margin {margin} does not fit \
         inside a {frame_width}x{frame_height} frame"
    )]
    WatermarkTooLarge {
        wm_width: u32,
        wm_height: u32,
        margin: u32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatermarkError {
    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn external(tool: &str, reason: impl ToString) -> Self {
        Self::ExternalTool {
            tool: tool.to_string(),
            reason: reason.to_string(),
        }
    }
}
