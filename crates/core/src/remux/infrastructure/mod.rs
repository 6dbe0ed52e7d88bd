pub mod ffmpeg_cli_remuxer;
pub mod ffmpeg_stream_remuxer;
