use std::path::Path;
use std::time::Instant;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::WatermarkError;
use crate::shared::placement::Placement;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Lifecycle of one compositing run. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositorState {
    Idle,
    Opened,
    Streaming,
    Closed,
}

/// Decode → composite → encode loop over a whole video.
///
/// Frames are handled one at a time in decode order. Reader and writer
/// are released on every exit path: normal end of stream, a failing
/// frame, or the use case being dropped early.
pub struct CompositeVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    logger: Box<dyn PipelineLogger>,
    metadata: Option<VideoMetadata>,
    state: CompositorState,
}

impl CompositeVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            logger,
            metadata: None,
            state: CompositorState::Idle,
        }
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    /// Opens the source video. `Idle → Opened`.
    pub fn open_source(&mut self, path: &Path) -> Result<VideoMetadata, WatermarkError> {
        if self.state != CompositorState::Idle {
            return Err(WatermarkError::InvalidConfig(format!(
                "source can only be opened once (state {:?})",
                self.state
            )));
        }
        match self.reader.open(path) {
            Ok(metadata) => {
                self.metadata = Some(metadata.clone());
                self.state = CompositorState::Opened;
                Ok(metadata)
            }
            Err(e) => {
                self.state = CompositorState::Closed;
                Err(e)
            }
        }
    }

    /// Opens the sink at `output_path` and streams every frame through
    /// `compositor`. Returns the number of frames written.
    ///
    /// `Opened → Streaming → Closed`; any error also ends in `Closed`.
    pub fn run(
        &mut self,
        compositor: &dyn FrameCompositor,
        placement: &Placement,
        output_path: &Path,
    ) -> Result<usize, WatermarkError> {
        let metadata = match (&self.metadata, self.state) {
            (Some(m), CompositorState::Opened) => m.clone(),
            _ => {
                return Err(WatermarkError::InvalidConfig(format!(
                    "run requires an opened source (state {:?})",
                    self.state
                )))
            }
        };

        if let Err(e) = self.writer.open(output_path, &metadata) {
            self.close();
            return Err(e);
        }

        self.state = CompositorState::Streaming;
        self.logger.info(&format!(
            "Compositing into {} at ({}, {})-({}, {})",
            output_path.display(),
            placement.x1,
            placement.y1,
            placement.x2,
            placement.y2
        ));

        let streamed = self.stream(compositor, placement, metadata.total_frames);

        self.reader.close();
        let closed = self.writer.close();
        self.state = CompositorState::Closed;
        self.logger.summary();

        let written = streamed?;
        closed?;
        Ok(written)
    }

    /// Releases the source without streaming.
    pub fn close(&mut self) {
        if self.state != CompositorState::Closed {
            self.reader.close();
            self.state = CompositorState::Closed;
        }
    }

    fn stream(
        &mut self,
        compositor: &dyn FrameCompositor,
        placement: &Placement,
        total: usize,
    ) -> Result<usize, WatermarkError> {
        let mut written = 0;

        for frame in self.reader.frames() {
            let mut frame = frame?;
            if frame.index() != written {
                return Err(WatermarkError::Decode(format!(
                    "expected frame {written}, decoder produced frame {}",
                    frame.index()
                )));
            }

            let blend_start = Instant::now();
            compositor.composite(&mut frame, placement)?;
            let encode_start = Instant::now();
            self.writer.write(&frame)?;

            self.logger.timing(
                "blend",
                (encode_start - blend_start).as_secs_f64() * 1000.0,
            );
            self.logger
                .timing("encode", encode_start.elapsed().as_secs_f64() * 1000.0);

            written += 1;
            self.logger.progress(written, total);
        }

        Ok(written)
    }
}

impl Drop for CompositeVideoUseCase {
    fn drop(&mut self) {
        self.close();
    }
}
