use std::collections::VecDeque;

use crate::foundation::core::Rational;
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::pixfmt::PixFmt;
use crate::frame::video::VideoFrame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Pixel format of pushed frames.
    pub format: PixFmt,
    /// Frames per second.
    pub fps: Rational,
    /// Sample aspect ratio.
    pub sar: Rational,
}

/// Sink contract for consuming projected frames in presentation order.
///
/// Ordering contract: `push_frame` is called with strictly increasing indices.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> TileviewResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: u64, frame: &VideoFrame) -> TileviewResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> TileviewResult<()>;
}

/// Source contract for decoded frames in presentation order.
pub trait FrameSource {
    /// Nominal frame rate of the stream.
    fn frame_rate(&self) -> Rational;
    /// Sample aspect ratio of the stream; `0/1` when unknown.
    fn sample_aspect_ratio(&self) -> Rational {
        Rational::ONE
    }
    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> TileviewResult<Option<VideoFrame>>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, VideoFrame)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(u64, VideoFrame)] {
        &self.frames
    }

    /// Return `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TileviewResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &VideoFrame) -> TileviewResult<()> {
        if self.cfg.is_none() {
            return Err(TileviewError::frame("in-memory sink not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TileviewResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// In-memory source replaying a fixed list of frames.
#[derive(Debug, Default)]
pub struct InMemorySource {
    frames: VecDeque<VideoFrame>,
    fps: Option<Rational>,
}

impl InMemorySource {
    /// Create a source that yields `frames` at `fps` frames per second.
    pub fn new(frames: impl IntoIterator<Item = VideoFrame>, fps: Rational) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            fps: Some(fps),
        }
    }

    /// Frames not yet yielded.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for InMemorySource {
    fn frame_rate(&self) -> Rational {
        self.fps.unwrap_or(Rational { num: 25, den: 1 })
    }

    fn next_frame(&mut self) -> TileviewResult<Option<VideoFrame>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
