//! Frame sources and sinks.
//!
//! Sources feed decoded frames to the projection pipeline in presentation order; sinks consume
//! projected frames in the same order.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// `ffmpeg`/`ffprobe`-based source (feature `media-ffmpeg`).
pub mod media;
/// Source and sink traits and in-memory implementations.
pub mod sink;
