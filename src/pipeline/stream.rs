use crate::encode::sink::{FrameSink, FrameSource, SinkConfig};
use crate::foundation::error::TileviewResult;
use crate::frame::video::StreamProps;
use crate::pipeline::filter::ProjectFilter;
use crate::render::backend::RenderBackend;

/// Summary of a [`project_stream`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames read from the source.
    pub frames_in: u64,
    /// Frames handed to the sink.
    pub frames_out: u64,
    /// Output stream properties, `None` for an empty source.
    pub output: Option<StreamProps>,
}

/// Drive `source` through `filter` into `sink`, one frame at a time in arrival order.
///
/// An unconfigured filter is configured from the first frame. Processing stops at the first
/// error, which is returned; the sink is only finished after a complete run.
#[tracing::instrument(skip_all)]
pub fn project_stream<B, S, K>(
    filter: &mut ProjectFilter<B>,
    source: &mut S,
    sink: &mut K,
) -> TileviewResult<StreamStats>
where
    B: RenderBackend,
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut stats = StreamStats::default();
    let Some(first) = source.next_frame()? else {
        tracing::warn!("source produced no frames");
        return Ok(stats);
    };

    let output = match filter.output_props() {
        Some(out) => out,
        None => filter.configure(StreamProps {
            format: first.format,
            resolution: first.resolution(),
            sar: source.sample_aspect_ratio(),
            time_base: first.time_base,
        })?,
    };
    stats.output = Some(output);

    sink.begin(SinkConfig {
        width: output.resolution.width,
        height: output.resolution.height,
        format: output.format,
        fps: source.frame_rate(),
        sar: output.sar,
    })?;

    let mut next = Some(first);
    while let Some(frame) = next {
        stats.frames_in += 1;
        let out = filter.filter_frame(&frame)?;
        sink.push_frame(stats.frames_out, &out)?;
        stats.frames_out += 1;
        next = source.next_frame()?;
    }

    sink.end()?;
    tracing::info!(frames = stats.frames_out, "stream finished");
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/stream.rs"]
mod tests;
