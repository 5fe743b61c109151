use crate::config::options::ProjectOptions;
use crate::config::sizing::{CropOffset, FrameVars, OutputGeometry, Sizing};
use crate::foundation::core::Rotation;
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::video::{StreamProps, VideoFrame};
use crate::geometry::builder::{TileGeometry, build_geometry};
use crate::layout::tile::Layout;
use crate::orientation::track::OrientationTrack;
use crate::pipeline::staging::{PlaneStaging, write_back};
use crate::render::backend::{RenderBackend, RenderPass, ViewTransform};
use crate::render::cpu::CpuRenderer;

/// Lifecycle state of a [`ProjectFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterState {
    /// No input stream has been configured yet.
    Unconfigured,
    /// Layout, orientation track and geometry are built; no frame processed since.
    Configured,
    /// At least one frame has been processed with the current configuration.
    Rendering,
}

/// Commands accepted by [`ProjectFilter::process_command`].
pub const COMMANDS: &[&str] = &["w", "out_w", "h", "out_h", "x", "y"];

/// Everything derived from the options and the input stream.
#[derive(Debug)]
struct Session {
    input: StreamProps,
    output: StreamProps,
    geometry_out: OutputGeometry,
    sizing: Sizing,
    layout: Layout,
    track: OrientationTrack,
    geometry: TileGeometry,
}

impl Session {
    fn build(opts: &ProjectOptions, input: StreamProps) -> TileviewResult<Self> {
        let (sizing, geometry_out) = Sizing::resolve(opts, &input)?;
        let layout = Layout::load(opts.lofile.as_deref())?;
        let track = OrientationTrack::load(opts.orfile.as_deref())?;
        let geometry = build_geometry(&layout)?;
        // Fail at setup rather than on the first frame.
        ViewTransform::new(geometry_out.fovx, geometry_out.fovy, Rotation::ZERO)?;

        let output = StreamProps {
            format: input.format,
            resolution: sizing.output(),
            sar: geometry_out.sar,
            time_base: input.time_base,
        };
        Ok(Self {
            input,
            output,
            geometry_out,
            sizing,
            layout,
            track,
            geometry,
        })
    }
}

/// Projects packed 360° atlas frames into a rotating perspective view.
///
/// The filter owns its render backend exclusively and processes one frame at a time.
pub struct ProjectFilter<B: RenderBackend = CpuRenderer> {
    opts: ProjectOptions,
    backend: B,
    session: Option<Session>,
    state: FilterState,
    staging: PlaneStaging,
    frames_processed: u64,
    last_offset: CropOffset,
}

impl ProjectFilter<CpuRenderer> {
    /// Create a filter backed by the software renderer.
    pub fn new(opts: ProjectOptions) -> TileviewResult<Self> {
        Self::with_backend(opts, CpuRenderer::default())
    }
}

impl<B: RenderBackend> ProjectFilter<B> {
    /// Create a filter with an explicit render backend.
    pub fn with_backend(opts: ProjectOptions, backend: B) -> TileviewResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            backend,
            session: None,
            state: FilterState::Unconfigured,
            staging: PlaneStaging::default(),
            frames_processed: 0,
            last_offset: CropOffset::default(),
        })
    }

    /// Current options.
    pub fn options(&self) -> &ProjectOptions {
        &self.opts
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Borrow the render backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Frames processed since construction.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Crop offset of the last processed frame.
    pub fn last_crop_offset(&self) -> CropOffset {
        self.last_offset
    }

    /// Configured input stream.
    pub fn input_props(&self) -> Option<StreamProps> {
        self.session.as_ref().map(|s| s.input)
    }

    /// Output stream produced by [`ProjectFilter::filter_frame`].
    pub fn output_props(&self) -> Option<StreamProps> {
        self.session.as_ref().map(|s| s.output)
    }

    /// Resolved output size, aspect ratio and field of view.
    pub fn output_geometry(&self) -> Option<&OutputGeometry> {
        self.session.as_ref().map(|s| &s.geometry_out)
    }

    /// Active tile layout.
    pub fn layout(&self) -> Option<&Layout> {
        self.session.as_ref().map(|s| &s.layout)
    }

    /// Active orientation track.
    pub fn orientation_track(&self) -> Option<&OrientationTrack> {
        self.session.as_ref().map(|s| &s.track)
    }

    /// Active tile geometry.
    pub fn tile_geometry(&self) -> Option<&TileGeometry> {
        self.session.as_ref().map(|s| &s.geometry)
    }

    /// Static rotation from the options.
    pub fn default_rotation(&self) -> Rotation {
        Rotation::new(self.opts.xr, self.opts.yr, self.opts.zr)
    }

    /// View rotation for a frame at `time` seconds.
    pub fn rotation_at(&self, time: Option<f64>) -> Rotation {
        let default = self.default_rotation();
        match self.session.as_ref().map(|s| &s.track) {
            Some(track) if !track.is_empty() => {
                track.rotation_for(time, self.opts.timebase, default)
            }
            _ => default,
        }
    }

    /// Configure the filter for an input stream and return the output stream properties.
    ///
    /// Loads the layout and orientation track and builds the tile geometry. Any failure leaves
    /// the filter unconfigured.
    #[tracing::instrument(skip(self), fields(format = %input.format))]
    pub fn configure(&mut self, input: StreamProps) -> TileviewResult<StreamProps> {
        tracing::info!(
            fovx = self.opts.fovx,
            fovy = self.opts.fovy,
            xr = self.opts.xr,
            yr = self.opts.yr,
            zr = self.opts.zr,
            orfile = ?self.opts.orfile,
            lofile = ?self.opts.lofile,
            "configuring projection"
        );
        self.release_resources();
        self.session = None;
        self.state = FilterState::Unconfigured;

        let session = Session::build(&self.opts, input)?;
        let output = session.output;
        self.session = Some(session);
        self.state = FilterState::Configured;
        Ok(output)
    }

    /// Replace the options and rebuild the configuration wholesale.
    ///
    /// On failure the previous options and configuration stay active.
    pub fn reconfigure(&mut self, opts: ProjectOptions) -> TileviewResult<()> {
        opts.validate()?;
        if let Some(input) = self.input_props() {
            let session = Session::build(&opts, input)?;
            self.release_resources();
            self.session = Some(session);
            self.state = FilterState::Configured;
        }
        self.opts = opts;
        Ok(())
    }

    /// Apply a runtime command (`w`, `out_w`, `h`, `out_h`, `x` or `y`).
    ///
    /// The filter is reconfigured with the new value; on failure the previous value is
    /// restored and the error returned.
    pub fn process_command(&mut self, cmd: &str, arg: &str) -> TileviewResult<()> {
        if !COMMANDS.contains(&cmd) {
            return Err(TileviewError::invalid_parameter(format!(
                "unsupported command '{cmd}'"
            )));
        }
        let mut next = self.opts.clone();
        next.set(cmd, arg)?;
        match self.reconfigure(next) {
            Ok(()) => {
                tracing::info!(cmd, arg, "applied command");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(cmd, arg, error = %e, "command rejected, keeping previous configuration");
                Err(e)
            }
        }
    }

    /// Project one frame.
    ///
    /// The input must match the configured stream. The returned frame has the configured
    /// output size, the input's format and timestamps, and an opaque alpha plane when the
    /// format has one.
    #[tracing::instrument(level = "debug", skip_all, fields(n = self.frames_processed))]
    pub fn filter_frame(&mut self, frame: &VideoFrame) -> TileviewResult<VideoFrame> {
        let first = self.frames_processed == 0;
        let rotation = self.rotation_at(frame.time_seconds());
        let Some(session) = self.session.as_mut() else {
            return Err(TileviewError::configuration("filter is not configured"));
        };
        let input = session.input;
        if frame.format != input.format || frame.resolution() != input.resolution {
            return Err(TileviewError::configuration(format!(
                "frame is {} {}x{}, configured for {} {}x{}",
                frame.format,
                frame.width,
                frame.height,
                input.format,
                input.resolution.width,
                input.resolution.height
            )));
        }
        frame.validate()?;

        self.last_offset = session.sizing.crop_offset(FrameVars {
            n: self.frames_processed,
            t: frame.time_seconds(),
            pos: frame.pos,
        });

        let transform = ViewTransform::new(
            session.geometry_out.fovx,
            session.geometry_out.fovy,
            rotation,
        )?;
        tracing::trace!(x = rotation.x, y = rotation.y, z = rotation.z, "frame rotation");

        let format = input.format;
        let mut out = VideoFrame::new(format, session.output.resolution)?;
        out.pts = frame.pts;
        out.time_base = frame.time_base;
        out.pos = frame.pos;

        if first {
            tracing::info!(
                iw = input.resolution.width,
                ih = input.resolution.height,
                hsub = format.log2_chroma_w(),
                vsub = format.log2_chroma_h(),
                linesize0 = frame.planes[0].linesize,
                linesize1 = frame.planes[1].linesize,
                linesize2 = frame.planes[2].linesize,
                "first frame"
            );
        }

        for plane in 0..3 {
            let in_res = format.plane_resolution(plane, input.resolution);
            let out_res = format.plane_resolution(plane, session.output.resolution);
            let texture = self.staging.stage(plane, &frame.planes[plane], in_res)?;
            let raster = self.backend.render(&RenderPass {
                geometry: &session.geometry,
                transform: &transform,
                texture,
                resolution: out_res,
                clear: self.opts.clear_yuv[plane],
            })?;
            if first {
                tracing::info!(
                    plane,
                    in_w = in_res.width,
                    in_h = in_res.height,
                    out_w = out_res.width,
                    out_h = out_res.height,
                    "rendered first plane"
                );
            }
            let written = write_back(&raster, &mut out.planes[plane]);
            self.backend.recycle(raster);
            written?;
        }

        if let Some(alpha) = out.planes.get_mut(3) {
            alpha.fill(u8::MAX);
        }

        self.frames_processed += 1;
        self.state = FilterState::Rendering;
        Ok(out)
    }

    fn release_resources(&mut self) {
        tracing::debug!(
            staging_bytes = self.staging.retained_bytes(),
            "releasing render resources"
        );
        self.backend.release();
        self.staging.release();
    }
}

impl<B: RenderBackend> Drop for ProjectFilter<B> {
    fn drop(&mut self) {
        self.release_resources();
    }
}

impl<B: RenderBackend> std::fmt::Debug for ProjectFilter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectFilter")
            .field("opts", &self.opts)
            .field("state", &self.state)
            .field("frames_processed", &self.frames_processed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/filter.rs"]
mod tests;
