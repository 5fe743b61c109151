//! Tileview projects tiled 360° video atlases into a rotating perspective view.
//!
//! An input frame packs several rectangular tiles (the six faces of a cube map by default),
//! each covering a known field of view in a known direction. Every output frame re-projects
//! those tiles through a virtual camera whose orientation can follow a time-indexed track:
//!
//! - Describe the filter with [`ProjectOptions`]
//! - Configure a [`ProjectFilter`] against the input [`StreamProps`]
//! - Feed [`VideoFrame`]s through [`ProjectFilter::filter_frame`], or drive a whole stream
//!   from a [`FrameSource`] into a [`FrameSink`] with [`project_stream`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod config;
/// Frame sources and sinks.
pub mod encode;
pub(crate) mod expression;
pub(crate) mod frame;
pub(crate) mod geometry;
pub(crate) mod layout;
pub(crate) mod orientation;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod transform;

pub use crate::foundation::core::{Rational, Resolution, Rotation};
pub use crate::foundation::error::{TileviewError, TileviewResult};
pub use crate::transform::matrix::{Mat4, Vec4, deg_to_rad, rad_to_deg};

pub use crate::config::options::{MAX_TIMEBASE_TOLERANCE, ProjectOptions};
pub use crate::config::sizing::{CropOffset, OutputGeometry, expand_fov};
pub use crate::frame::convert::{frame_to_rgb, rgb_to_frame};
pub use crate::frame::pixfmt::PixFmt;
pub use crate::frame::video::{Plane, StreamProps, VideoFrame};

pub use crate::geometry::builder::{
    TILE_PLANE_Z, TileGeometry, VERTICES_PER_TILE, Vertex, build_geometry, tile_placement,
};
pub use crate::layout::tile::{BUILTIN_LAYOUT_NAME, CUBE_LAYOUT, LAYOUT_FIELDS, Layout, Tile};
pub use crate::orientation::track::{ORIENTATION_FIELDS, OrientationSample, OrientationTrack};

pub use crate::render::backend::{
    BackendKind, FAR_PLANE, NEAR_PLANE, PlaneView, Raster, RenderBackend, RenderPass,
    ViewTransform, create_backend,
};
pub use crate::render::cpu::CpuRenderer;
pub use crate::render::targets::{TargetPool, TargetPoolOpts, TargetPoolStats};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::media::{FfmpegSource, VideoSourceInfo, probe_video};
pub use crate::encode::sink::{FrameSink, FrameSource, InMemorySink, InMemorySource, SinkConfig};
pub use crate::pipeline::filter::{COMMANDS, FilterState, ProjectFilter};
pub use crate::pipeline::stream::{StreamStats, project_stream};
