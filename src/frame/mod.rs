//! Planar YUV frames, pixel format descriptors and RGB conversion.

pub(crate) mod convert;
pub(crate) mod pixfmt;
pub(crate) mod video;
