//! 4×4 homogeneous transform math.
//!
//! Matrices are row-major and act on column vectors, so `(a * b) * v == a * (b * v)`.
//! Every angle crossing this API is in degrees.

pub(crate) mod matrix;
