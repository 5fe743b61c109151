//! Time-indexed view orientation track.

pub(crate) mod track;
