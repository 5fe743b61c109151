//! Tile quads in camera space.

pub(crate) mod builder;
