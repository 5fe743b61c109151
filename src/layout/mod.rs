//! Tile layouts: how the faces of a packed 360° atlas map onto view directions.

pub(crate) mod tile;
