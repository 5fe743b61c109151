use std::path::Path;

use crate::foundation::core::Rotation;
use crate::foundation::error::{TileviewError, TileviewResult};

/// Number of `:`-separated fields in a layout line.
pub const LAYOUT_FIELDS: usize = 9;

/// Source name reported for errors in the built-in layout.
pub const BUILTIN_LAYOUT_NAME: &str = "<builtin>";

/// Built-in 3×2 cube map layout, one tile per line.
pub const CUBE_LAYOUT: &str = "\
0.333333:0.5:90:90:0:0:0:0.333333:0.5
0.333333:0.5:90:90:90:0:0:0.666667:0
0.333333:0.5:90:90:-90:0:0:0:0.5
0.333333:0.5:90:90:0:90:0:0:0
0.333333:0.5:90:90:0:-90:0:0.333333:0
0.333333:0.5:90:90:0:180:0:0.666667:0.5
";

const fn cube_face(rotation: Rotation, u: f64, v: f64) -> Tile {
    Tile {
        w: 0.333333,
        h: 0.5,
        fovx: 90.0,
        fovy: 90.0,
        rotation,
        u,
        v,
    }
}

/// [`CUBE_LAYOUT`] as tiles.
const CUBE_TILES: [Tile; 6] = [
    cube_face(Rotation::new(0.0, 0.0, 0.0), 0.333333, 0.5),
    cube_face(Rotation::new(90.0, 0.0, 0.0), 0.666667, 0.0),
    cube_face(Rotation::new(-90.0, 0.0, 0.0), 0.0, 0.5),
    cube_face(Rotation::new(0.0, 90.0, 0.0), 0.0, 0.0),
    cube_face(Rotation::new(0.0, -90.0, 0.0), 0.333333, 0.0),
    cube_face(Rotation::new(0.0, 180.0, 0.0), 0.666667, 0.5),
];

/// One atlas region projected onto a perspective frustum.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tile {
    /// Width as a fraction of the atlas.
    pub w: f64,
    /// Height as a fraction of the atlas.
    pub h: f64,
    /// Horizontal field of view, degrees.
    pub fovx: f64,
    /// Vertical field of view, degrees.
    pub fovy: f64,
    /// Direction the tile faces.
    pub rotation: Rotation,
    /// Atlas origin, horizontal fraction.
    pub u: f64,
    /// Atlas origin, vertical fraction.
    pub v: f64,
}

/// Ordered tiles. Later tiles draw over earlier ones where they overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    /// Tiles in draw order.
    pub tiles: Vec<Tile>,
}

impl Layout {
    /// The built-in six-face cube map.
    pub fn cube() -> Self {
        Self {
            tiles: CUBE_TILES.to_vec(),
        }
    }

    /// Load the layout at `path`, or the built-in cube when no path (or an empty one) is given.
    ///
    /// A failing file never falls back to the cube.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> TileviewResult<Self> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            tracing::info!("using built-in cube layout");
            return Ok(Self::cube());
        };
        let text = std::fs::read_to_string(path).map_err(|e| TileviewError::io(path, e))?;
        let layout = Self::parse(&path.display().to_string(), &text)?;
        tracing::info!(path = %path.display(), tiles = layout.len(), "loaded layout");
        Ok(layout)
    }

    /// Parse layout text: one tile per non-blank line, `w:h:fovx:fovy:xr:yr:zr:u:v`.
    pub fn parse(source_name: &str, text: &str) -> TileviewResult<Self> {
        let mut tiles = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let fields: Vec<&str> = line
                .split(':')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != LAYOUT_FIELDS {
                return Err(TileviewError::malformed_layout(
                    source_name,
                    line_no,
                    format!("expected {LAYOUT_FIELDS} fields, found {}", fields.len()),
                ));
            }
            let mut v = [0.0f64; LAYOUT_FIELDS];
            for (slot, field) in v.iter_mut().zip(&fields) {
                *slot = field.parse::<f64>().map_err(|_| {
                    TileviewError::malformed_layout(
                        source_name,
                        line_no,
                        format!("'{field}' is not a number"),
                    )
                })?;
            }
            tiles.push(Tile {
                w: v[0],
                h: v[1],
                fovx: v[2],
                fovy: v[3],
                rotation: Rotation::new(v[4], v[5], v[6]),
                u: v[7],
                v: v[8],
            });
        }
        if tiles.is_empty() {
            return Err(TileviewError::malformed_layout(
                source_name,
                0,
                "layout contains no tiles",
            ));
        }
        Ok(Self { tiles })
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Return `true` for a layout without tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/tile.rs"]
mod tests;
