use crate::foundation::error::{TileviewError, TileviewResult};
use crate::layout::tile::{Layout, Tile};
use crate::transform::matrix::{Mat4, Vec4, deg_to_rad};

/// Vertices emitted per tile (two triangles).
pub const VERTICES_PER_TILE: usize = 6;

/// Depth of the plane every tile quad is built on, before rotation.
pub const TILE_PLANE_Z: f32 = -1.0;

/// One corner of a tile quad.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    /// Homogeneous camera-space position.
    pub position: [f32; 4],
    /// Absolute atlas coordinate.
    pub uv: [f32; 2],
    /// Owning tile's atlas rectangle `(u, v, w, h)`.
    pub uv_rect: [f32; 4],
}

/// Static vertex buffer for a whole layout, `VERTICES_PER_TILE` vertices per tile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileGeometry {
    /// Vertices in tile order.
    pub vertices: Vec<Vertex>,
}

impl TileGeometry {
    /// Triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex]> {
        self.vertices.chunks_exact(3)
    }

    /// Number of tiles represented.
    pub fn tile_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_TILE
    }
}

fn validate_tile(index: usize, tile: &Tile) -> TileviewResult<()> {
    for (name, fov) in [("fovx", tile.fovx), ("fovy", tile.fovy)] {
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            return Err(TileviewError::invalid_tile(
                index,
                format!("{name} must be in (0, 180) degrees, got {fov}"),
            ));
        }
    }
    for (name, size) in [("w", tile.w), ("h", tile.h)] {
        if !size.is_finite() || size <= 0.0 || size > 1.0 {
            return Err(TileviewError::invalid_tile(
                index,
                format!("{name} must be in (0, 1], got {size}"),
            ));
        }
    }
    let r = tile.rotation;
    if ![tile.u, tile.v, r.x, r.y, r.z].iter().all(|v| v.is_finite()) {
        return Err(TileviewError::invalid_tile(
            index,
            "origin and rotation must be finite",
        ));
    }
    Ok(())
}

/// Matrix placing a tile's quad in camera space.
///
/// This is the inverse of the view orientation with the same angles, so a view rotated by
/// `tile.rotation` looks straight at the tile.
pub fn tile_placement(tile: &Tile) -> Mat4 {
    Mat4::orientation(tile.rotation).transpose()
}

/// Build the quad of every tile in `layout`.
#[tracing::instrument(level = "debug", skip(layout), fields(tiles = layout.len()))]
pub fn build_geometry(layout: &Layout) -> TileviewResult<TileGeometry> {
    let mut vertices = Vec::with_capacity(layout.len() * VERTICES_PER_TILE);
    for (index, tile) in layout.tiles.iter().enumerate() {
        validate_tile(index, tile)?;

        let rx = deg_to_rad(tile.fovx / 2.0).tan() as f32;
        let ty = deg_to_rad(tile.fovy / 2.0).tan() as f32;
        let (lx, by) = (-rx, -ty);

        let (u, v) = (tile.u as f32, tile.v as f32);
        let (w, h) = (tile.w as f32, tile.h as f32);
        let uv_rect = [u, v, w, h];
        let corners = [
            ((lx, by), (u, v)),
            ((rx, by), (u + w, v)),
            ((rx, ty), (u + w, v + h)),
            ((lx, by), (u, v)),
            ((rx, ty), (u + w, v + h)),
            ((lx, ty), (u, v + h)),
        ];

        let placement = tile_placement(tile);
        for ((x, y), (cu, cv)) in corners {
            let p = placement * Vec4::point(x, y, TILE_PLANE_Z);
            vertices.push(Vertex {
                position: p.to_array(),
                uv: [cu, cv],
                uv_rect,
            });
        }
        tracing::debug!(
            index,
            lx,
            rx,
            ty,
            by,
            u,
            v,
            w,
            h,
            "built tile quad"
        );
    }
    tracing::info!(vertices = vertices.len(), "built tile geometry");
    Ok(TileGeometry { vertices })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/builder.rs"]
mod tests;
