use super::*;
use crate::foundation::core::{Resolution, Rotation};
use crate::geometry::builder::{TileGeometry, build_geometry};
use crate::layout::tile::{Layout, Tile};
use crate::render::backend::ViewTransform;

fn tile(fov: f64, u: f64, w: f64) -> Tile {
    Tile {
        w,
        h: 1.0,
        fovx: fov,
        fovy: fov,
        rotation: Rotation::ZERO,
        u,
        v: 0.0,
    }
}

fn geometry(tiles: Vec<Tile>) -> TileGeometry {
    build_geometry(&Layout { tiles }).unwrap()
}

fn render(
    geo: &TileGeometry,
    rotation: Rotation,
    tex: &[u8],
    tex_res: Resolution,
    out: Resolution,
    clear: u8,
) -> Raster {
    let transform = ViewTransform::new(90.0, 90.0, rotation).unwrap();
    let mut r = CpuRenderer::default();
    r.render(&RenderPass {
        geometry: geo,
        transform: &transform,
        texture: PlaneView::new(tex, tex_res.width, tex_res.height).unwrap(),
        resolution: out,
        clear,
    })
    .unwrap()
}

#[test]
fn head_on_tile_reproduces_texture() {
    let geo = geometry(vec![tile(90.0, 0.0, 1.0)]);
    let res = Resolution::new(4, 4);
    let tex: Vec<u8> = (0..16).map(|i| i * 10).collect();
    let out = render(&geo, Rotation::ZERO, &tex, res, res, 0);
    assert_eq!(out.data, tex);
}

#[test]
fn uncovered_pixels_get_clear_value() {
    let geo = geometry(vec![tile(45.0, 0.0, 1.0)]);
    let tex = [100u8; 4];
    let out = render(
        &geo,
        Rotation::ZERO,
        &tex,
        Resolution::new(2, 2),
        Resolution::new(8, 8),
        7,
    );
    assert_eq!(out.get(0, 0), 7);
    assert_eq!(out.get(7, 7), 7);
    assert_eq!(out.get(3, 3), 100);
    assert_eq!(out.get(4, 2), 100);
}

#[test]
fn chroma_and_luma_cover_the_same_region() {
    let geo = geometry(vec![tile(45.0, 0.0, 1.0)]);
    let tex = [100u8; 4];
    let covered = |res: Resolution| -> Vec<(u32, u32)> {
        let out = render(&geo, Rotation::ZERO, &tex, Resolution::new(2, 2), res, 0);
        let mut v = Vec::new();
        for y in 0..res.height {
            for x in 0..res.width {
                if out.get(x, y) != 0 {
                    v.push((x, y));
                }
            }
        }
        v
    };
    let luma = covered(Resolution::new(8, 8));
    let chroma = covered(Resolution::new(4, 4));
    assert_eq!(chroma, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    assert_eq!(luma.len(), 16);
    assert!(luma.iter().all(|&(x, y)| (2..6).contains(&x) && (2..6).contains(&y)));
}

#[test]
fn later_tiles_draw_over_earlier_ones() {
    // Left half of the atlas is 10, right half 200.
    let tex = [10u8, 10, 200, 200, 10, 10, 200, 200];
    let res = Resolution::new(4, 2);
    let out_res = Resolution::new(4, 4);
    let a = tile(90.0, 0.0, 0.5);
    let b = tile(90.0, 0.5, 0.5);

    let out = render(&geometry(vec![a, b]), Rotation::ZERO, &tex, res, out_res, 0);
    assert!(out.data.iter().all(|v| *v == 200), "{:?}", out.data);
    let out = render(&geometry(vec![b, a]), Rotation::ZERO, &tex, res, out_res, 0);
    assert!(out.data.iter().all(|v| *v == 10), "{:?}", out.data);
}

#[test]
fn tile_behind_the_camera_is_clipped_away() {
    let geo = geometry(vec![tile(90.0, 0.0, 1.0)]);
    let out = render(
        &geo,
        Rotation::new(0.0, 180.0, 0.0),
        &[50; 4],
        Resolution::new(2, 2),
        Resolution::new(8, 8),
        3,
    );
    assert!(out.data.iter().all(|v| *v == 3));
}

#[test]
fn cube_covers_every_direction() {
    let geo = build_geometry(&Layout::cube()).unwrap();
    let tex = [77u8; 24 * 16];
    for rot in [
        Rotation::ZERO,
        Rotation::new(30.0, 45.0, 10.0),
        Rotation::new(-60.0, 170.0, 0.0),
        Rotation::new(90.0, 0.0, 0.0),
    ] {
        let out = render(
            &geo,
            rot,
            &tex,
            Resolution::new(24, 16),
            Resolution::new(16, 16),
            0,
        );
        assert!(out.data.iter().all(|v| *v == 77), "gap at {rot:?}");
    }
}

#[test]
fn targets_are_recycled_and_released() {
    let geo = geometry(vec![tile(90.0, 0.0, 1.0)]);
    let transform = ViewTransform::new(90.0, 90.0, Rotation::ZERO).unwrap();
    let tex = [1u8; 4];
    let mut r = CpuRenderer::default();
    for _ in 0..3 {
        let raster = r
            .render(&RenderPass {
                geometry: &geo,
                transform: &transform,
                texture: PlaneView::new(&tex, 2, 2).unwrap(),
                resolution: Resolution::new(8, 8),
                clear: 0,
            })
            .unwrap();
        r.recycle(raster);
    }
    assert_eq!(r.passes(), 3);
    assert_eq!(r.pool_stats().alloc_targets, 1);
    r.release();
    assert_eq!(r.pool_stats().retained_targets, 0);
}

#[test]
fn empty_target_is_a_backend_error() {
    let geo = geometry(vec![tile(90.0, 0.0, 1.0)]);
    let transform = ViewTransform::new(90.0, 90.0, Rotation::ZERO).unwrap();
    let tex = [1u8; 4];
    let err = CpuRenderer::default()
        .render(&RenderPass {
            geometry: &geo,
            transform: &transform,
            texture: PlaneView::new(&tex, 2, 2).unwrap(),
            resolution: Resolution::new(0, 8),
            clear: 0,
        })
        .unwrap_err();
    assert!(matches!(err, TileviewError::RenderBackend(_)));
}

#[test]
fn clipping_keeps_the_visible_side() {
    let v = |z: f32| ClipVertex {
        pos: Vec4::new(0.0, 0.0, z, 1.0),
        uv: [z, 0.0],
    };
    let tri = [v(-2.0), v(0.0), v(0.5)];
    let out = clip_polygon(&tri, |p| p.z + p.w);
    assert!(out.iter().all(|c| c.pos.z >= -1.0 - 1e-6));
    assert_eq!(out.len(), 4);
}
