use smallvec::SmallVec;

use crate::foundation::error::{TileviewError, TileviewResult};
use crate::render::backend::{PlaneView, Raster, RenderBackend, RenderPass};
use crate::render::targets::{TargetPool, TargetPoolOpts, TargetPoolStats};
use crate::transform::matrix::Vec4;

/// Barycentric slack so pixel centers on a shared edge are never dropped by both triangles.
const EDGE_EPSILON: f32 = 1e-5;

/// Clipped triangles have at most 3 + 2 vertices (one extra per clip plane).
type ClipPolygon = SmallVec<[ClipVertex; 8]>;

#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    pos: Vec4,
    uv: [f32; 2],
}

impl ClipVertex {
    fn lerp(a: ClipVertex, b: ClipVertex, t: f32) -> ClipVertex {
        let l = |x: f32, y: f32| x + (y - x) * t;
        ClipVertex {
            pos: Vec4::new(
                l(a.pos.x, b.pos.x),
                l(a.pos.y, b.pos.y),
                l(a.pos.z, b.pos.z),
                l(a.pos.w, b.pos.w),
            ),
            uv: [l(a.uv[0], b.uv[0]), l(a.uv[1], b.uv[1])],
        }
    }
}

/// Vertex after the perspective divide, in pixel units.
#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    x: f32,
    y: f32,
    inv_w: f32,
    u_over_w: f32,
    v_over_w: f32,
}

/// Software projection renderer.
///
/// Clips every tile triangle against the near and far planes, rasterizes it with
/// perspective-correct texture coordinates and samples the texture bilinearly inside the
/// owning tile's atlas rectangle. Tiles are drawn in layout order and later tiles overwrite
/// earlier ones; there is no depth test.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    targets: TargetPool,
    passes: u64,
}

impl CpuRenderer {
    /// Create a renderer with a custom render target pool.
    pub fn new(opts: TargetPoolOpts) -> Self {
        Self {
            targets: TargetPool::new(opts),
            passes: 0,
        }
    }

    /// Render target pool counters.
    pub fn pool_stats(&self) -> TargetPoolStats {
        self.targets.stats()
    }

    /// Passes rendered so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl RenderBackend for CpuRenderer {
    fn render(&mut self, pass: &RenderPass<'_>) -> TileviewResult<Raster> {
        if pass.resolution.is_empty() {
            return Err(TileviewError::render_backend(format!(
                "render target must be non-empty, got {}x{}",
                pass.resolution.width, pass.resolution.height
            )));
        }
        let mvp = pass.transform.mvp();
        let mut raster = self.targets.borrow(pass.resolution, pass.clear);

        for tri in pass.geometry.triangles() {
            let rect = tri[0].uv_rect;
            let poly: ClipPolygon = tri
                .iter()
                .map(|v| ClipVertex {
                    pos: mvp * Vec4::from_array(v.position),
                    uv: v.uv,
                })
                .collect();
            let poly = clip_polygon(&poly, |p| p.z + p.w);
            let poly = clip_polygon(&poly, |p| p.w - p.z);
            if poly.len() < 3 {
                continue;
            }
            let screen: SmallVec<[ScreenVertex; 8]> = poly
                .iter()
                .map(|v| to_screen(v, raster.width, raster.height))
                .collect();
            for i in 1..screen.len() - 1 {
                fill_triangle(
                    &mut raster,
                    [screen[0], screen[i], screen[i + 1]],
                    &pass.texture,
                    rect,
                );
            }
        }

        self.passes += 1;
        tracing::trace!(
            pass = self.passes,
            width = raster.width,
            height = raster.height,
            "rendered plane"
        );
        Ok(raster)
    }

    fn recycle(&mut self, raster: Raster) {
        self.targets.release(raster);
    }

    fn release(&mut self) {
        self.targets.clear();
    }
}

/// Sutherland-Hodgman clip of a convex polygon, keeping the side where `dist >= 0`.
fn clip_polygon(input: &[ClipVertex], dist: impl Fn(&Vec4) -> f32) -> ClipPolygon {
    let mut out = ClipPolygon::new();
    let Some(&last) = input.last() else {
        return out;
    };
    let mut prev = last;
    let mut prev_d = dist(&prev.pos);
    for &curr in input {
        let curr_d = dist(&curr.pos);
        match (prev_d >= 0.0, curr_d >= 0.0) {
            (true, true) => out.push(curr),
            (true, false) => out.push(ClipVertex::lerp(prev, curr, prev_d / (prev_d - curr_d))),
            (false, true) => {
                out.push(ClipVertex::lerp(prev, curr, prev_d / (prev_d - curr_d)));
                out.push(curr);
            }
            (false, false) => {}
        }
        prev = curr;
        prev_d = curr_d;
    }
    out
}

fn to_screen(v: &ClipVertex, width: u32, height: u32) -> ScreenVertex {
    let inv_w = 1.0 / v.pos.w;
    ScreenVertex {
        x: (v.pos.x * inv_w + 1.0) * 0.5 * width as f32,
        y: (v.pos.y * inv_w + 1.0) * 0.5 * height as f32,
        inv_w,
        u_over_w: v.uv[0] * inv_w,
        v_over_w: v.uv[1] * inv_w,
    }
}

#[inline]
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn fill_triangle(raster: &mut Raster, v: [ScreenVertex; 3], tex: &PlaneView<'_>, rect: [f32; 4]) {
    let p = v.map(|s| (s.x, s.y));
    let area = edge(p[0], p[1], p[2]);
    if !area.is_finite() || area.abs() < 1e-12 {
        return;
    }
    let inv_area = 1.0 / area;

    let (w, h) = (raster.width as f32, raster.height as f32);
    let min_x = p.iter().map(|q| q.0).fold(f32::INFINITY, f32::min);
    let max_x = p.iter().map(|q| q.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = p.iter().map(|q| q.1).fold(f32::INFINITY, f32::min);
    let max_y = p.iter().map(|q| q.1).fold(f32::NEG_INFINITY, f32::max);
    if max_x < 0.0 || max_y < 0.0 || min_x > w || min_y > h {
        return;
    }
    let x0 = (min_x - 0.5).floor().max(0.0) as u32;
    let x1 = ((max_x - 0.5).ceil().max(0.0) as u32).min(raster.width - 1);
    let y0 = (min_y - 0.5).floor().max(0.0) as u32;
    let y1 = ((max_y - 0.5).ceil().max(0.0) as u32).min(raster.height - 1);

    let stride = raster.width as usize;
    for py in y0..=y1 {
        let cy = py as f32 + 0.5;
        for px in x0..=x1 {
            let c = (px as f32 + 0.5, cy);
            let b0 = edge(p[1], p[2], c) * inv_area;
            let b1 = edge(p[2], p[0], c) * inv_area;
            let b2 = edge(p[0], p[1], c) * inv_area;
            if b0 < -EDGE_EPSILON || b1 < -EDGE_EPSILON || b2 < -EDGE_EPSILON {
                continue;
            }
            let one_over_w = b0 * v[0].inv_w + b1 * v[1].inv_w + b2 * v[2].inv_w;
            if one_over_w <= 0.0 {
                continue;
            }
            let u = (b0 * v[0].u_over_w + b1 * v[1].u_over_w + b2 * v[2].u_over_w) / one_over_w;
            let t = (b0 * v[0].v_over_w + b1 * v[1].v_over_w + b2 * v[2].v_over_w) / one_over_w;
            let s = sample_bilinear(tex, u, t, rect);
            raster.data[py as usize * stride + px as usize] = s.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn clamp_span(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi { (lo + hi) * 0.5 } else { v.clamp(lo, hi) }
}

/// Bilinear sample at atlas coordinate `(u, v)`, clamped half a texel inside `rect`.
fn sample_bilinear(tex: &PlaneView<'_>, u: f32, v: f32, rect: [f32; 4]) -> f32 {
    let (w, h) = (tex.width as f32, tex.height as f32);
    let (hu, hv) = (0.5 / w, 0.5 / h);
    let u = clamp_span(u, rect[0] + hu, rect[0] + rect[2] - hu);
    let v = clamp_span(v, rect[1] + hv, rect[1] + rect[3] - hv);

    let tx = u * w - 0.5;
    let ty = v * h - 0.5;
    let fx = tx.floor();
    let fy = ty.floor();
    let (ax, ay) = (tx - fx, ty - fy);
    let (x0, y0) = (fx as i64, fy as i64);

    let top = tex.texel(x0, y0) * (1.0 - ax) + tex.texel(x0 + 1, y0) * ax;
    let bottom = tex.texel(x0, y0 + 1) * (1.0 - ax) + tex.texel(x0 + 1, y0 + 1) * ax;
    top * (1.0 - ay) + bottom * ay
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
