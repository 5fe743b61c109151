use crate::foundation::core::{Resolution, Rotation};
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::geometry::builder::TileGeometry;
use crate::transform::matrix::Mat4;

/// Near clip plane distance of the view camera.
pub const NEAR_PLANE: f64 = 0.5;
/// Far clip plane distance of the view camera.
pub const FAR_PLANE: f64 = 2.0;

/// Single-channel 8-bit raster produced by one render pass.
///
/// Row 0 is the bottom of normalized device space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed samples, row-major.
    pub data: Vec<u8>,
}

impl Raster {
    /// Allocate a raster filled with `value`.
    pub fn filled(res: Resolution, value: u8) -> Self {
        Self {
            width: res.width,
            height: res.height,
            data: vec![value; res.area()],
        }
    }

    /// Raster dimensions.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Sample at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Borrowed, tightly packed single-channel texture.
#[derive(Clone, Copy, Debug)]
pub struct PlaneView<'a> {
    /// Samples, `width * height` bytes, row-major.
    pub data: &'a [u8],
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl<'a> PlaneView<'a> {
    /// Wrap `data`, checking its length against the dimensions.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> TileviewResult<Self> {
        let needed = Resolution::new(width, height).area();
        if width == 0 || height == 0 || data.len() < needed {
            return Err(TileviewError::render_backend(format!(
                "texture {width}x{height} needs {needed} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Texel at `(x, y)` with coordinates clamped to the edge.
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        f32::from(self.data[y * self.width as usize + x])
    }
}

/// Projection, model and view matrices for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// Perspective projection from the view field of view.
    pub projection: Mat4,
    /// Global view rotation applied to the whole scene.
    pub model: Mat4,
    /// Camera transform; the camera sits at the origin looking down `-z`.
    pub view: Mat4,
}

impl ViewTransform {
    /// Build the transform for a view with the given field of view and rotation.
    pub fn new(fovx: f64, fovy: f64, rotation: Rotation) -> TileviewResult<Self> {
        Ok(Self {
            projection: Mat4::perspective(fovx, fovy, NEAR_PLANE, FAR_PLANE)?,
            model: Mat4::orientation(rotation),
            view: Mat4::IDENTITY,
        })
    }

    /// Combined `projection · view · model`.
    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}

/// Everything one render invocation needs. Nothing is bound between calls.
#[derive(Clone, Copy, Debug)]
pub struct RenderPass<'a> {
    /// Static tile quads.
    pub geometry: &'a TileGeometry,
    /// Per-frame matrices.
    pub transform: &'a ViewTransform,
    /// Source plane sampled through the tiles.
    pub texture: PlaneView<'a>,
    /// Output raster size.
    pub resolution: Resolution,
    /// Value of uncovered pixels.
    pub clear: u8,
}

/// A renderer that samples a plane through tile geometry into a raster.
pub trait RenderBackend {
    /// Render one pass and read the raster back.
    fn render(&mut self, pass: &RenderPass<'_>) -> TileviewResult<Raster>;

    /// Hand a raster back for reuse once its pixels have been copied out.
    fn recycle(&mut self, raster: Raster) {
        drop(raster);
    }

    /// Drop every retained device resource.
    fn release(&mut self) {}
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Software rasterizer, always available.
    #[default]
    Cpu,
}

/// Create a rendering backend implementation.
pub fn create_backend(kind: BackendKind) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuRenderer::default()),
    }
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn render(&mut self, pass: &RenderPass<'_>) -> TileviewResult<Raster> {
        (**self).render(pass)
    }

    fn recycle(&mut self, raster: Raster) {
        (**self).recycle(raster);
    }

    fn release(&mut self) {
        (**self).release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
