use std::ops::Mul;

use crate::foundation::core::Rotation;
use crate::foundation::error::{TileviewError, TileviewResult};

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

/// Convert radians to degrees.
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

/// Homogeneous 4-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

impl Vec4 {
    /// Build a vector from components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Build a point (`w = 1`).
    pub const fn point(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    /// Components as an array.
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Build from an array.
    pub const fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

/// Row-major 4×4 homogeneous transform. The default value is the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    /// Elements, row-major: `m[row * 4 + col]`.
    pub m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Element at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.m[row * 4 + col]
    }

    /// Standard matrix product `self · rhs`.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [0.0f32; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = (0..4).map(|k| self.at(row, k) * rhs.at(k, col)).sum();
            }
        }
        Mat4 { m: out }
    }

    /// Transform a column vector: `self · v`.
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let a = v.to_array();
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|col| self.at(row, col) * a[col]).sum();
        }
        Vec4::from_array(out)
    }

    /// Transposed matrix. For pure rotations this is the inverse.
    pub fn transpose(&self) -> Mat4 {
        let mut out = [0.0f32; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[col * 4 + row] = self.at(row, col);
            }
        }
        Mat4 { m: out }
    }

    /// Rotation about the x axis by `deg` degrees (right-hand rule).
    pub fn rotation_x(deg: f64) -> Mat4 {
        let (s, c) = sin_cos_deg(deg);
        Mat4 {
            m: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, c, -s, 0.0, //
                0.0, s, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Rotation about the y axis by `deg` degrees (right-hand rule).
    pub fn rotation_y(deg: f64) -> Mat4 {
        let (s, c) = sin_cos_deg(deg);
        Mat4 {
            m: [
                c, 0.0, s, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                -s, 0.0, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Rotation about the z axis by `deg` degrees (right-hand rule).
    pub fn rotation_z(deg: f64) -> Mat4 {
        let (s, c) = sin_cos_deg(deg);
        Mat4 {
            m: [
                c, -s, 0.0, 0.0, //
                s, c, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Right-multiply by a rotation about x.
    pub fn rotate_x(&self, deg: f64) -> Mat4 {
        self.multiply(&Mat4::rotation_x(deg))
    }

    /// Right-multiply by a rotation about y.
    pub fn rotate_y(&self, deg: f64) -> Mat4 {
        self.multiply(&Mat4::rotation_y(deg))
    }

    /// Right-multiply by a rotation about z.
    pub fn rotate_z(&self, deg: f64) -> Mat4 {
        self.multiply(&Mat4::rotation_z(deg))
    }

    /// Right-multiply by a diagonal scale.
    pub fn scale(&self, x: f32, y: f32, z: f32) -> Mat4 {
        let mut s = Mat4::IDENTITY;
        s.m[0] = x;
        s.m[5] = y;
        s.m[10] = z;
        self.multiply(&s)
    }

    /// Right-multiply by a translation.
    pub fn translate(&self, x: f32, y: f32, z: f32) -> Mat4 {
        let mut t = Mat4::IDENTITY;
        t.m[3] = x;
        t.m[7] = y;
        t.m[11] = z;
        self.multiply(&t)
    }

    /// Orientation matrix `Rz · Rx · Ry`: y acts first on a vector, then x, then z.
    pub fn orientation(rot: Rotation) -> Mat4 {
        Mat4::IDENTITY
            .rotate_z(rot.z)
            .rotate_x(rot.x)
            .rotate_y(rot.y)
    }

    /// Perspective projection from horizontal/vertical field of view (degrees).
    ///
    /// OpenGL-style right-handed clip space: the camera looks down `-z` and depth maps to
    /// `[-1, 1]` between `near` and `far`.
    pub fn perspective(fovx: f64, fovy: f64, near: f64, far: f64) -> TileviewResult<Mat4> {
        validate_fov("fovx", fovx)?;
        validate_fov("fovy", fovy)?;
        if !(near.is_finite() && far.is_finite()) || near <= 0.0 || near >= far {
            return Err(TileviewError::invalid_parameter(format!(
                "clip planes must satisfy 0 < near < far (near={near}, far={far})"
            )));
        }

        let x_scale = cotangent_deg(fovx / 2.0);
        let y_scale = cotangent_deg(fovy / 2.0);
        let frustum_length = far - near;

        let mut out = Mat4 { m: [0.0; 16] };
        out.m[0] = x_scale as f32;
        out.m[5] = y_scale as f32;
        out.m[10] = (-(far + near) / frustum_length) as f32;
        out.m[11] = (-(2.0 * near * far) / frustum_length) as f32;
        out.m[14] = -1.0;
        Ok(out)
    }

    /// Largest absolute elementwise difference.
    pub fn max_abs_diff(&self, other: &Mat4) -> f32 {
        self.m
            .iter()
            .zip(other.m.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        self.transform(rhs)
    }
}

/// Validate a field-of-view angle in degrees: finite and inside `(0, 180)`.
pub(crate) fn validate_fov(name: &str, deg: f64) -> TileviewResult<()> {
    if !deg.is_finite() || deg <= 0.0 || deg >= 180.0 {
        return Err(TileviewError::invalid_parameter(format!(
            "{name} must be in (0, 180) degrees, got {deg}"
        )));
    }
    Ok(())
}

fn sin_cos_deg(deg: f64) -> (f32, f32) {
    let (s, c) = deg_to_rad(deg).sin_cos();
    (s as f32, c as f32)
}

fn cotangent_deg(deg: f64) -> f64 {
    1.0 / deg_to_rad(deg).tan()
}

#[cfg(test)]
#[path = "../../tests/unit/transform/matrix.rs"]
mod tests;
