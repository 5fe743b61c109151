use crate::foundation::error::{TileviewError, TileviewResult};

/// Rotation triple in degrees about the x, y and z axes.
///
/// Applied to a vector, the y rotation acts first, then x, then z.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rotation {
    /// Degrees about the x axis.
    pub x: f64,
    /// Degrees about the y axis.
    pub y: f64,
    /// Degrees about the z axis.
    pub z: f64,
}

impl Rotation {
    /// No rotation.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Build a rotation from x/y/z degrees.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Pixel dimensions of a raster or plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Build a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolution of a chroma plane for the given log2 subsampling shifts.
    pub const fn subsampled(self, hsub: u8, vsub: u8) -> Self {
        Self {
            width: self.width >> hsub,
            height: self.height >> vsub,
        }
    }

    /// Number of pixels.
    pub fn area(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rational number `num/den`, used for time bases and sample aspect ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rational {
    /// Numerator.
    pub num: i32,
    /// Denominator, must be non-zero.
    pub den: i32,
}

impl Rational {
    /// `1/1`.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Create a validated rational.
    pub fn new(num: i32, den: i32) -> TileviewResult<Self> {
        if den == 0 {
            return Err(TileviewError::invalid_parameter(
                "rational denominator must be non-zero",
            ));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating point.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Reduce `num/den` by their gcd, saturating into `i32`.
    ///
    /// A zero denominator yields `0/1`.
    pub fn reduce(num: i64, den: i64) -> Self {
        if den == 0 {
            return Self { num: 0, den: 1 };
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        let (mut n, mut d) = (num / g, den / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        // Scale down until both fit; precision loss is acceptable for aspect ratios.
        while n.abs() > i64::from(i32::MAX) || d > i64::from(i32::MAX) {
            n /= 2;
            d = (d / 2).max(1);
        }
        Self {
            num: n as i32,
            den: d as i32,
        }
    }

    /// Return `true` when the numerator is zero (unknown aspect ratio).
    pub fn is_zero(self) -> bool {
        self.num == 0
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
