use crate::foundation::core::{Rational, Resolution};
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::pixfmt::PixFmt;

/// One 8-bit image plane with a row stride that may exceed its width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane {
    /// Pixel rows, `linesize` bytes apart.
    pub data: Vec<u8>,
    /// Distance in bytes between the starts of consecutive rows.
    pub linesize: usize,
    /// Visible width in pixels.
    pub width: u32,
    /// Height in rows.
    pub height: u32,
}

impl Plane {
    /// Allocate a zeroed plane with `linesize == width`.
    pub fn new(res: Resolution) -> Self {
        Self::with_linesize(res, res.width as usize)
    }

    /// Allocate a zeroed plane with an explicit stride (clamped to at least the width).
    pub fn with_linesize(res: Resolution, linesize: usize) -> Self {
        let linesize = linesize.max(res.width as usize);
        Self {
            data: vec![0; linesize * res.height as usize],
            linesize,
            width: res.width,
            height: res.height,
        }
    }

    /// Plane dimensions.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Visible bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.linesize;
        &self.data[start..start + self.width as usize]
    }

    /// Mutable visible bytes of row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.linesize;
        &mut self.data[start..start + self.width as usize]
    }

    /// Sample at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.linesize + x as usize]
    }

    /// Set every visible sample to `value`.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    fn check(&self, index: usize, expected: Resolution) -> TileviewResult<()> {
        if self.resolution() != expected {
            return Err(TileviewError::frame(format!(
                "plane {index} is {}x{}, expected {}x{}",
                self.width, self.height, expected.width, expected.height
            )));
        }
        if self.linesize < self.width as usize {
            return Err(TileviewError::frame(format!(
                "plane {index} linesize {} is smaller than its width {}",
                self.linesize, self.width
            )));
        }
        let needed = match self.height {
            0 => 0,
            h => self.linesize * (h as usize - 1) + self.width as usize,
        };
        if self.data.len() < needed {
            return Err(TileviewError::frame(format!(
                "plane {index} holds {} bytes, needs {needed}",
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Stream-level properties shared by every frame of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamProps {
    /// Pixel format.
    pub format: PixFmt,
    /// Luma dimensions.
    pub resolution: Resolution,
    /// Sample aspect ratio; `0/1` when unknown.
    pub sar: Rational,
    /// Time base of frame timestamps.
    pub time_base: Rational,
}

impl StreamProps {
    /// Properties with square pixels and the given time base.
    pub fn new(format: PixFmt, resolution: Resolution, time_base: Rational) -> Self {
        Self {
            format,
            resolution,
            sar: Rational::ONE,
            time_base,
        }
    }
}

/// A decoded planar YUV frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// Pixel format of `planes`.
    pub format: PixFmt,
    /// Luma width.
    pub width: u32,
    /// Luma height.
    pub height: u32,
    /// Y, U, V and (optional) alpha planes, in that order.
    pub planes: Vec<Plane>,
    /// Presentation timestamp in `time_base` units.
    pub pts: Option<i64>,
    /// Time base of `pts`.
    pub time_base: Rational,
    /// Byte position in the container, when known.
    pub pos: Option<i64>,
}

impl VideoFrame {
    /// Allocate a zeroed frame with tightly packed planes.
    pub fn new(format: PixFmt, res: Resolution) -> TileviewResult<Self> {
        Self::with_padding(format, res, 0)
    }

    /// Allocate a zeroed frame whose rows carry `pad` extra bytes each.
    pub fn with_padding(format: PixFmt, res: Resolution, pad: usize) -> TileviewResult<Self> {
        if res.is_empty() {
            return Err(TileviewError::frame(format!(
                "frame size must be non-zero, got {}x{}",
                res.width, res.height
            )));
        }
        let planes = (0..format.plane_count())
            .map(|i| {
                let pr = format.plane_resolution(i, res);
                Plane::with_linesize(pr, pr.width as usize + pad)
            })
            .collect();
        Ok(Self {
            format,
            width: res.width,
            height: res.height,
            planes,
            pts: None,
            time_base: Rational::ONE,
            pos: None,
        })
    }

    /// Allocate a frame with every plane filled uniformly (alpha at full opacity).
    pub fn filled(format: PixFmt, res: Resolution, yuv: [u8; 3]) -> TileviewResult<Self> {
        let mut f = Self::new(format, res)?;
        for (i, p) in f.planes.iter_mut().enumerate() {
            p.fill(yuv.get(i).copied().unwrap_or(u8::MAX));
        }
        Ok(f)
    }

    /// Luma dimensions.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Presentation time in seconds, `None` without a timestamp.
    pub fn time_seconds(&self) -> Option<f64> {
        self.pts
            .filter(|_| self.time_base.den != 0)
            .map(|pts| pts as f64 * self.time_base.as_f64())
    }

    /// Check plane count, plane sizes and strides against the format.
    pub fn validate(&self) -> TileviewResult<()> {
        if self.planes.len() != self.format.plane_count() {
            return Err(TileviewError::frame(format!(
                "{} frame has {} planes, expected {}",
                self.format,
                self.planes.len(),
                self.format.plane_count()
            )));
        }
        let res = self.resolution();
        for (i, p) in self.planes.iter().enumerate() {
            p.check(i, self.format.plane_resolution(i, res))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/video.rs"]
mod tests;
