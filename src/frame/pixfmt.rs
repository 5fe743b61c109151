use crate::foundation::core::Resolution;
use crate::foundation::error::{TileviewError, TileviewResult};

/// Planar 8-bit YUV layouts accepted by the projection pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixFmt {
    /// 4:2:0, limited range.
    Yuv420p,
    /// 4:2:2, limited range.
    Yuv422p,
    /// 4:4:4, limited range.
    Yuv444p,
    /// 4:1:0 (chroma quartered both ways).
    Yuv410p,
    /// 4:1:1 (chroma quartered horizontally).
    Yuv411p,
    /// 4:4:0 (chroma halved vertically).
    Yuv440p,
    /// 4:2:0, full range.
    Yuvj420p,
    /// 4:2:2, full range.
    Yuvj422p,
    /// 4:4:4, full range.
    Yuvj444p,
    /// 4:2:0 with alpha.
    Yuva420p,
    /// 4:2:2 with alpha.
    Yuva422p,
    /// 4:4:4 with alpha.
    Yuva444p,
}

const ALL: [PixFmt; 12] = [
    PixFmt::Yuv420p,
    PixFmt::Yuv422p,
    PixFmt::Yuv444p,
    PixFmt::Yuv410p,
    PixFmt::Yuv411p,
    PixFmt::Yuv440p,
    PixFmt::Yuvj420p,
    PixFmt::Yuvj422p,
    PixFmt::Yuvj444p,
    PixFmt::Yuva420p,
    PixFmt::Yuva422p,
    PixFmt::Yuva444p,
];

impl PixFmt {
    /// Every supported format.
    pub fn all() -> &'static [PixFmt] {
        &ALL
    }

    /// Look a format up by its ffmpeg name (`yuv420p`, ...).
    pub fn from_name(name: &str) -> TileviewResult<Self> {
        ALL.iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| {
                TileviewError::configuration(format!("unsupported pixel format '{name}'"))
            })
    }

    /// ffmpeg name of the format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv410p => "yuv410p",
            Self::Yuv411p => "yuv411p",
            Self::Yuv440p => "yuv440p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuvj422p => "yuvj422p",
            Self::Yuvj444p => "yuvj444p",
            Self::Yuva420p => "yuva420p",
            Self::Yuva422p => "yuva422p",
            Self::Yuva444p => "yuva444p",
        }
    }

    /// log2 horizontal chroma subsampling.
    pub fn log2_chroma_w(self) -> u8 {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuvj420p | Self::Yuvj422p => 1,
            Self::Yuva420p | Self::Yuva422p => 1,
            Self::Yuv410p | Self::Yuv411p => 2,
            Self::Yuv444p | Self::Yuv440p | Self::Yuvj444p | Self::Yuva444p => 0,
        }
    }

    /// log2 vertical chroma subsampling.
    pub fn log2_chroma_h(self) -> u8 {
        match self {
            Self::Yuv420p | Self::Yuvj420p | Self::Yuva420p | Self::Yuv440p => 1,
            Self::Yuv410p => 2,
            _ => 0,
        }
    }

    /// Return `true` when the format carries a fourth (alpha) plane.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Yuva420p | Self::Yuva422p | Self::Yuva444p)
    }

    /// Return `true` for the full-range (`yuvj*`) variants.
    pub fn is_full_range(self) -> bool {
        matches!(self, Self::Yuvj420p | Self::Yuvj422p | Self::Yuvj444p)
    }

    /// Number of planes, alpha included.
    pub fn plane_count(self) -> usize {
        if self.has_alpha() { 4 } else { 3 }
    }

    /// Dimensions of `plane` for a frame of size `luma`.
    ///
    /// Planes 1 and 2 are chroma; 0 and 3 (alpha) match the luma size.
    pub fn plane_resolution(self, plane: usize, luma: Resolution) -> Resolution {
        match plane {
            1 | 2 => luma.subsampled(self.log2_chroma_w(), self.log2_chroma_h()),
            _ => luma,
        }
    }
}

impl std::fmt::Display for PixFmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PixFmt {
    type Err = TileviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/pixfmt.rs"]
mod tests;
