use std::path::PathBuf;

/// Convenience result type used across tileview.
pub type TileviewResult<T> = Result<T, TileviewError>;

/// Top-level error taxonomy used by projection APIs.
///
/// Every variant is recoverable: backends and the frame pipeline report failures through this
/// type and leave the decision to abort the stream (or the process) to the host.
#[derive(thiserror::Error, Debug)]
pub enum TileviewError {
    /// A numeric parameter is outside its valid domain (fov, clip planes, option ranges).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Stream setup failed (output size, pixel format, frame/config mismatch).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A layout line could not be parsed.
    #[error("malformed layout {source_name} line {line}: {reason}")]
    MalformedLayout {
        /// File path or `<builtin>` for the default cube.
        source_name: String,
        /// 1-based physical line number (0 when the error concerns the whole file).
        line: usize,
        /// What was wrong, including expected vs. found field counts.
        reason: String,
    },

    /// An orientation line could not be parsed.
    #[error("malformed orientation {source_name} line {line}: {reason}")]
    MalformedOrientation {
        /// File path of the orientation track.
        source_name: String,
        /// 1-based physical line number.
        line: usize,
        /// What was wrong, including expected vs. found field counts.
        reason: String,
    },

    /// A tile descriptor cannot be turned into geometry.
    #[error("invalid tile {index}: {reason}")]
    InvalidTile {
        /// 0-based tile index in layout order.
        index: usize,
        /// Offending value.
        reason: String,
    },

    /// Size/offset expression failed to parse or evaluate.
    #[error("expression error: {0}")]
    Expression(String),

    /// The render backend could not produce a raster.
    #[error("render backend error: {0}")]
    RenderBackend(String),

    /// Processing of a single frame failed.
    #[error("frame error: {0}")]
    Frame(String),

    /// Reading an input file failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TileviewError {
    /// Build a [`TileviewError::InvalidParameter`] value.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Build a [`TileviewError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`TileviewError::MalformedLayout`] value.
    pub fn malformed_layout(
        source_name: impl Into<String>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedLayout {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Build a [`TileviewError::MalformedOrientation`] value.
    pub fn malformed_orientation(
        source_name: impl Into<String>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedOrientation {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Build a [`TileviewError::InvalidTile`] value.
    pub fn invalid_tile(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidTile {
            index,
            reason: reason.into(),
        }
    }

    /// Build a [`TileviewError::Expression`] value.
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Build a [`TileviewError::RenderBackend`] value.
    pub fn render_backend(msg: impl Into<String>) -> Self {
        Self::RenderBackend(msg.into())
    }

    /// Build a [`TileviewError::Frame`] value.
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Build a [`TileviewError::Io`] value.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
