use std::path::Path;

use crate::foundation::core::Rotation;
use crate::foundation::error::{TileviewError, TileviewResult};

/// Number of whitespace-separated fields in an orientation line.
pub const ORIENTATION_FIELDS: usize = 5;

/// A view rotation that takes effect at `timestamp`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrientationSample {
    /// Seconds from the start of the stream.
    pub timestamp: f64,
    /// View rotation from this sample on.
    pub rotation: Rotation,
}

/// Samples ordered by non-decreasing timestamp, queried with a step-hold lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrientationTrack {
    samples: Vec<OrientationSample>,
}

impl OrientationTrack {
    /// Build a track from samples, rejecting decreasing or non-finite timestamps.
    pub fn from_samples(samples: Vec<OrientationSample>) -> TileviewResult<Self> {
        for (i, s) in samples.iter().enumerate() {
            if !s.timestamp.is_finite() {
                return Err(TileviewError::invalid_parameter(format!(
                    "orientation sample {i} has non-finite timestamp"
                )));
            }
            if i > 0 && s.timestamp < samples[i - 1].timestamp {
                return Err(TileviewError::invalid_parameter(format!(
                    "orientation sample {i} goes back in time ({} < {})",
                    s.timestamp,
                    samples[i - 1].timestamp
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Load the track at `path`; no path (or an empty one) yields an empty track.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> TileviewResult<Self> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| TileviewError::io(path, e))?;
        let track = Self::parse(&path.display().to_string(), &text)?;
        tracing::info!(path = %path.display(), samples = track.len(), "loaded orientation track");
        Ok(track)
    }

    /// Parse `timestamp <ignored> x y z` records, one per non-blank line.
    pub fn parse(source_name: &str, text: &str) -> TileviewResult<Self> {
        let mut samples: Vec<OrientationSample> = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let fields: Vec<&str> = raw.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != ORIENTATION_FIELDS {
                return Err(TileviewError::malformed_orientation(
                    source_name,
                    line_no,
                    format!(
                        "expected {ORIENTATION_FIELDS} fields, found {}",
                        fields.len()
                    ),
                ));
            }
            let mut v = [0.0f64; ORIENTATION_FIELDS];
            for (slot, field) in v.iter_mut().zip(&fields) {
                *slot = field
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| {
                        TileviewError::malformed_orientation(
                            source_name,
                            line_no,
                            format!("'{field}' is not a finite number"),
                        )
                    })?;
            }
            if let Some(prev) = samples.last()
                && v[0] < prev.timestamp
            {
                return Err(TileviewError::malformed_orientation(
                    source_name,
                    line_no,
                    format!(
                        "timestamp {} is earlier than the previous sample ({})",
                        v[0], prev.timestamp
                    ),
                ));
            }
            samples.push(OrientationSample {
                timestamp: v[0],
                rotation: Rotation::new(v[2], v[3], v[4]),
            });
        }
        Ok(Self { samples })
    }

    /// Rotation in effect at `time`: the last sample whose timestamp does not exceed
    /// `time + tolerance`, or `default` when none does.
    ///
    /// A missing or NaN time selects `default`.
    pub fn rotation_for(&self, time: Option<f64>, tolerance: f64, default: Rotation) -> Rotation {
        let Some(t) = time.filter(|t| !t.is_nan()) else {
            return default;
        };
        let limit = t + tolerance;
        let n = self.samples.partition_point(|s| s.timestamp <= limit);
        match n {
            0 => default,
            n => self.samples[n - 1].rotation,
        }
    }

    /// Samples in time order.
    pub fn samples(&self) -> &[OrientationSample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Return `true` when the track has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orientation/track.rs"]
mod tests;
