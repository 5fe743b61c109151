use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::error::{TileviewError, TileviewResult};
use crate::transform::matrix::validate_fov;

/// User-facing projection options.
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectOptions {
    /// Output width expression.
    #[serde(alias = "out_w")]
    pub w: String,
    /// Output height expression.
    #[serde(alias = "out_h")]
    pub h: String,
    /// Horizontal crop offset expression.
    pub x: String,
    /// Vertical crop offset expression.
    pub y: String,
    /// Horizontal field of view of the view camera, degrees.
    pub fovx: f64,
    /// Vertical field of view of the view camera, degrees.
    pub fovy: f64,
    /// Default rotation about x, degrees.
    pub xr: f64,
    /// Default rotation about y, degrees.
    pub yr: f64,
    /// Default rotation about z, degrees.
    pub zr: f64,
    /// Orientation track file. An empty path means none.
    #[serde(deserialize_with = "empty_path_as_none")]
    pub orfile: Option<PathBuf>,
    /// Tile layout file. The built-in cube is used when unset or empty.
    #[serde(deserialize_with = "empty_path_as_none")]
    pub lofile: Option<PathBuf>,
    /// Tolerance in seconds added to the frame time for orientation lookup.
    pub timebase: f64,
    /// Field-of-view expansion coefficient.
    pub ecoef: f64,
    /// Derive the output sample aspect ratio from the input display aspect ratio.
    pub keep_aspect: bool,
    /// Disable rounding of sizes and offsets to the chroma subsampling grid.
    pub exact: bool,
    /// Value written to uncovered pixels, per plane (Y, U, V).
    pub clear_yuv: [u8; 3],
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            w: "iw".to_owned(),
            h: "ih".to_owned(),
            x: "(in_w-out_w)/2".to_owned(),
            y: "(in_h-out_h)/2".to_owned(),
            fovx: 90.0,
            fovy: 90.0,
            xr: 0.0,
            yr: 0.0,
            zr: 0.0,
            orfile: None,
            lofile: None,
            timebase: 0.0,
            ecoef: 1.0,
            keep_aspect: false,
            exact: false,
            clear_yuv: [0, 0, 0],
        }
    }
}

/// Upper bound of the `timebase` tolerance option.
pub const MAX_TIMEBASE_TOLERANCE: f64 = 999_999.0;

impl ProjectOptions {
    /// Parse options from a JSON reader and validate them.
    pub fn from_reader<R: std::io::Read>(r: R) -> TileviewResult<Self> {
        let opts: ProjectOptions = serde_json::from_reader(r)
            .map_err(|e| TileviewError::configuration(format!("parse options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk and validate them.
    pub fn from_path(path: impl AsRef<Path>) -> TileviewResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| TileviewError::io(path, e))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every option against its documented range.
    pub fn validate(&self) -> TileviewResult<()> {
        for (name, expr) in [("w", &self.w), ("h", &self.h), ("x", &self.x), ("y", &self.y)] {
            if expr.trim().is_empty() {
                return Err(TileviewError::invalid_parameter(format!(
                    "option '{name}' must not be empty"
                )));
            }
        }
        validate_fov("fovx", self.fovx)?;
        validate_fov("fovy", self.fovy)?;
        for (name, v) in [("xr", self.xr), ("yr", self.yr), ("zr", self.zr)] {
            check_range(name, v, -360.0, 360.0)?;
        }
        check_range("timebase", self.timebase, 0.0, MAX_TIMEBASE_TOLERANCE)?;
        check_range("ecoef", self.ecoef, 0.8, 1.2)?;
        Ok(())
    }

    /// Set a single option from its textual value.
    ///
    /// Accepts the same names as the JSON form, including the `out_w`/`out_h` aliases. The
    /// options are left untouched when the key is unknown or the value does not parse or
    /// validate.
    pub fn set(&mut self, key: &str, value: &str) -> TileviewResult<()> {
        let mut next = self.clone();
        match key {
            "w" | "out_w" => next.w = value.to_owned(),
            "h" | "out_h" => next.h = value.to_owned(),
            "x" => next.x = value.to_owned(),
            "y" => next.y = value.to_owned(),
            "fovx" => next.fovx = parse_f64(key, value)?,
            "fovy" => next.fovy = parse_f64(key, value)?,
            "xr" => next.xr = parse_f64(key, value)?,
            "yr" => next.yr = parse_f64(key, value)?,
            "zr" => next.zr = parse_f64(key, value)?,
            "orfile" => next.orfile = non_empty_path(value),
            "lofile" => next.lofile = non_empty_path(value),
            "timebase" => next.timebase = parse_f64(key, value)?,
            "ecoef" => next.ecoef = parse_f64(key, value)?,
            "keep_aspect" => next.keep_aspect = parse_bool(key, value)?,
            "exact" => next.exact = parse_bool(key, value)?,
            "clear_yuv" => next.clear_yuv = parse_yuv(key, value)?,
            _ => {
                return Err(TileviewError::invalid_parameter(format!(
                    "unknown option '{key}'"
                )));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn check_range(name: &str, v: f64, lo: f64, hi: f64) -> TileviewResult<()> {
    if !v.is_finite() || v < lo || v > hi {
        return Err(TileviewError::invalid_parameter(format!(
            "{name} must be in [{lo}, {hi}], got {v}"
        )));
    }
    Ok(())
}

fn parse_f64(key: &str, value: &str) -> TileviewResult<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        TileviewError::invalid_parameter(format!("option '{key}' expects a number, got '{value}'"))
    })
}

fn parse_bool(key: &str, value: &str) -> TileviewResult<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(TileviewError::invalid_parameter(format!(
            "option '{key}' expects a boolean, got '{value}'"
        ))),
    }
}

/// `Y,U,V` byte triple, e.g. `16,128,128`.
fn parse_yuv(key: &str, value: &str) -> TileviewResult<[u8; 3]> {
    let bad = || {
        TileviewError::invalid_parameter(format!(
            "option '{key}' expects three comma-separated bytes, got '{value}'"
        ))
    };
    let mut out = [0u8; 3];
    let mut parts = value.split(',');
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|p| p.trim().parse::<u8>().ok())
            .ok_or_else(bad)?;
    }
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok(out)
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn empty_path_as_none<'de, D>(de: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<PathBuf> = serde::Deserialize::deserialize(de)?;
    Ok(raw.filter(|p| !p.as_os_str().is_empty()))
}

#[cfg(test)]
#[path = "../../tests/unit/config/options.rs"]
mod tests;
