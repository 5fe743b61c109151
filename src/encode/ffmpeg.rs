use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::video::VideoFrame;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Encoder pixel format, `None` keeps the input format.
    pub encode_pix_fmt: Option<String>,
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            encode_pix_fmt: Some("yuv420p".to_owned()),
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams planar raw frames to stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> TileviewResult<()> {
        if cfg.fps.num <= 0 || cfg.fps.den <= 0 {
            return Err(TileviewError::invalid_parameter("fps must be positive"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TileviewError::configuration(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(TileviewError::configuration(
                "ffmpeg sink width/height must be even (required for h264 output)",
            ));
        }

        // rawvideo chroma planes round up; packed frames only match whole chroma blocks.
        let (hsub, vsub) = (cfg.format.log2_chroma_w(), cfg.format.log2_chroma_h());
        if !cfg.width.is_multiple_of(1 << hsub) || !cfg.height.is_multiple_of(1 << vsub) {
            return Err(TileviewError::configuration(format!(
                "ffmpeg sink size {}x{} is not a multiple of the {} chroma block",
                cfg.width, cfg.height, cfg.format
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(TileviewError::configuration(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(TileviewError::configuration(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args(input_args(&cfg));
        cmd.args(["-an", "-c:v", "libx264"]);
        if let Some(pix_fmt) = self.opts.encode_pix_fmt.as_deref() {
            cmd.args(["-pix_fmt", pix_fmt]);
        }
        if !cfg.sar.is_zero() {
            cmd.args(["-vf", &format!("setsar={}", cfg.sar)]);
        }
        cmd.args(["-movflags", "+faststart"]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            TileviewError::configuration(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TileviewError::frame("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TileviewError::frame("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::info!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            pix_fmt = cfg.format.name(),
            fps = %cfg.fps,
            "ffmpeg sink started"
        );
        self.scratch = Vec::with_capacity(frame_bytes(&cfg));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &VideoFrame) -> TileviewResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TileviewError::frame("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(TileviewError::frame(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height || frame.format != cfg.format {
            return Err(TileviewError::frame(format!(
                "frame mismatch: got {} {}x{}, expected {} {}x{}",
                frame.format, frame.width, frame.height, cfg.format, cfg.width, cfg.height
            )));
        }
        pack_planes(frame, &mut self.scratch)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TileviewError::frame("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            TileviewError::frame(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> TileviewResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TileviewError::frame("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            TileviewError::frame(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TileviewError::frame("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| TileviewError::frame(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(TileviewError::frame(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

fn input_args(cfg: &SinkConfig) -> Vec<String> {
    // For rawvideo input, `-r` goes before `-i` to set the input frame rate.
    [
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        cfg.format.name(),
        "-s",
        &format!("{}x{}", cfg.width, cfg.height),
        "-r",
        &cfg.fps.to_string(),
        "-i",
        "pipe:0",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

fn frame_bytes(cfg: &SinkConfig) -> usize {
    let res = crate::foundation::core::Resolution::new(cfg.width, cfg.height);
    (0..cfg.format.plane_count())
        .map(|i| cfg.format.plane_resolution(i, res).area())
        .sum()
}

/// Copy every plane row by row into `dst`, dropping stride padding.
pub(crate) fn pack_planes(frame: &VideoFrame, dst: &mut Vec<u8>) -> TileviewResult<()> {
    frame.validate()?;
    dst.clear();
    for plane in &frame.planes {
        for y in 0..plane.height {
            dst.extend_from_slice(plane.row(y));
        }
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> TileviewResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
