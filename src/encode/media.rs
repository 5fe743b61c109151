use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout};

use crate::encode::sink::FrameSource;
use crate::foundation::core::{Rational, Resolution};
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::pixfmt::PixFmt;
use crate::frame::video::VideoFrame;

/// Basic metadata about a source video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Luma dimensions.
    pub resolution: Resolution,
    /// Decoded pixel format; unsupported source formats are converted to `yuv420p`.
    pub format: PixFmt,
    /// Average frame rate.
    pub frame_rate: Rational,
    /// Sample aspect ratio, `0/1` when unknown.
    pub sar: Rational,
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> TileviewResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        pix_fmt: Option<String>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
        sample_aspect_ratio: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = std::process::Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| TileviewError::configuration(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(TileviewError::configuration(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| TileviewError::configuration(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| TileviewError::configuration("no video stream found"))?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(TileviewError::configuration(
            "missing video dimensions from ffprobe",
        ));
    };
    let frame_rate = [video.avg_frame_rate.as_deref(), video.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|r| parse_ratio(r, '/').filter(|r| r.num > 0))
        .ok_or_else(|| TileviewError::configuration("missing video frame rate from ffprobe"))?;

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        resolution: Resolution::new(width, height),
        format: decode_format(video.pix_fmt.as_deref()),
        frame_rate,
        sar: video
            .sample_aspect_ratio
            .as_deref()
            .and_then(|s| parse_ratio(s, ':'))
            .unwrap_or(Rational { num: 0, den: 1 }),
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> TileviewResult<VideoSourceInfo> {
    Err(TileviewError::configuration(
        "video input requires the 'media-ffmpeg' feature",
    ))
}

/// Parse `num<sep>den` as reported by ffprobe; a zero denominator is rejected.
pub(crate) fn parse_ratio(s: &str, sep: char) -> Option<Rational> {
    let (num, den) = s.split_once(sep)?;
    Rational::new(num.trim().parse().ok()?, den.trim().parse().ok()?).ok()
}

/// Pixel format to decode into: the source's own when supported, `yuv420p` otherwise.
pub(crate) fn decode_format(src: Option<&str>) -> PixFmt {
    src.and_then(|name| PixFmt::from_name(name).ok())
        .unwrap_or(PixFmt::Yuv420p)
}

/// Frame source decoding a video file through the system `ffmpeg`.
///
/// Frames are numbered from zero; `pts` counts frames in a `1/fps` time base.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub struct FfmpegSource {
    info: VideoSourceInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    next_index: i64,
}

impl FfmpegSource {
    /// Probe `path` and start decoding it.
    #[cfg(feature = "media-ffmpeg")]
    pub fn open(path: &Path) -> TileviewResult<Self> {
        use std::process::{Command, Stdio};

        let info = probe_video(path)?;
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-f",
                "rawvideo",
                "-pix_fmt",
                info.format.name(),
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                TileviewError::configuration(format!("failed to run ffmpeg for decode: {e}"))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TileviewError::frame("failed to open ffmpeg stdout (unexpected)"))?;
        tracing::info!(
            path = %path.display(),
            width = info.resolution.width,
            height = info.resolution.height,
            pix_fmt = info.format.name(),
            fps = %info.frame_rate,
            "ffmpeg source opened"
        );
        Ok(Self {
            info,
            child: Some(child),
            stdout: Some(stdout),
            next_index: 0,
        })
    }

    /// Probe `path` and start decoding it.
    ///
    /// Returns an error when `media-ffmpeg` feature is disabled.
    #[cfg(not(feature = "media-ffmpeg"))]
    pub fn open(path: &Path) -> TileviewResult<Self> {
        probe_video(path).map(|info| Self {
            info,
            child: None,
            stdout: None,
            next_index: 0,
        })
    }

    /// Probed stream metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn finish(&mut self) -> TileviewResult<()> {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| TileviewError::frame(format!("failed to wait for ffmpeg: {e}")))?;
            if !status.success() {
                return Err(TileviewError::frame(format!(
                    "ffmpeg decode of '{}' exited with status {status}",
                    self.info.source_path.display()
                )));
            }
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn frame_rate(&self) -> Rational {
        self.info.frame_rate
    }

    fn sample_aspect_ratio(&self) -> Rational {
        self.info.sar
    }

    fn next_frame(&mut self) -> TileviewResult<Option<VideoFrame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut frame = VideoFrame::new(self.info.format, self.info.resolution)?;
        match read_planes(stdout, &mut frame)? {
            ReadOutcome::Frame => {}
            ReadOutcome::Eof => {
                self.finish()?;
                return Ok(None);
            }
        }
        frame.pts = Some(self.next_index);
        frame.time_base = Rational::new(self.info.frame_rate.den, self.info.frame_rate.num)?;
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    Frame,
    Eof,
}

/// Plane size as ffmpeg lays it out in rawvideo: chroma dimensions round up.
pub(crate) fn wire_resolution(format: PixFmt, plane: usize, luma: Resolution) -> Resolution {
    match plane {
        1 | 2 => {
            let (hsub, vsub) = (format.log2_chroma_w(), format.log2_chroma_h());
            Resolution::new(
                luma.width.div_ceil(1 << hsub),
                luma.height.div_ceil(1 << vsub),
            )
        }
        _ => luma,
    }
}

/// Fill the planes of `frame` from one rawvideo frame in `reader`.
///
/// Chroma rows and columns past `w >> hsub` / `h >> vsub` are read and dropped. A clean end
/// of stream before the first byte is `Eof`; a truncated frame is an error.
pub(crate) fn read_planes(
    reader: &mut impl std::io::Read,
    frame: &mut VideoFrame,
) -> TileviewResult<ReadOutcome> {
    let luma = frame.resolution();
    let format = frame.format;
    let mut row = Vec::new();
    let mut started = false;
    for (index, plane) in frame.planes.iter_mut().enumerate() {
        let wire = wire_resolution(format, index, luma);
        row.resize(wire.width as usize, 0);
        for y in 0..wire.height {
            if !read_full(reader, &mut row, started)? {
                return Ok(ReadOutcome::Eof);
            }
            started = true;
            if y < plane.height {
                let keep = plane.width as usize;
                plane.row_mut(y).copy_from_slice(&row[..keep]);
            }
        }
    }
    Ok(ReadOutcome::Frame)
}

/// Fill `buf` completely; `Ok(false)` is a clean end of stream before a frame starts.
fn read_full(
    reader: &mut impl std::io::Read,
    buf: &mut [u8],
    started: bool,
) -> TileviewResult<bool> {
    let mut off = 0;
    while off < buf.len() {
        let n = match reader.read(&mut buf[off..]) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(TileviewError::frame(format!(
                    "failed to read decoded frame: {e}"
                )));
            }
        };
        if n == 0 {
            if !started && off == 0 {
                return Ok(false);
            }
            return Err(TileviewError::frame("decoded frame is truncated"));
        }
        off += n;
    }
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/media.rs"]
mod tests;
