//! BT.601 conversion between packed RGB8 images and planar YUV frames.

use crate::foundation::core::Resolution;
use crate::foundation::error::TileviewResult;
use crate::frame::pixfmt::PixFmt;
use crate::frame::video::VideoFrame;

/// Full-range BT.601 RGB → YUV for one pixel, as floats.
fn rgb_to_yuv_full(r: f64, g: f64, b: f64) -> [f64; 3] {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let v = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    [y, u, v]
}

fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn compress_luma(y: f64, full: bool) -> f64 {
    if full { y } else { 16.0 + y * 219.0 / 255.0 }
}

fn compress_chroma(c: f64, full: bool) -> f64 {
    if full {
        c
    } else {
        128.0 + (c - 128.0) * 224.0 / 255.0
    }
}

/// Convert a packed RGB image into a frame of `format`.
///
/// Chroma samples average the full-resolution chroma over each subsampling block.
pub fn rgb_to_frame(img: &image::RgbImage, format: PixFmt) -> TileviewResult<VideoFrame> {
    let res = Resolution::new(img.width(), img.height());
    let mut frame = VideoFrame::new(format, res)?;
    let full = format.is_full_range();
    let (hsub, vsub) = (format.log2_chroma_w(), format.log2_chroma_h());

    let mut u_full = vec![0.0f64; res.area()];
    let mut v_full = vec![0.0f64; res.area()];
    for (x, y, px) in img.enumerate_pixels() {
        let [r, g, b] = px.0.map(f64::from);
        let [yy, u, v] = rgb_to_yuv_full(r, g, b);
        frame.planes[0].row_mut(y)[x as usize] = to_u8(compress_luma(yy, full));
        let idx = y as usize * res.width as usize + x as usize;
        u_full[idx] = u;
        v_full[idx] = v;
    }

    let chroma = res.subsampled(hsub, vsub);
    for cy in 0..chroma.height {
        for cx in 0..chroma.width {
            let (mut su, mut sv, mut n) = (0.0, 0.0, 0.0);
            for y in (cy << vsub)..((cy + 1) << vsub).min(res.height) {
                for x in (cx << hsub)..((cx + 1) << hsub).min(res.width) {
                    let idx = y as usize * res.width as usize + x as usize;
                    su += u_full[idx];
                    sv += v_full[idx];
                    n += 1.0;
                }
            }
            if n > 0.0 {
                frame.planes[1].row_mut(cy)[cx as usize] = to_u8(compress_chroma(su / n, full));
                frame.planes[2].row_mut(cy)[cx as usize] = to_u8(compress_chroma(sv / n, full));
            }
        }
    }

    if format.has_alpha() {
        frame.planes[3].fill(u8::MAX);
    }
    Ok(frame)
}

/// Convert a frame back to packed RGB, upsampling chroma by replication.
pub fn frame_to_rgb(frame: &VideoFrame) -> TileviewResult<image::RgbImage> {
    frame.validate()?;
    let full = frame.format.is_full_range();
    let (hsub, vsub) = (frame.format.log2_chroma_w(), frame.format.log2_chroma_h());
    let chroma = frame.resolution().subsampled(hsub, vsub);

    let mut img = image::RgbImage::new(frame.width, frame.height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let cx = (x >> hsub).min(chroma.width.saturating_sub(1));
        let cy = (y >> vsub).min(chroma.height.saturating_sub(1));
        let yy = f64::from(frame.planes[0].get(x, y));
        let (u, v) = if chroma.is_empty() {
            (128.0, 128.0)
        } else {
            (
                f64::from(frame.planes[1].get(cx, cy)),
                f64::from(frame.planes[2].get(cx, cy)),
            )
        };
        let (yy, u, v) = if full {
            (yy, u - 128.0, v - 128.0)
        } else {
            (
                (yy - 16.0) * 255.0 / 219.0,
                (u - 128.0) * 255.0 / 224.0,
                (v - 128.0) * 255.0 / 224.0,
            )
        };
        let r = yy + 1.402 * v;
        let g = yy - 0.344_136 * u - 0.714_136 * v;
        let b = yy + 1.772 * u;
        *px = image::Rgb([to_u8(r), to_u8(g), to_u8(b)]);
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/convert.rs"]
mod tests;
