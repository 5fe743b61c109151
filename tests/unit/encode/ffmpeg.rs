use super::*;
use crate::foundation::core::{Rational, Resolution};
use crate::frame::pixfmt::PixFmt;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        format: PixFmt::Yuv420p,
        fps: Rational::new(30000, 1001).unwrap(),
        sar: Rational::ONE,
    }
}

#[test]
fn pack_planes_drops_stride_padding() {
    let res = Resolution::new(4, 2);
    let mut padded = VideoFrame::with_padding(PixFmt::Yuv420p, res, 3).unwrap();
    padded.planes[0].fill(1);
    padded.planes[1].fill(2);
    padded.planes[2].fill(3);

    let mut out = Vec::new();
    pack_planes(&padded, &mut out).unwrap();
    let mut expected = vec![1u8; 8];
    expected.extend([2u8, 2, 3, 3]);
    assert_eq!(out, expected);
    assert_eq!(out.len(), frame_bytes(&cfg(4, 2)));
}

#[test]
fn input_args_describe_planar_rawvideo() {
    let args = input_args(&cfg(64, 32));
    let joined = args.join(" ");
    assert!(joined.contains("-f rawvideo -pix_fmt yuv420p -s 64x32"));
    assert!(joined.contains("-r 30000/1001 -i pipe:0"));
}

#[test]
fn begin_rejects_odd_dimensions_and_bad_fps() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/tileview-unit/odd.mp4"));
    assert!(matches!(
        sink.begin(cfg(33, 32)).unwrap_err(),
        TileviewError::Configuration(_)
    ));
    let mut bad = cfg(32, 32);
    bad.fps = Rational { num: 0, den: 1 };
    assert!(matches!(
        sink.begin(bad).unwrap_err(),
        TileviewError::InvalidParameter(_)
    ));
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/tileview-unit/never.mp4"));
    let frame = VideoFrame::new(PixFmt::Yuv420p, Resolution::new(2, 2)).unwrap();
    assert!(sink.push_frame(0, &frame).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn begin_rejects_partial_chroma_blocks() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/tileview-unit/block.mp4"));
    let mut quarter = cfg(6, 4);
    quarter.format = PixFmt::Yuv410p;
    assert!(matches!(
        sink.begin(quarter).unwrap_err(),
        TileviewError::Configuration(_)
    ));
}
