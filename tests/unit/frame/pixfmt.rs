use super::*;

#[test]
fn names_round_trip_and_unknown_formats_fail() {
    for f in PixFmt::all() {
        assert_eq!(PixFmt::from_name(f.name()).unwrap(), *f);
    }
    assert!(matches!(
        PixFmt::from_name("rgb24"),
        Err(TileviewError::Configuration(_))
    ));
}

#[test]
fn subsampling_shifts_match_ffmpeg() {
    let expect = [
        (PixFmt::Yuv420p, 1, 1),
        (PixFmt::Yuv422p, 1, 0),
        (PixFmt::Yuv444p, 0, 0),
        (PixFmt::Yuv410p, 2, 2),
        (PixFmt::Yuv411p, 2, 0),
        (PixFmt::Yuv440p, 0, 1),
        (PixFmt::Yuva420p, 1, 1),
    ];
    for (f, w, h) in expect {
        assert_eq!((f.log2_chroma_w(), f.log2_chroma_h()), (w, h), "{f}");
    }
}

#[test]
fn plane_resolution_uses_shifts_for_chroma_only() {
    let luma = Resolution::new(1921, 961);
    let f = PixFmt::Yuva420p;
    assert_eq!(f.plane_count(), 4);
    assert_eq!(f.plane_resolution(0, luma), luma);
    assert_eq!(f.plane_resolution(1, luma), Resolution::new(960, 480));
    assert_eq!(f.plane_resolution(2, luma), Resolution::new(960, 480));
    assert_eq!(f.plane_resolution(3, luma), luma);
    assert_eq!(PixFmt::Yuv444p.plane_count(), 3);
}
