use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use super::*;
use crate::foundation::core::{Rational, Resolution};
use crate::frame::pixfmt::PixFmt;
use crate::render::backend::Raster;

fn props(format: PixFmt, w: u32, h: u32) -> StreamProps {
    StreamProps::new(format, Resolution::new(w, h), Rational::new(1, 25).unwrap())
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("tileview-unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn assert_uniform(frame: &VideoFrame, plane: usize, value: u8) {
    let p = &frame.planes[plane];
    for y in 0..p.height {
        assert!(p.row(y).iter().all(|v| *v == value), "plane {plane} row {y}");
    }
}

#[test]
fn unconfigured_filter_rejects_frames() {
    let mut f = ProjectFilter::new(ProjectOptions::default()).unwrap();
    assert_eq!(f.state(), FilterState::Unconfigured);
    let frame = VideoFrame::new(PixFmt::Yuv420p, Resolution::new(8, 8)).unwrap();
    assert!(matches!(
        f.filter_frame(&frame),
        Err(TileviewError::Configuration(_))
    ));
}

#[test]
fn configure_builds_default_cube() {
    let mut f = ProjectFilter::new(ProjectOptions::default()).unwrap();
    let out = f.configure(props(PixFmt::Yuv420p, 96, 64)).unwrap();
    assert_eq!(out.resolution, Resolution::new(96, 64));
    assert_eq!(f.state(), FilterState::Configured);
    assert_eq!(f.layout().unwrap().len(), 6);
    assert_eq!(f.tile_geometry().unwrap().vertices.len(), 36);
    assert!(f.orientation_track().unwrap().is_empty());
}

#[test]
fn uniform_frame_projects_to_uniform_planes() {
    let mut f = ProjectFilter::new(ProjectOptions::default()).unwrap();
    f.configure(props(PixFmt::Yuva420p, 96, 64)).unwrap();
    let mut frame =
        VideoFrame::filled(PixFmt::Yuva420p, Resolution::new(96, 64), [120, 90, 200]).unwrap();
    frame.planes[3].fill(0);
    let out = f.filter_frame(&frame).unwrap();
    assert_uniform(&out, 0, 120);
    assert_uniform(&out, 1, 90);
    assert_uniform(&out, 2, 200);
    assert_uniform(&out, 3, 255);
    assert_eq!(f.state(), FilterState::Rendering);
    assert_eq!(f.frames_processed(), 1);
}

#[test]
fn output_size_follows_expressions() {
    let opts = ProjectOptions {
        w: "iw/2".to_owned(),
        h: "ow/2".to_owned(),
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv422p, 128, 64)).unwrap();
    let frame = VideoFrame::filled(PixFmt::Yuv422p, Resolution::new(128, 64), [50, 60, 70]).unwrap();
    let out = f.filter_frame(&frame).unwrap();
    assert_eq!(out.resolution(), Resolution::new(64, 32));
    assert_eq!(out.planes[1].resolution(), Resolution::new(32, 32));
    out.validate().unwrap();
}

#[test]
fn padded_input_matches_packed_input() {
    let res = Resolution::new(48, 32);
    let mut packed = VideoFrame::new(PixFmt::Yuv420p, res).unwrap();
    let mut padded = VideoFrame::with_padding(PixFmt::Yuv420p, res, 13).unwrap();
    for (i, (a, b)) in packed.planes.iter_mut().zip(padded.planes.iter_mut()).enumerate() {
        for y in 0..a.height {
            for x in 0..a.width {
                let v = ((x * 7 + y * 3 + i as u32 * 11) % 251) as u8;
                a.row_mut(y)[x as usize] = v;
                b.row_mut(y)[x as usize] = v;
            }
        }
    }
    let opts = ProjectOptions {
        yr: 30.0,
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv420p, 48, 32)).unwrap();
    let a = f.filter_frame(&packed).unwrap();
    let b = f.filter_frame(&padded).unwrap();
    assert_eq!(a.planes, b.planes);
}

#[test]
fn mismatched_frames_are_configuration_errors() {
    let mut f = ProjectFilter::new(ProjectOptions::default()).unwrap();
    f.configure(props(PixFmt::Yuv420p, 16, 16)).unwrap();
    let wrong_size = VideoFrame::new(PixFmt::Yuv420p, Resolution::new(32, 16)).unwrap();
    let wrong_fmt = VideoFrame::new(PixFmt::Yuv444p, Resolution::new(16, 16)).unwrap();
    assert!(matches!(
        f.filter_frame(&wrong_size),
        Err(TileviewError::Configuration(_))
    ));
    assert!(matches!(
        f.filter_frame(&wrong_fmt),
        Err(TileviewError::Configuration(_))
    ));
    assert_eq!(f.frames_processed(), 0);
}

#[test]
fn process_command_reconfigures_and_restores_on_failure() {
    let mut f = ProjectFilter::new(ProjectOptions::default()).unwrap();
    f.configure(props(PixFmt::Yuv420p, 64, 32)).unwrap();

    f.process_command("w", "iw/2").unwrap();
    assert_eq!(
        f.output_props().unwrap().resolution,
        Resolution::new(32, 32)
    );
    assert_eq!(f.state(), FilterState::Configured);

    let err = f.process_command("out_w", "0").unwrap_err();
    assert!(matches!(err, TileviewError::Configuration(_)));
    assert_eq!(f.options().w, "iw/2");
    assert_eq!(
        f.output_props().unwrap().resolution,
        Resolution::new(32, 32)
    );

    assert!(f.process_command("fovx", "100").is_err());
}

#[test]
fn orientation_track_drives_rotation() {
    let path = scratch_file("filter-orientation.txt", "0 0 0 0 0\n5 0 10 20 30\n");
    let opts = ProjectOptions {
        orfile: Some(path),
        xr: 1.0,
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv420p, 16, 16)).unwrap();
    assert_eq!(f.orientation_track().unwrap().len(), 2);
    assert_eq!(f.rotation_at(Some(4.0)), Rotation::ZERO);
    assert_eq!(f.rotation_at(Some(5.0)), Rotation::new(10.0, 20.0, 30.0));
    assert_eq!(f.rotation_at(None), Rotation::new(1.0, 0.0, 0.0));
}

#[test]
fn uncovered_pixels_use_per_plane_clear_values() {
    let path = scratch_file("filter-narrow-layout.txt", "1:1:30:30:0:0:0:0:0\n");
    let opts = ProjectOptions {
        lofile: Some(path),
        clear_yuv: [16, 128, 130],
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv444p, 32, 32)).unwrap();
    let frame = VideoFrame::filled(PixFmt::Yuv444p, Resolution::new(32, 32), [200, 10, 20]).unwrap();
    let out = f.filter_frame(&frame).unwrap();
    assert_eq!(out.planes[0].get(0, 0), 16);
    assert_eq!(out.planes[1].get(31, 0), 128);
    assert_eq!(out.planes[2].get(0, 31), 130);
    assert_eq!(out.planes[0].get(16, 16), 200);
    assert_eq!(out.planes[2].get(15, 15), 20);
}

#[test]
fn failed_layout_load_leaves_filter_unconfigured() {
    let opts = ProjectOptions {
        lofile: Some(PathBuf::from("target/tileview-unit/missing-layout.txt")),
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    assert!(matches!(
        f.configure(props(PixFmt::Yuv420p, 16, 16)),
        Err(TileviewError::Io { .. })
    ));
    assert_eq!(f.state(), FilterState::Unconfigured);
}

#[test]
fn crop_offset_is_observable_but_not_applied() {
    let opts = ProjectOptions {
        w: "iw/2".to_owned(),
        h: "ih/2".to_owned(),
        ..ProjectOptions::default()
    };
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv420p, 64, 32)).unwrap();
    let frame = VideoFrame::filled(PixFmt::Yuv420p, Resolution::new(64, 32), [1, 2, 3]).unwrap();
    f.filter_frame(&frame).unwrap();
    assert_eq!(f.last_crop_offset().computed, (16, 8));
    assert_eq!(f.last_crop_offset().applied, (0, 0));
}

struct CountingBackend {
    inner: CpuRenderer,
    renders: Rc<Cell<u32>>,
    releases: Rc<Cell<u32>>,
}

impl RenderBackend for CountingBackend {
    fn render(&mut self, pass: &RenderPass<'_>) -> TileviewResult<Raster> {
        self.renders.set(self.renders.get() + 1);
        self.inner.render(pass)
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
        self.inner.release();
    }
}

#[test]
fn three_passes_per_frame_and_release_on_drop() {
    let renders = Rc::new(Cell::new(0));
    let releases = Rc::new(Cell::new(0));
    let backend = CountingBackend {
        inner: CpuRenderer::default(),
        renders: renders.clone(),
        releases: releases.clone(),
    };
    let mut f = ProjectFilter::with_backend(ProjectOptions::default(), backend).unwrap();
    f.configure(props(PixFmt::Yuva444p, 8, 8)).unwrap();
    let before = releases.get();
    let frame = VideoFrame::filled(PixFmt::Yuva444p, Resolution::new(8, 8), [1, 2, 3]).unwrap();
    f.filter_frame(&frame).unwrap();
    f.filter_frame(&frame).unwrap();
    assert_eq!(renders.get(), 6);
    drop(f);
    assert_eq!(releases.get(), before + 1);
}

#[test]
fn render_failures_propagate_as_errors() {
    struct Failing;
    impl RenderBackend for Failing {
        fn render(&mut self, _pass: &RenderPass<'_>) -> TileviewResult<Raster> {
            Err(TileviewError::render_backend("device lost"))
        }
    }
    let mut f = ProjectFilter::with_backend(ProjectOptions::default(), Failing).unwrap();
    f.configure(props(PixFmt::Yuv420p, 8, 8)).unwrap();
    let frame = VideoFrame::new(PixFmt::Yuv420p, Resolution::new(8, 8)).unwrap();
    assert!(matches!(
        f.filter_frame(&frame),
        Err(TileviewError::RenderBackend(_))
    ));
    assert_eq!(f.frames_processed(), 0);
}

#[test]
fn empty_paths_from_json_configure_the_cube() {
    let opts = ProjectOptions::from_reader(r#"{"lofile":"","orfile":""}"#.as_bytes()).unwrap();
    let mut f = ProjectFilter::new(opts).unwrap();
    f.configure(props(PixFmt::Yuv420p, 96, 64)).unwrap();
    assert_eq!(f.layout().unwrap().len(), 6);
    assert!(f.orientation_track().unwrap().is_empty());
}

#[test]
fn sizes_with_empty_chroma_are_rejected_at_configure() {
    let mut f = ProjectFilter::new(ProjectOptions {
        exact: true,
        w: "1".to_owned(),
        ..ProjectOptions::default()
    })
    .unwrap();
    let err = f.configure(props(PixFmt::Yuv420p, 8, 8)).unwrap_err();
    assert!(matches!(err, TileviewError::Configuration(_)), "{err}");
    assert_eq!(f.state(), FilterState::Unconfigured);

    let err = f.configure(props(PixFmt::Yuv420p, 1, 8)).unwrap_err();
    assert!(matches!(err, TileviewError::Configuration(_)), "{err}");
}
