use super::*;

#[test]
fn empty_json_yields_defaults() {
    let opts = ProjectOptions::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(opts, ProjectOptions::default());
    assert_eq!(opts.w, "iw");
    assert_eq!(opts.fovx, 90.0);
    assert!(opts.lofile.is_none());
}

#[test]
fn json_accepts_aliases_and_rejects_unknown_fields() {
    let opts =
        ProjectOptions::from_reader(r#"{"out_w":"640","out_h":"320","yr":45}"#.as_bytes()).unwrap();
    assert_eq!(opts.w, "640");
    assert_eq!(opts.h, "320");
    assert_eq!(opts.yr, 45.0);

    let err = ProjectOptions::from_reader(r#"{"vshader":"a.glsl"}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, TileviewError::Configuration(_)));
}

#[test]
fn validate_enforces_ranges() {
    let bad = [
        ProjectOptions {
            fovx: 180.0,
            ..ProjectOptions::default()
        },
        ProjectOptions {
            zr: 361.0,
            ..ProjectOptions::default()
        },
        ProjectOptions {
            ecoef: 1.5,
            ..ProjectOptions::default()
        },
        ProjectOptions {
            timebase: -1.0,
            ..ProjectOptions::default()
        },
        ProjectOptions {
            w: " ".to_owned(),
            ..ProjectOptions::default()
        },
    ];
    for opts in bad {
        assert!(opts.validate().is_err(), "{opts:?}");
    }
}

#[test]
fn set_updates_by_name_and_keeps_state_on_error() {
    let mut opts = ProjectOptions::default();
    opts.set("out_w", "iw/2").unwrap();
    opts.set("keep_aspect", "1").unwrap();
    opts.set("lofile", "layout.txt").unwrap();
    assert_eq!(opts.w, "iw/2");
    assert!(opts.keep_aspect);
    assert_eq!(opts.lofile.as_deref(), Some(Path::new("layout.txt")));

    assert!(opts.set("fovy", "wide").is_err());
    assert!(opts.set("fovy", "200").is_err());
    assert!(opts.set("nope", "1").is_err());
    assert_eq!(opts.fovy, 90.0);
}

#[test]
fn from_path_reports_missing_file() {
    let err = ProjectOptions::from_path("target/does-not-exist/options.json").unwrap_err();
    assert!(matches!(err, TileviewError::Io { .. }));
}

#[test]
fn empty_file_paths_in_json_mean_no_file() {
    let opts = ProjectOptions::from_reader(r#"{"lofile":"","orfile":""}"#.as_bytes()).unwrap();
    assert!(opts.lofile.is_none());
    assert!(opts.orfile.is_none());

    let opts = ProjectOptions::from_reader(r#"{"lofile":"cube.txt","orfile":null}"#.as_bytes())
        .unwrap();
    assert_eq!(opts.lofile.as_deref(), Some(Path::new("cube.txt")));
    assert!(opts.orfile.is_none());
}

#[test]
fn set_parses_clear_yuv_triples() {
    let mut opts = ProjectOptions::default();
    opts.set("clear_yuv", "16, 128,128").unwrap();
    assert_eq!(opts.clear_yuv, [16, 128, 128]);

    for bad in ["16,128", "16,128,128,0", "16,300,128", "a,b,c", ""] {
        assert!(opts.set("clear_yuv", bad).is_err(), "{bad}");
    }
    assert_eq!(opts.clear_yuv, [16, 128, 128]);
}
