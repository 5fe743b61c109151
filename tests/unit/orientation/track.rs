use super::*;

fn track() -> OrientationTrack {
    OrientationTrack::from_samples(vec![
        OrientationSample {
            timestamp: 0.0,
            rotation: Rotation::ZERO,
        },
        OrientationSample {
            timestamp: 5.0,
            rotation: Rotation::new(10.0, 20.0, 30.0),
        },
    ])
    .unwrap()
}

#[test]
fn step_hold_lookup_is_boundary_inclusive() {
    let t = track();
    let d = Rotation::new(1.0, 2.0, 3.0);
    assert_eq!(t.rotation_for(Some(4.0), 0.0, d), Rotation::ZERO);
    assert_eq!(t.rotation_for(Some(6.0), 0.0, d), Rotation::new(10.0, 20.0, 30.0));
    assert_eq!(t.rotation_for(Some(5.0), 0.0, d), Rotation::new(10.0, 20.0, 30.0));
}

#[test]
fn tolerance_moves_the_switch_earlier() {
    let t = track();
    assert_eq!(
        t.rotation_for(Some(4.5), 0.5, Rotation::ZERO),
        Rotation::new(10.0, 20.0, 30.0)
    );
}

#[test]
fn default_applies_before_first_sample_and_without_time() {
    let t = OrientationTrack::parse("o.txt", "2 0 1 1 1\n").unwrap();
    let d = Rotation::new(0.0, 90.0, 0.0);
    assert_eq!(t.rotation_for(Some(1.0), 0.0, d), d);
    assert_eq!(t.rotation_for(None, 0.0, d), d);
    assert_eq!(t.rotation_for(Some(f64::NAN), 0.0, d), d);
    assert_eq!(OrientationTrack::default().rotation_for(Some(9.0), 0.0, d), d);
}

#[test]
fn parse_maps_fields_positionally() {
    let t = OrientationTrack::parse("o.txt", "0.0 7 10 20 30\n\n1.5 7 -5 0 45\n").unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.samples()[0].rotation, Rotation::new(10.0, 20.0, 30.0));
    assert_eq!(t.samples()[1].timestamp, 1.5);
}

#[test]
fn wrong_field_count_fails_with_line_number() {
    let err = OrientationTrack::parse("o.txt", "0 0 0 0 0\n1 0 0 0\n").unwrap_err();
    match err {
        TileviewError::MalformedOrientation { line, reason, .. } => {
            assert_eq!(line, 2);
            assert!(reason.contains("found 4"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(OrientationTrack::parse("o.txt", "0 0 0 0 0 0\n").is_err());
}

#[test]
fn decreasing_timestamps_are_rejected() {
    let err = OrientationTrack::parse("o.txt", "2 0 0 0 0\n1 0 0 0 0\n").unwrap_err();
    assert!(matches!(err, TileviewError::MalformedOrientation { line: 2, .. }));
    assert!(OrientationTrack::parse("o.txt", "1 0 nan 0 0\n").is_err());
}

#[test]
fn no_path_means_empty_track() {
    assert!(OrientationTrack::load(None).unwrap().is_empty());
}

#[test]
fn empty_path_means_empty_track() {
    assert!(OrientationTrack::load(Some(Path::new(""))).unwrap().is_empty());
}
