use super::*;
use crate::transform::matrix::Vec4;

#[test]
fn zero_rotation_model_is_identity() {
    let t = ViewTransform::new(90.0, 90.0, Rotation::ZERO).unwrap();
    assert_eq!(t.model, Mat4::IDENTITY);
    assert_eq!(t.view, Mat4::IDENTITY);
}

#[test]
fn unit_depth_corner_lands_on_ndc_corner() {
    let t = ViewTransform::new(90.0, 90.0, Rotation::ZERO).unwrap();
    let c = t.mvp() * Vec4::point(1.0, 1.0, -1.0);
    assert!((c.x / c.w - 1.0).abs() < 1e-6);
    assert!((c.y / c.w - 1.0).abs() < 1e-6);
    let z = c.z / c.w;
    assert!(z > -1.0 && z < 1.0, "{z}");
}

#[test]
fn invalid_fov_is_an_invalid_parameter() {
    assert!(matches!(
        ViewTransform::new(180.0, 90.0, Rotation::ZERO),
        Err(TileviewError::InvalidParameter(_))
    ));
}

#[test]
fn plane_view_checks_length_and_clamps() {
    assert!(PlaneView::new(&[0; 3], 2, 2).is_err());
    let data = [1, 2, 3, 4];
    let p = PlaneView::new(&data, 2, 2).unwrap();
    assert_eq!(p.texel(-5, 0), 1.0);
    assert_eq!(p.texel(9, 9), 4.0);
}
