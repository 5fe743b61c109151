use super::*;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn approx_vec(a: Vec4, b: Vec4, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps) && approx(a.w, b.w, eps)
}

/// Deterministic pseudo-random matrices in `[-1, 1]`.
fn lcg_matrix(seed: &mut u64) -> Mat4 {
    let mut m = [0.0f32; 16];
    for v in &mut m {
        *seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let unit = ((*seed >> 40) as f64) / ((1u64 << 24) as f64);
        *v = (unit * 2.0 - 1.0) as f32;
    }
    Mat4 { m }
}

#[test]
fn default_is_identity() {
    assert_eq!(Mat4::default(), Mat4::IDENTITY);
    let v = Vec4::point(0.3, -2.0, 5.0);
    assert_eq!(Mat4::IDENTITY * v, v);
}

#[test]
fn multiplication_is_associative() {
    let mut seed = 0x5eed_u64;
    for _ in 0..32 {
        let a = lcg_matrix(&mut seed);
        let b = lcg_matrix(&mut seed);
        let c = lcg_matrix(&mut seed);
        let left = (a * b) * c;
        let right = a * (b * c);
        assert!(left.max_abs_diff(&right) <= 1e-4);
    }
}

#[test]
fn product_applies_right_operand_first() {
    let a = Mat4::rotation_z(90.0);
    let b = Mat4::IDENTITY.translate(1.0, 0.0, 0.0);
    let v = Vec4::point(0.0, 0.0, 0.0);
    assert!(approx_vec((a * b) * v, a * (b * v), 1e-6));
    // Translate first, then rotate: (1,0,0) -> (0,1,0).
    assert!(approx_vec((a * b) * v, Vec4::point(0.0, 1.0, 0.0), 1e-6));
}

#[test]
fn rotations_follow_right_hand_rule() {
    let x = Vec4::new(1.0, 0.0, 0.0, 0.0);
    let y = Vec4::new(0.0, 1.0, 0.0, 0.0);
    let z = Vec4::new(0.0, 0.0, 1.0, 0.0);
    assert!(approx_vec(Mat4::rotation_z(90.0) * x, y, 1e-6));
    assert!(approx_vec(Mat4::rotation_x(90.0) * y, z, 1e-6));
    assert!(approx_vec(Mat4::rotation_y(90.0) * z, x, 1e-6));
}

#[test]
fn rotate_methods_right_multiply() {
    let m = Mat4::rotation_x(30.0);
    assert!(m.rotate_y(45.0).max_abs_diff(&(m * Mat4::rotation_y(45.0))) <= 1e-6);
    assert!(m.rotate_z(-10.0).max_abs_diff(&(m * Mat4::rotation_z(-10.0))) <= 1e-6);
}

#[test]
fn orientation_applies_y_then_x_then_z() {
    let rot = Rotation::new(20.0, 35.0, -50.0);
    let v = Vec4::point(0.2, -0.4, -1.0);
    let stepwise =
        Mat4::rotation_z(rot.z) * (Mat4::rotation_x(rot.x) * (Mat4::rotation_y(rot.y) * v));
    assert!(approx_vec(Mat4::orientation(rot) * v, stepwise, 1e-5));
}

#[test]
fn orientation_transpose_is_inverse() {
    let o = Mat4::orientation(Rotation::new(12.0, -70.0, 133.0));
    assert!((o * o.transpose()).max_abs_diff(&Mat4::IDENTITY) <= 1e-5);
}

#[test]
fn zero_rotation_is_identity() {
    assert!(Mat4::orientation(Rotation::ZERO).max_abs_diff(&Mat4::IDENTITY) <= 1e-7);
}

#[test]
fn scale_and_translate_compose() {
    let m = Mat4::IDENTITY.translate(1.0, 2.0, 3.0).scale(2.0, 2.0, 2.0);
    let v = m * Vec4::point(1.0, 1.0, 1.0);
    assert!(approx_vec(v, Vec4::point(3.0, 4.0, 5.0), 1e-6));
}

#[test]
fn perspective_layout_and_depth_range() {
    let p = Mat4::perspective(90.0, 60.0, 0.5, 2.0).unwrap();
    assert!(approx(p.at(0, 0), 1.0, 1e-6));
    assert!(approx(p.at(1, 1), (1.0 / 30f64.to_radians().tan()) as f32, 1e-6));
    assert!(approx(p.at(3, 2), -1.0, 0.0));
    assert!(approx(p.at(2, 2), -(2.5 / 1.5), 1e-6));
    assert!(approx(p.at(2, 3), -(2.0 / 1.5), 1e-6));

    let near = p * Vec4::point(0.0, 0.0, -0.5);
    assert!(approx(near.z / near.w, -1.0, 1e-6));
    let far = p * Vec4::point(0.0, 0.0, -2.0);
    assert!(approx(far.z / far.w, 1.0, 1e-6));
}

#[test]
fn perspective_rejects_degenerate_parameters() {
    for (fovx, fovy, near, far) in [
        (180.0, 90.0, 0.5, 2.0),
        (90.0, 0.0, 0.5, 2.0),
        (90.0, 90.0, 2.0, 2.0),
        (90.0, 90.0, 3.0, 2.0),
        (f64::NAN, 90.0, 0.5, 2.0),
    ] {
        let err = Mat4::perspective(fovx, fovy, near, far).unwrap_err();
        assert!(matches!(err, TileviewError::InvalidParameter(_)));
    }
}

#[test]
fn degree_radian_round_trip_is_exact_enough() {
    assert!((rad_to_deg(deg_to_rad(37.5)) - 37.5).abs() < 1e-12);
}
