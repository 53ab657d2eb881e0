//! Rigid transforms stored as 4x4 affine matrices.
//!
//! Only rotation + translation is ever stored, so the inverse is R^T(p - t)
//! and never needs a general matrix inversion.

use crate::{Mat3, Mat4, Quat, Vec3};

/// Build the body-to-world transform from a position and unit orientation.
pub fn transform_from(position: &Vec3, orientation: &Quat) -> Mat4 {
    let r = orientation.to_matrix();
    Mat4::new(
        r[(0, 0)],
        r[(0, 1)],
        r[(0, 2)],
        position.x,
        r[(1, 0)],
        r[(1, 1)],
        r[(1, 2)],
        position.y,
        r[(2, 0)],
        r[(2, 1)],
        r[(2, 2)],
        position.z,
        0.0,
        0.0,
        0.0,
        1.0,
    )
}

/// Upper-left 3x3 rotation block.
#[inline]
pub fn rotation_part(m: &Mat4) -> Mat3 {
    Mat3::new(
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)],
    )
}

/// Translation column.
#[inline]
pub fn translation_part(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Column `i` of the transform: 0..=2 are the body axes in world space,
/// 3 is the origin.
#[inline]
pub fn axis(m: &Mat4, i: usize) -> Vec3 {
    Vec3::new(m[(0, i)], m[(1, i)], m[(2, i)])
}

/// Body-local point to world space.
#[inline]
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    rotation_part(m) * p + translation_part(m)
}

/// World point to body-local space.
#[inline]
pub fn transform_inverse_point(m: &Mat4, p: &Vec3) -> Vec3 {
    rotation_part(m).transpose() * (p - translation_part(m))
}

/// Body-local direction to world space (rotation only).
#[inline]
pub fn transform_direction(m: &Mat4, d: &Vec3) -> Vec3 {
    rotation_part(m) * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform() {
        let m = transform_from(&Vec3::zeros(), &Quat::identity());
        assert_eq!(m, Mat4::identity());
    }

    #[test]
    fn test_point_roundtrip() {
        let q = Quat::from_axis_angle(&Vec3::new(0.0, 1.0, 1.0).normalize(), 0.9);
        let m = transform_from(&Vec3::new(1.0, -2.0, 3.0), &q);
        let p = Vec3::new(0.3, 0.2, -4.0);
        let back = transform_inverse_point(&m, &transform_point(&m, &p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_columns() {
        let q = Quat::from_axis_angle(&Vec3::z(), std::f64::consts::FRAC_PI_2);
        let m = transform_from(&Vec3::new(5.0, 0.0, 0.0), &q);
        assert_relative_eq!(axis(&m, 0), Vec3::y(), epsilon = 1e-12);
        assert_relative_eq!(axis(&m, 3), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(
            transform_direction(&m, &Vec3::x()),
            Vec3::y(),
            epsilon = 1e-12
        );
    }
}
