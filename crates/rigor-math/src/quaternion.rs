//! Quaternion utilities for body orientation.
//!
//! Convention: q = [w; x; y; z] where w is scalar, (x,y,z) is vector part.

use crate::{Mat3, Vec3};

/// A quaternion; unit length whenever it represents a body orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    /// Scalar part (w).
    pub w: f64,
    /// Vector part (x, y, z).
    pub v: Vec3,
}

impl Quat {
    /// Create a new quaternion from scalar and vector parts.
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            w,
            v: Vec3::new(x, y, z),
        }
    }

    /// Identity quaternion (no rotation).
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            v: Vec3::zeros(),
        }
    }

    /// Create quaternion from axis-angle representation.
    /// axis should be a unit vector, angle in radians.
    pub fn from_axis_angle(axis: &Vec3, angle: f64) -> Self {
        let half_angle = angle * 0.5;
        let (s, c) = half_angle.sin_cos();
        Self { w: c, v: *axis * s }
    }

    /// Euclidean length of the four components.
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.v.norm_squared()).sqrt()
    }

    /// Normalize this quaternion to unit length.
    /// A zero quaternion becomes the identity.
    pub fn normalize(&self) -> Self {
        let norm = self.norm();
        if norm < 1e-12 {
            return Self::identity();
        }
        Self {
            w: self.w / norm,
            v: self.v / norm,
        }
    }

    /// Quaternion multiplication: self * other.
    pub fn mul(&self, other: &Quat) -> Quat {
        Quat {
            w: self.w * other.w - self.v.dot(&other.v),
            v: self.v.cross(&other.v) + other.v * self.w + self.v * other.w,
        }
    }

    /// Rotate a vector by this (unit) quaternion.
    pub fn rotate(&self, p: &Vec3) -> Vec3 {
        let t = self.v.cross(p) * 2.0;
        p + t * self.w + self.v.cross(&t)
    }

    /// Advance the orientation by angular velocity `omega` over `dt`.
    ///
    /// Builds the small-angle delta quaternion [1; 0.5 * omega * dt],
    /// left-multiplies it into `self` and renormalizes the result.
    pub fn integrate(&self, omega: &Vec3, dt: f64) -> Quat {
        let delta = Quat {
            w: 1.0,
            v: omega * (0.5 * dt),
        };
        delta.mul(self).normalize()
    }

    /// Convert quaternion to 3x3 rotation matrix.
    pub fn to_matrix(&self) -> Mat3 {
        let w = self.w;
        let x = self.v.x;
        let y = self.v.y;
        let z = self.v.z;

        let x2 = x * x;
        let y2 = y * y;
        let z2 = z * z;
        let xy = x * y;
        let xz = x * z;
        let yz = y * z;
        let wx = w * x;
        let wy = w * y;
        let wz = w * z;

        Mat3::new(
            1.0 - 2.0 * (y2 + z2),
            2.0 * (xy - wz),
            2.0 * (xz + wy),
            2.0 * (xy + wz),
            1.0 - 2.0 * (x2 + z2),
            2.0 * (yz - wx),
            2.0 * (xz - wy),
            2.0 * (yz + wx),
            1.0 - 2.0 * (x2 + y2),
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Add for Quat {
    type Output = Quat;
    #[inline]
    fn add(self, rhs: Quat) -> Quat {
        Quat {
            w: self.w + rhs.w,
            v: self.v + rhs.v,
        }
    }
}

impl std::ops::Mul<f64> for Quat {
    type Output = Quat;
    #[inline]
    fn mul(self, rhs: f64) -> Quat {
        Quat {
            w: self.w * rhs,
            v: self.v * rhs,
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_omega() -> impl Strategy<Value = Vec3> {
        (-20.0..20.0_f64, -20.0..20.0_f64, -20.0..20.0_f64)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn integrate_stays_unit(omega in arb_omega(), steps in 1usize..500) {
            let mut q = Quat::identity();
            for _ in 0..steps {
                q = q.integrate(&omega, 1.0 / 60.0);
            }
            prop_assert!((q.norm() - 1.0).abs() < 1e-9, "norm drifted to {}", q.norm());
        }
    }
}
