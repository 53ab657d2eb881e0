//! Math primitives for the rigor rigid-body core.
//!
//! Vectors and matrices are `nalgebra` types; orientation uses the local
//! [`Quat`] so the integrator controls exactly when renormalization happens.

pub mod inertia;
pub mod quaternion;
pub mod transform;

pub use inertia::{cuboid_inertia, sphere_inertia, world_inverse_inertia};
pub use quaternion::Quat;
pub use transform::{
    axis, rotation_part, transform_direction, transform_from, transform_inverse_point, transform_point,
    translation_part,
};

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;
/// 3x3 matrix alias.
pub type Mat3 = na::Matrix3<f64>;
/// 4x4 matrix alias (affine world transforms).
pub type Mat4 = na::Matrix4<f64>;

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Smallest mass a body may carry (kg). Lighter masses are clamped to this.
pub const MIN_MASS: f64 = 1e-6;
