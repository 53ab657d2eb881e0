//! Inertia tensor construction and world-frame transformation.

use crate::{Mat3, Vec3};

/// Solid sphere: I = (2/5) m r² on the diagonal.
pub fn sphere_inertia(mass: f64, radius: f64) -> Mat3 {
    let i = 0.4 * mass * radius * radius;
    Mat3::from_diagonal(&Vec3::new(i, i, i))
}

/// Solid cuboid with the given half-extents.
pub fn cuboid_inertia(mass: f64, half_extents: &Vec3) -> Mat3 {
    let e = half_extents * 2.0;
    let factor = mass / 12.0;
    Mat3::from_diagonal(&Vec3::new(
        factor * (e.y * e.y + e.z * e.z),
        factor * (e.x * e.x + e.z * e.z),
        factor * (e.x * e.x + e.y * e.y),
    ))
}

/// World-frame inverse inertia: R * I⁻¹ * Rᵀ.
#[inline]
pub fn world_inverse_inertia(inverse_local: &Mat3, rotation: &Mat3) -> Mat3 {
    rotation * inverse_local * rotation.transpose()
}
