//! Mass-distribution shapes for rigid bodies.

use rigor_math::{Mat3, Vec3, cuboid_inertia, sphere_inertia};

/// Shape used to derive a rigid body's local inertia tensor and bounding radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Solid sphere.
    Sphere { radius: f64 },
    /// Solid box with half-extents (width/2, height/2, depth/2).
    Cuboid { half_extents: Vec3 },
}

impl Shape {
    /// Local-frame inertia tensor for a body of the given mass.
    pub fn inertia_tensor(&self, mass: f64) -> Mat3 {
        match self {
            Shape::Sphere { radius } => sphere_inertia(mass, *radius),
            Shape::Cuboid { half_extents } => cuboid_inertia(mass, half_extents),
        }
    }

    /// Radius of the smallest origin-centred sphere enclosing the shape.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Cuboid { half_extents } => half_extents.norm(),
        }
    }

    /// Enclosed volume (m³).
    pub fn volume(&self) -> f64 {
        match self {
            Shape::Sphere { radius } => 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3),
            Shape::Cuboid { half_extents } => 8.0 * half_extents.x * half_extents.y * half_extents.z,
        }
    }
}
