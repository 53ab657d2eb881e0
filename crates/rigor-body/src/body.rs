//! Closed sum over the two body kinds.

use rigor_math::{Mat3, Mat4, Quat, Vec3, transform_from};

use crate::particle::Particle;
use crate::rigidbody::Rigidbody;

/// Either a particle or a rigid body.
///
/// The force subsystem, broad phase and resolver only go through this type,
/// so a particle looks like a rigid body with identity orientation and
/// zero inverse inertia.
#[derive(Debug, Clone)]
pub enum Body {
    Particle(Particle),
    Rigid(Rigidbody),
}

impl Body {
    pub fn is_rigid(&self) -> bool {
        matches!(self, Body::Rigid(_))
    }

    pub fn as_particle(&self) -> Option<&Particle> {
        match self {
            Body::Particle(p) => Some(p),
            Body::Rigid(_) => None,
        }
    }

    pub fn as_particle_mut(&mut self) -> Option<&mut Particle> {
        match self {
            Body::Particle(p) => Some(p),
            Body::Rigid(_) => None,
        }
    }

    pub fn as_rigid(&self) -> Option<&Rigidbody> {
        match self {
            Body::Rigid(r) => Some(r),
            Body::Particle(_) => None,
        }
    }

    pub fn as_rigid_mut(&mut self) -> Option<&mut Rigidbody> {
        match self {
            Body::Rigid(r) => Some(r),
            Body::Particle(_) => None,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        match self {
            Body::Particle(p) => p.position,
            Body::Rigid(r) => r.position,
        }
    }

    /// Move the body, keeping derived data current.
    pub fn set_position(&mut self, position: Vec3) {
        match self {
            Body::Particle(p) => p.position = position,
            Body::Rigid(r) => {
                r.position = position;
                r.calculate_derived_data();
            }
        }
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        match self {
            Body::Particle(_) => Quat::identity(),
            Body::Rigid(r) => r.orientation,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        match self {
            Body::Particle(p) => p.velocity,
            Body::Rigid(r) => r.velocity,
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        match self {
            Body::Particle(p) => p.velocity = velocity,
            Body::Rigid(r) => r.velocity = velocity,
        }
    }

    #[inline]
    pub fn angular_velocity(&self) -> Vec3 {
        match self {
            Body::Particle(_) => Vec3::zeros(),
            Body::Rigid(r) => r.angular_velocity,
        }
    }

    /// Apply an instantaneous change in linear and angular velocity.
    /// Particles ignore the angular part.
    pub fn apply_velocity_change(&mut self, linear: &Vec3, angular: &Vec3) {
        match self {
            Body::Particle(p) => p.velocity += linear,
            Body::Rigid(r) => {
                r.velocity += linear;
                r.angular_velocity += angular;
            }
        }
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn velocity_at_point(&self, point: &Vec3) -> Vec3 {
        match self {
            Body::Particle(p) => p.velocity,
            Body::Rigid(r) => r.velocity_at_point(point),
        }
    }

    pub fn mass(&self) -> f64 {
        match self {
            Body::Particle(p) => p.mass(),
            Body::Rigid(r) => r.mass(),
        }
    }

    pub fn set_mass(&mut self, mass: f64) {
        match self {
            Body::Particle(p) => p.set_mass(mass),
            Body::Rigid(r) => r.set_mass(mass),
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        match self {
            Body::Particle(p) => p.inverse_mass(),
            Body::Rigid(r) => r.inverse_mass(),
        }
    }

    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass() > 0.0
    }

    /// World-frame inverse inertia; zero for particles.
    pub fn inverse_inertia_world(&self) -> Mat3 {
        match self {
            Body::Particle(_) => Mat3::zeros(),
            Body::Rigid(r) => *r.inverse_inertia_world(),
        }
    }

    /// Body-to-world transform.
    pub fn transform(&self) -> Mat4 {
        match self {
            Body::Particle(p) => transform_from(&p.position, &Quat::identity()),
            Body::Rigid(r) => *r.transform(),
        }
    }

    /// Body-local point in world coordinates. Particles only translate.
    pub fn point_in_world(&self, local: &Vec3) -> Vec3 {
        match self {
            Body::Particle(p) => p.position + local,
            Body::Rigid(r) => r.point_in_world(local),
        }
    }

    /// Linear damping in [0, 1].
    pub fn damping(&self) -> f64 {
        match self {
            Body::Particle(p) => p.damping,
            Body::Rigid(r) => r.linear_damping,
        }
    }

    /// Set damping, clamped to [0, 1]. Applies to both linear and angular
    /// damping on rigid bodies.
    pub fn set_damping(&mut self, damping: f64) {
        let damping = damping.clamp(0.0, 1.0);
        match self {
            Body::Particle(p) => p.damping = damping,
            Body::Rigid(r) => {
                r.linear_damping = damping;
                r.angular_damping = damping;
            }
        }
    }

    /// Radius of the sphere centred on `position` that encloses the body.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Body::Particle(p) => p.radius,
            Body::Rigid(r) => r.bounding_radius(),
        }
    }

    pub fn add_force(&mut self, force: Vec3) {
        match self {
            Body::Particle(p) => p.add_force(force),
            Body::Rigid(r) => r.add_force(force),
        }
    }

    /// Force at a world point. Particles take it at their centre.
    pub fn add_force_at_point(&mut self, force: Vec3, point: &Vec3) {
        match self {
            Body::Particle(p) => p.add_force(force),
            Body::Rigid(r) => r.add_force_at_point(force, point),
        }
    }

    /// Force at a body-local point. Particles take it at their centre.
    pub fn add_force_at_body_point(&mut self, force: Vec3, local: &Vec3) {
        match self {
            Body::Particle(p) => p.add_force(force),
            Body::Rigid(r) => r.add_force_at_body_point(force, local),
        }
    }

    /// Torque; ignored by particles.
    pub fn add_torque(&mut self, torque: Vec3) {
        if let Body::Rigid(r) = self {
            r.add_torque(torque);
        }
    }

    pub fn accumulated_force(&self) -> Vec3 {
        match self {
            Body::Particle(p) => p.accumulated_force(),
            Body::Rigid(r) => r.accumulated_force(),
        }
    }

    pub fn clear_accumulators(&mut self) {
        match self {
            Body::Particle(p) => p.clear_accumulator(),
            Body::Rigid(r) => r.clear_accumulators(),
        }
    }

    /// Acceleration during the last integration step.
    pub fn last_acceleration(&self) -> Vec3 {
        match self {
            Body::Particle(p) => p.last_acceleration(),
            Body::Rigid(r) => r.last_acceleration(),
        }
    }

    /// Advance the body by `dt`.
    pub fn integrate(&mut self, dt: f64) {
        match self {
            Body::Particle(p) => p.integrate(dt),
            Body::Rigid(r) => r.integrate(dt),
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        match self {
            Body::Particle(p) => p.kinetic_energy(),
            Body::Rigid(r) => r.kinetic_energy(),
        }
    }

    /// Linear momentum m * v; zero for fixed bodies.
    pub fn momentum(&self) -> Vec3 {
        if self.has_finite_mass() {
            self.velocity() * self.mass()
        } else {
            Vec3::zeros()
        }
    }
}

impl From<Particle> for Body {
    fn from(p: Particle) -> Self {
        Body::Particle(p)
    }
}

impl From<Rigidbody> for Body {
    fn from(r: Rigidbody) -> Self {
        Body::Rigid(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use approx::assert_relative_eq;

    #[test]
    fn test_particle_has_no_rotation() {
        let mut b: Body = Particle::new(Vec3::zeros(), 1.0).into();
        b.add_torque(Vec3::new(1.0, 2.0, 3.0));
        b.apply_velocity_change(&Vec3::x(), &Vec3::y());
        assert_eq!(b.angular_velocity(), Vec3::zeros());
        assert_eq!(b.velocity(), Vec3::x());
        assert_eq!(b.inverse_inertia_world(), Mat3::zeros());
    }

    #[test]
    fn test_set_position_refreshes_transform() {
        let mut b: Body = Rigidbody::new(Vec3::zeros(), 1.0, Shape::Sphere { radius: 1.0 }).into();
        b.set_position(Vec3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(b.point_in_world(&Vec3::zeros()), Vec3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(b.transform()[(1, 3)], 3.0);
    }

    #[test]
    fn test_momentum_ignores_fixed_bodies() {
        let b: Body = Particle::fixed(Vec3::zeros()).with_velocity(Vec3::x()).into();
        assert_eq!(b.momentum(), Vec3::zeros());
        let m: Body = Particle::new(Vec3::zeros(), 2.0).with_velocity(Vec3::x()).into();
        assert_relative_eq!(m.momentum(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_set_damping_clamps() {
        let mut b: Body = Rigidbody::new(Vec3::zeros(), 1.0, Shape::Sphere { radius: 1.0 }).into();
        b.set_damping(1.5);
        assert_eq!(b.damping(), 1.0);
        assert_eq!(b.as_rigid().map(|r| r.angular_damping), Some(1.0));
    }
}
