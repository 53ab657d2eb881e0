//! Rigid body with orientation, angular velocity and an inertia tensor.

use rigor_math::{
    Mat3, Mat4, Quat, Vec3, transform_from, transform_point, world_inverse_inertia,
};

use crate::clamp_mass;
use crate::shape::Shape;

/// A rigid body.
///
/// The world transform and world inverse inertia tensor are derived from
/// position and orientation; [`Rigidbody::calculate_derived_data`] must run
/// after either changes (the integrator and resolver do this).
#[derive(Debug, Clone)]
pub struct Rigidbody {
    /// Centre of mass in world frame (m).
    pub position: Vec3,
    /// Unit orientation.
    pub orientation: Quat,
    /// Linear velocity (m/s).
    pub velocity: Vec3,
    /// Angular velocity in world frame (rad/s).
    pub angular_velocity: Vec3,
    /// Constant acceleration applied every step without accumulation (m/s²).
    pub acceleration: Vec3,
    /// Fraction of linear velocity kept per step, in [0, 1].
    pub linear_damping: f64,
    /// Fraction of angular velocity kept per step, in [0, 1].
    pub angular_damping: f64,
    shape: Shape,
    inverse_mass: f64,
    inverse_inertia_local: Mat3,
    inverse_inertia_world: Mat3,
    transform: Mat4,
    force_accum: Vec3,
    torque_accum: Vec3,
    last_acceleration: Vec3,
}

impl Rigidbody {
    /// Create a rigid body at rest with identity orientation.
    /// Masses below `MIN_MASS` are clamped.
    pub fn new(position: Vec3, mass: f64, shape: Shape) -> Self {
        let mut body = Self {
            position,
            orientation: Quat::identity(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            linear_damping: 0.99,
            angular_damping: 0.99,
            shape,
            inverse_mass: 0.0,
            inverse_inertia_local: Mat3::zeros(),
            inverse_inertia_world: Mat3::zeros(),
            transform: Mat4::identity(),
            force_accum: Vec3::zeros(),
            torque_accum: Vec3::zeros(),
            last_acceleration: Vec3::zeros(),
        };
        body.set_mass(mass);
        body
    }

    /// Create an immovable rigid body (infinite mass and inertia).
    pub fn fixed(position: Vec3, shape: Shape) -> Self {
        let mut body = Self::new(position, 1.0, shape);
        body.inverse_mass = 0.0;
        body.inverse_inertia_local = Mat3::zeros();
        body.calculate_derived_data();
        body
    }

    /// Builder: initial orientation (normalized).
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self.calculate_derived_data();
        self
    }

    /// Builder: initial linear velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: initial angular velocity.
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Builder: linear and angular damping, clamped to [0, 1].
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear.clamp(0.0, 1.0);
        self.angular_damping = angular.clamp(0.0, 1.0);
        self
    }

    /// Set mass (clamped to `MIN_MASS`) and rebuild the inertia tensor from the shape.
    pub fn set_mass(&mut self, mass: f64) {
        let (mass, inverse_mass) = clamp_mass(mass);
        self.inverse_mass = inverse_mass;
        self.set_inertia_tensor(&self.shape.inertia_tensor(mass));
    }

    /// Replace the local inertia tensor. A singular tensor locks rotation.
    pub fn set_inertia_tensor(&mut self, inertia: &Mat3) {
        self.inverse_inertia_local = inertia.try_inverse().unwrap_or_else(Mat3::zeros);
        self.calculate_derived_data();
    }

    /// Mass (kg); infinite for fixed bodies.
    pub fn mass(&self) -> f64 {
        if self.inverse_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Inverse mass (1/kg); zero for fixed bodies.
    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    /// Whether the body responds to forces and impulses.
    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Shape the inertia tensor was derived from.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Inverse inertia tensor in body frame.
    #[inline]
    pub fn inverse_inertia_local(&self) -> &Mat3 {
        &self.inverse_inertia_local
    }

    /// Inverse inertia tensor in world frame.
    #[inline]
    pub fn inverse_inertia_world(&self) -> &Mat3 {
        &self.inverse_inertia_world
    }

    /// Body-to-world transform.
    #[inline]
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Radius of the bounding sphere centred on `position`.
    pub fn bounding_radius(&self) -> f64 {
        self.shape.bounding_radius()
    }

    /// Normalize the orientation and rebuild transform and world inverse inertia.
    pub fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = transform_from(&self.position, &self.orientation);
        self.inverse_inertia_world =
            world_inverse_inertia(&self.inverse_inertia_local, &self.orientation.to_matrix());
    }

    /// Body-local point in world coordinates.
    pub fn point_in_world(&self, local: &Vec3) -> Vec3 {
        transform_point(&self.transform, local)
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn velocity_at_point(&self, point: &Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(&(point - self.position))
    }

    /// Add force at the centre of mass.
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    /// Add force at a world-space point; generates torque about the centre of mass.
    pub fn add_force_at_point(&mut self, force: Vec3, point: &Vec3) {
        let r = point - self.position;
        self.force_accum += force;
        self.torque_accum += r.cross(&force);
    }

    /// Add force at a body-local point.
    pub fn add_force_at_body_point(&mut self, force: Vec3, local: &Vec3) {
        let point = self.point_in_world(local);
        self.add_force_at_point(force, &point);
    }

    /// Add torque directly.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque_accum += torque;
    }

    /// Force accumulated so far this step.
    #[inline]
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    /// Torque accumulated so far this step.
    #[inline]
    pub fn accumulated_torque(&self) -> Vec3 {
        self.torque_accum
    }

    /// Reset force and torque accumulators.
    pub fn clear_accumulators(&mut self) {
        self.force_accum = Vec3::zeros();
        self.torque_accum = Vec3::zeros();
    }

    /// Linear acceleration during the last integration.
    #[inline]
    pub fn last_acceleration(&self) -> Vec3 {
        self.last_acceleration
    }

    /// Semi-implicit Euler step with damping and quaternion renormalization.
    pub fn integrate(&mut self, dt: f64) {
        if !self.has_finite_mass() {
            return;
        }

        self.last_acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        let angular_acceleration = self.inverse_inertia_world * self.torque_accum;

        self.velocity += self.last_acceleration * dt;
        self.angular_velocity += angular_acceleration * dt;

        self.velocity *= self.linear_damping;
        self.angular_velocity *= self.angular_damping;

        self.position += self.velocity * dt;
        self.orientation = self.orientation.integrate(&self.angular_velocity, dt);

        self.calculate_derived_data();
    }

    /// Translational plus rotational kinetic energy.
    pub fn kinetic_energy(&self) -> f64 {
        if !self.has_finite_mass() {
            return 0.0;
        }
        let linear = 0.5 * self.mass() * self.velocity.norm_squared();
        // L = I ω, with I recovered from the world inverse inertia when invertible
        let angular = match self.inverse_inertia_world.try_inverse() {
            Some(inertia) => 0.5 * self.angular_velocity.dot(&(inertia * self.angular_velocity)),
            None => 0.0,
        };
        linear + angular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigor_math::MIN_MASS;

    fn unit_cube() -> Shape {
        Shape::Cuboid {
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }

    #[test]
    fn test_inverse_inertia_consistent_with_mass() {
        let b = Rigidbody::new(Vec3::zeros(), 12.0, unit_cube());
        // I = m/12 * (1 + 1) = 2 on each axis
        assert_relative_eq!(b.inverse_inertia_local()[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(b.inverse_mass(), 1.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mass_clamped() {
        let b = Rigidbody::new(Vec3::zeros(), 0.0, Shape::Sphere { radius: 1.0 });
        assert_relative_eq!(b.inverse_mass(), 1.0 / MIN_MASS);
    }

    #[test]
    fn test_force_at_point_generates_torque() {
        let mut b = Rigidbody::new(Vec3::zeros(), 1.0, unit_cube());
        b.add_force_at_point(Vec3::new(0.0, 1.0, 0.0), &Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(b.accumulated_torque(), Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(b.accumulated_force(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_body_point_follows_orientation() {
        let q = Quat::from_axis_angle(&Vec3::z(), std::f64::consts::FRAC_PI_2);
        let b = Rigidbody::new(Vec3::new(1.0, 0.0, 0.0), 1.0, unit_cube()).with_orientation(q);
        let p = b.point_in_world(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_integrate_keeps_unit_orientation() {
        let mut b = Rigidbody::new(Vec3::zeros(), 1.0, unit_cube())
            .with_angular_velocity(Vec3::new(3.0, -7.0, 11.0))
            .with_damping(1.0, 1.0);
        for _ in 0..10_000 {
            b.integrate(1.0 / 60.0);
        }
        assert_relative_eq!(b.orientation.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_tracks_position() {
        let mut b = Rigidbody::new(Vec3::zeros(), 1.0, unit_cube())
            .with_velocity(Vec3::new(1.0, 0.0, 0.0))
            .with_damping(1.0, 1.0);
        b.integrate(0.5);
        assert_relative_eq!(b.point_in_world(&Vec3::zeros()), b.position);
    }

    #[test]
    fn test_fixed_body_ignores_forces() {
        let mut b = Rigidbody::fixed(Vec3::zeros(), unit_cube());
        b.add_force(Vec3::new(0.0, -10.0, 0.0));
        b.add_torque(Vec3::new(1.0, 0.0, 0.0));
        b.integrate(1.0);
        assert_eq!(b.position, Vec3::zeros());
        assert_eq!(*b.inverse_inertia_world(), Mat3::zeros());
    }
}
