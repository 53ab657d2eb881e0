//! Point-mass particle.

use rigor_math::Vec3;

use crate::clamp_mass;

/// A point mass with a force accumulator.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Position in world frame (m).
    pub position: Vec3,
    /// Velocity (m/s).
    pub velocity: Vec3,
    /// Constant acceleration applied every step without accumulation (m/s²).
    pub acceleration: Vec3,
    /// Fraction of velocity kept per step, in [0, 1].
    pub damping: f64,
    /// Collision radius used for the particle's bounding sphere (m).
    pub radius: f64,
    inverse_mass: f64,
    force_accum: Vec3,
    last_acceleration: Vec3,
}

impl Particle {
    /// Create a particle at rest. Masses below `MIN_MASS` are clamped.
    pub fn new(position: Vec3, mass: f64) -> Self {
        let (_, inverse_mass) = clamp_mass(mass);
        Self {
            position,
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            damping: 0.999,
            radius: 0.0,
            inverse_mass,
            force_accum: Vec3::zeros(),
            last_acceleration: Vec3::zeros(),
        }
    }

    /// Create an immovable particle (infinite mass).
    pub fn fixed(position: Vec3) -> Self {
        Self {
            inverse_mass: 0.0,
            ..Self::new(position, 1.0)
        }
    }

    /// Builder: initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: collision radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Builder: damping factor, clamped to [0, 1].
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Mass (kg); infinite for fixed particles.
    pub fn mass(&self) -> f64 {
        if self.inverse_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Set mass, clamping to `MIN_MASS`.
    pub fn set_mass(&mut self, mass: f64) {
        self.inverse_mass = clamp_mass(mass).1;
    }

    /// Inverse mass (1/kg); zero for fixed particles.
    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    /// Whether the particle responds to forces and impulses.
    #[inline]
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Add force to accumulator.
    pub fn add_force(&mut self, f: Vec3) {
        self.force_accum += f;
    }

    /// Force accumulated so far this step.
    #[inline]
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    /// Reset force accumulator.
    pub fn clear_accumulator(&mut self) {
        self.force_accum = Vec3::zeros();
    }

    /// Acceleration the particle experienced during the last integration.
    #[inline]
    pub fn last_acceleration(&self) -> Vec3 {
        self.last_acceleration
    }

    /// Semi-implicit Euler step: velocity first, then position.
    pub fn integrate(&mut self, dt: f64) {
        if !self.has_finite_mass() {
            return;
        }

        self.last_acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += self.last_acceleration * dt;
        self.velocity *= self.damping;
        self.position += self.velocity * dt;
    }

    /// Kinetic energy: 0.5 * m * v².
    pub fn kinetic_energy(&self) -> f64 {
        if !self.has_finite_mass() {
            return 0.0;
        }
        0.5 * self.mass() * self.velocity.norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigor_math::MIN_MASS;

    #[test]
    fn test_particle_creation() {
        let p = Particle::new(Vec3::new(1.0, 2.0, 3.0), 2.0);
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p.inverse_mass(), 0.5);
    }

    #[test]
    fn test_mass_clamped() {
        assert_relative_eq!(Particle::new(Vec3::zeros(), 0.0).inverse_mass(), 1.0 / MIN_MASS);
        assert_relative_eq!(Particle::new(Vec3::zeros(), -3.0).inverse_mass(), 1.0 / MIN_MASS);
        assert_relative_eq!(
            Particle::new(Vec3::zeros(), f64::NAN).inverse_mass(),
            1.0 / MIN_MASS
        );
    }

    #[test]
    fn test_semi_implicit_step() {
        let mut p = Particle::new(Vec3::zeros(), 1.0).with_damping(1.0);
        p.add_force(Vec3::new(1.0, 0.0, 0.0));
        p.integrate(0.1);

        // v = a*dt = 0.1; x = v*dt = 0.01 (velocity updated before position)
        assert_relative_eq!(p.velocity.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(p.position.x, 0.01, epsilon = 1e-12);
        assert_relative_eq!(p.last_acceleration().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_particle_does_not_move() {
        let mut p = Particle::fixed(Vec3::new(0.0, 5.0, 0.0)).with_velocity(Vec3::x());
        p.add_force(Vec3::new(0.0, -100.0, 0.0));
        p.integrate(1.0);
        assert_eq!(p.position, Vec3::new(0.0, 5.0, 0.0));
        assert!(p.mass().is_infinite());
        assert_eq!(p.kinetic_energy(), 0.0);
    }

    #[test]
    fn test_kinetic_energy() {
        let p = Particle::new(Vec3::zeros(), 2.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.kinetic_energy(), 1.0);
    }
}
