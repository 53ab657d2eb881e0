//! Force generators.

use rigor_body::{BodyHandle, BodySet};
use rigor_math::{GRAVITY, Vec3};

/// Speeds below this produce no drag.
const DRAG_SPEED_EPSILON: f64 = 1e-9;

/// Spring endpoints closer than this produce no force.
const SPRING_LENGTH_EPSILON: f64 = 1e-12;

/// A source of force applied to one body each step.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceGenerator {
    /// Uniform gravitational acceleration: F = m g.
    Gravity { g: Vec3 },

    /// Velocity drag: F = -v̂ (k1 |v| + k2 |v|²).
    Drag { k1: f64, k2: f64 },

    /// Hooke spring to another body. Both ends receive equal and opposite
    /// forces at their (body-local) connection points.
    Spring {
        other: BodyHandle,
        connection_point: Vec3,
        other_connection_point: Vec3,
        k: f64,
        rest_length: f64,
    },

    /// Hooke spring to a fixed world-space anchor.
    AnchoredSpring {
        anchor: Vec3,
        connection_point: Vec3,
        k: f64,
        rest_length: f64,
    },

    /// Buoyancy of a liquid whose surface is the plane y = `water_height`.
    ///
    /// The body is fully submerged when its centre of buoyancy lies
    /// `max_depth` below the surface and dry `max_depth` above it; the lift
    /// is linear in between.
    Buoyancy {
        max_depth: f64,
        volume: f64,
        water_height: f64,
        liquid_density: f64,
        centre_of_buoyancy: Vec3,
        gravity: f64,
    },
}

impl ForceGenerator {
    /// Gravity with acceleration `g`.
    pub fn gravity(g: Vec3) -> Self {
        ForceGenerator::Gravity { g }
    }

    /// Earth gravity along -y.
    pub fn earth_gravity() -> Self {
        ForceGenerator::Gravity {
            g: Vec3::new(0.0, -GRAVITY, 0.0),
        }
    }

    pub fn drag(k1: f64, k2: f64) -> Self {
        ForceGenerator::Drag { k1, k2 }
    }

    /// Centre-to-centre spring to `other`.
    pub fn spring(other: BodyHandle, k: f64, rest_length: f64) -> Self {
        ForceGenerator::Spring {
            other,
            connection_point: Vec3::zeros(),
            other_connection_point: Vec3::zeros(),
            k,
            rest_length,
        }
    }

    /// Centre spring to a world anchor.
    pub fn anchored_spring(anchor: Vec3, k: f64, rest_length: f64) -> Self {
        ForceGenerator::AnchoredSpring {
            anchor,
            connection_point: Vec3::zeros(),
            k,
            rest_length,
        }
    }

    /// Buoyancy in water (density 1000 kg/m³) under Earth gravity.
    pub fn buoyancy(max_depth: f64, volume: f64, water_height: f64) -> Self {
        ForceGenerator::Buoyancy {
            max_depth,
            volume,
            water_height,
            liquid_density: 1000.0,
            centre_of_buoyancy: Vec3::zeros(),
            gravity: GRAVITY,
        }
    }

    pub fn is_gravity(&self) -> bool {
        matches!(self, ForceGenerator::Gravity { .. })
    }

    /// Add this generator's force to `body` (and, for springs, to the other
    /// end). Stale handles and infinite-mass targets are skipped.
    pub fn update_force(&self, body: BodyHandle, bodies: &mut BodySet, _dt: f64) {
        match self {
            ForceGenerator::Gravity { g } => {
                if let Some(b) = bodies.get_mut(body).filter(|b| b.has_finite_mass()) {
                    let mass = b.mass();
                    b.add_force(g * mass);
                }
            }
            ForceGenerator::Drag { k1, k2 } => {
                if let Some(b) = bodies.get_mut(body).filter(|b| b.has_finite_mass()) {
                    b.add_force(drag_force(&b.velocity(), *k1, *k2));
                }
            }
            ForceGenerator::Spring {
                other,
                connection_point,
                other_connection_point,
                k,
                rest_length,
            } => {
                let Some((a, b)) = bodies.get2_mut(body, *other) else {
                    return;
                };
                let end_a = a.point_in_world(connection_point);
                let end_b = b.point_in_world(other_connection_point);
                if let Some(force) = spring_force(&(end_a - end_b), *k, *rest_length) {
                    a.add_force_at_point(force, &end_a);
                    b.add_force_at_point(-force, &end_b);
                }
            }
            ForceGenerator::AnchoredSpring {
                anchor,
                connection_point,
                k,
                rest_length,
            } => {
                let Some(b) = bodies.get_mut(body) else {
                    return;
                };
                let end = b.point_in_world(connection_point);
                if let Some(force) = spring_force(&(end - anchor), *k, *rest_length) {
                    b.add_force_at_point(force, &end);
                }
            }
            ForceGenerator::Buoyancy {
                max_depth,
                volume,
                water_height,
                liquid_density,
                centre_of_buoyancy,
                gravity,
            } => {
                let Some(b) = bodies.get_mut(body) else {
                    return;
                };
                let point = b.point_in_world(centre_of_buoyancy);
                let fraction = submerged_fraction(point.y, *water_height, *max_depth);
                if fraction > 0.0 {
                    let lift = liquid_density * volume * gravity * fraction;
                    b.add_force_at_point(Vec3::new(0.0, lift, 0.0), &point);
                }
            }
        }
    }

    /// Potential energy this generator stores for `body`. Dissipative
    /// generators (drag, buoyancy) report zero.
    pub fn potential_energy(&self, body: BodyHandle, bodies: &BodySet) -> f64 {
        match self {
            ForceGenerator::Gravity { g } => bodies
                .get(body)
                .filter(|b| b.has_finite_mass())
                .map_or(0.0, |b| -b.mass() * g.dot(&b.position())),
            ForceGenerator::Spring {
                other,
                connection_point,
                other_connection_point,
                k,
                rest_length,
            } => match (bodies.get(body), bodies.get(*other)) {
                (Some(a), Some(b)) => {
                    let d = a.point_in_world(connection_point) - b.point_in_world(other_connection_point);
                    spring_energy(d.norm(), *k, *rest_length)
                }
                _ => 0.0,
            },
            ForceGenerator::AnchoredSpring {
                anchor,
                connection_point,
                k,
                rest_length,
            } => bodies.get(body).map_or(0.0, |b| {
                spring_energy((b.point_in_world(connection_point) - anchor).norm(), *k, *rest_length)
            }),
            ForceGenerator::Drag { .. } | ForceGenerator::Buoyancy { .. } => 0.0,
        }
    }
}

/// F = -v̂ (k1 |v| + k2 |v|²), zero at negligible speed.
pub fn drag_force(velocity: &Vec3, k1: f64, k2: f64) -> Vec3 {
    let speed = velocity.norm();
    if speed < DRAG_SPEED_EPSILON {
        return Vec3::zeros();
    }
    -velocity / speed * (k1 * speed + k2 * speed * speed)
}

/// Hooke force on the end at `d` relative to the other end:
/// F = -k (|d| - rest) d̂. `None` when the ends coincide.
pub fn spring_force(d: &Vec3, k: f64, rest_length: f64) -> Option<Vec3> {
    let length = d.norm();
    if length < SPRING_LENGTH_EPSILON {
        return None;
    }
    Some(-d / length * (k * (length - rest_length)))
}

fn spring_energy(length: f64, k: f64, rest_length: f64) -> f64 {
    let stretch = length - rest_length;
    0.5 * k * stretch * stretch
}

/// Fraction of the body below the surface, in [0, 1].
pub fn submerged_fraction(depth: f64, water_height: f64, max_depth: f64) -> f64 {
    if max_depth <= 0.0 {
        return if depth < water_height { 1.0 } else { 0.0 };
    }
    ((water_height + max_depth - depth) / (2.0 * max_depth)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigor_body::{Body, Particle, Rigidbody, Shape};

    #[test]
    fn test_gravity_scales_with_mass() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::zeros(), 2.0));
        ForceGenerator::earth_gravity().update_force(h, &mut bodies, 0.01);
        let f = bodies.get(h).map(Body::accumulated_force).expect("body");
        assert_relative_eq!(f.y, -2.0 * GRAVITY);
    }

    #[test]
    fn test_gravity_skips_fixed_body() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::fixed(Vec3::zeros()));
        ForceGenerator::earth_gravity().update_force(h, &mut bodies, 0.01);
        assert_eq!(bodies.get(h).map(Body::accumulated_force), Some(Vec3::zeros()));
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let f = drag_force(&Vec3::new(2.0, 0.0, 0.0), 1.0, 0.5);
        // -(1*2 + 0.5*4) = -4
        assert_relative_eq!(f, Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(drag_force(&Vec3::zeros(), 1.0, 1.0), Vec3::zeros());
    }

    #[test]
    fn test_spring_at_rest_length_is_zero() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        let b = bodies.insert(Particle::new(Vec3::new(2.0, 0.0, 0.0), 1.0));
        ForceGenerator::spring(b, 10.0, 2.0).update_force(a, &mut bodies, 0.01);
        assert_relative_eq!(bodies.get(a).map(Body::accumulated_force).expect("body").norm(), 0.0);
        assert_relative_eq!(bodies.get(b).map(Body::accumulated_force).expect("body").norm(), 0.0);
    }

    #[test]
    fn test_stretched_spring_pulls_ends_together() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        let b = bodies.insert(Particle::new(Vec3::new(3.0, 0.0, 0.0), 1.0));
        ForceGenerator::spring(b, 10.0, 2.0).update_force(a, &mut bodies, 0.01);
        let fa = bodies.get(a).map(Body::accumulated_force).expect("body");
        let fb = bodies.get(b).map(Body::accumulated_force).expect("body");
        assert_relative_eq!(fa, Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(fb, Vec3::new(-10.0, 0.0, 0.0));
    }

    #[test]
    fn test_spring_to_removed_body_is_noop() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        let b = bodies.insert(Particle::new(Vec3::new(3.0, 0.0, 0.0), 1.0));
        bodies.remove(b);
        ForceGenerator::spring(b, 10.0, 2.0).update_force(a, &mut bodies, 0.01);
        assert_eq!(bodies.get(a).map(Body::accumulated_force), Some(Vec3::zeros()));
    }

    #[test]
    fn test_coincident_spring_ends_skipped() {
        assert!(spring_force(&Vec3::zeros(), 10.0, 1.0).is_none());
    }

    #[test]
    fn test_offset_spring_produces_torque() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Rigidbody::new(
            Vec3::zeros(),
            1.0,
            Shape::Cuboid {
                half_extents: Vec3::new(0.5, 0.5, 0.5),
            },
        ));
        let spring = ForceGenerator::AnchoredSpring {
            anchor: Vec3::new(0.5, 5.0, 0.0),
            connection_point: Vec3::new(0.5, 0.0, 0.0),
            k: 1.0,
            rest_length: 1.0,
        };
        spring.update_force(h, &mut bodies, 0.01);
        let torque = bodies
            .get(h)
            .and_then(|b| b.as_rigid())
            .map(|r| r.accumulated_torque())
            .expect("rigid body");
        // Upward pull at +x turns the body about +z.
        assert!(torque.z > 0.0);
    }

    #[test]
    fn test_submerged_fraction_bounds() {
        assert_eq!(submerged_fraction(2.0, 0.0, 1.0), 0.0);
        assert_eq!(submerged_fraction(-2.0, 0.0, 1.0), 1.0);
        assert_relative_eq!(submerged_fraction(0.0, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_full_buoyancy() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::new(0.0, -10.0, 0.0), 1.0));
        ForceGenerator::buoyancy(0.5, 0.1, 0.0).update_force(h, &mut bodies, 0.01);
        let f = bodies.get(h).map(Body::accumulated_force).expect("body");
        assert_relative_eq!(f.y, 1000.0 * 0.1 * GRAVITY, epsilon = 1e-9);
    }

    #[test]
    fn test_gravity_potential_energy() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::new(0.0, 10.0, 0.0), 2.0));
        let u = ForceGenerator::earth_gravity().potential_energy(h, &bodies);
        assert_relative_eq!(u, 2.0 * GRAVITY * 10.0, epsilon = 1e-9);
    }
}
