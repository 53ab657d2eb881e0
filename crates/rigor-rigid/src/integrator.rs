//! Semi-implicit Euler integration.
//!
//! Velocity is updated from the accumulated force before position, which
//! keeps the scheme stable for stiff springs and resting contact at the
//! step sizes a game loop uses. Damping is multiplied in every step.

use rigor_body::{Body, BodySet, Particle, Rigidbody, State};

/// Advance a single particle.
#[inline]
pub fn integrate_particle(particle: &mut Particle, dt: f64) {
    particle.integrate(dt);
}

/// Advance a single rigid body: linear and angular velocity, damping,
/// position, orientation, then derived transform and world inverse inertia.
#[inline]
pub fn integrate_rigidbody(body: &mut Rigidbody, dt: f64) {
    body.integrate(dt);
}

/// Advance every body in `bodies` and return the resulting state at
/// `time + dt`.
///
/// Accumulators are left untouched; the caller clears them at the start of
/// the next step.
pub fn integrate(bodies: &mut BodySet, dt: f64, time: f64) -> State {
    if dt <= 0.0 {
        log::warn!("non-positive timestep {dt}, bodies not advanced");
        return State::capture(bodies, time);
    }
    for (_, body) in bodies.iter_mut() {
        match body {
            Body::Particle(p) => integrate_particle(p, dt),
            Body::Rigid(r) => integrate_rigidbody(r, dt),
        }
    }
    State::capture(bodies, time + dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rigor_body::Shape;
    use rigor_math::{GRAVITY, Quat, Vec3};

    #[test]
    fn test_free_fall_matches_semi_implicit_sum() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::zeros(), 1.0).with_damping(1.0));
        let dt = 0.01;
        let n = 100;
        let mut time = 0.0;
        for _ in 0..n {
            bodies.clear_accumulators();
            if let Some(b) = bodies.get_mut(h) {
                b.add_force(Vec3::new(0.0, -GRAVITY, 0.0));
            }
            time = integrate(&mut bodies, dt, time).time;
        }
        // Semi-implicit: y_n = -g dt² n(n+1)/2
        let expected = -GRAVITY * dt * dt * (n * (n + 1)) as f64 / 2.0;
        let y = bodies.get(h).map(|b| b.position().y).unwrap_or_default();
        assert_relative_eq!(y, expected, epsilon = 1e-9);
        assert_relative_eq!(time, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_state_lists_every_body() {
        let mut bodies = BodySet::new();
        bodies.insert(Particle::new(Vec3::zeros(), 1.0));
        bodies.insert(Rigidbody::new(Vec3::zeros(), 1.0, Shape::Sphere { radius: 1.0 }));
        let state = integrate(&mut bodies, 0.01, 0.0);
        assert_eq!(state.particles.len(), 1);
        assert_eq!(state.rigidbodies.len(), 1);
        assert_relative_eq!(state.time, 0.01);
    }

    #[test]
    fn test_non_positive_dt_leaves_bodies() {
        let mut bodies = BodySet::new();
        let h = bodies.insert(Particle::new(Vec3::zeros(), 1.0).with_velocity(Vec3::x()));
        let state = integrate(&mut bodies, 0.0, 2.0);
        assert_eq!(state.time, 2.0);
        assert_eq!(bodies.get(h).map(|b| b.position()), Some(Vec3::zeros()));
    }

    #[test]
    fn test_spin_about_z() {
        let mut body = Rigidbody::new(Vec3::zeros(), 1.0, Shape::Sphere { radius: 1.0 })
            .with_angular_velocity(Vec3::new(0.0, 0.0, 1.0))
            .with_damping(1.0, 1.0);
        let dt = 1e-4;
        for _ in 0..(std::f64::consts::FRAC_PI_2 / dt).round() as usize {
            integrate_rigidbody(&mut body, dt);
        }
        // Quarter turn: body x axis now points along world y.
        let x_axis = body.orientation.rotate(&Vec3::x());
        assert_relative_eq!(x_axis, Vec3::y(), epsilon = 1e-3);
        let expected = Quat::from_axis_angle(&Vec3::z(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(body.orientation.w, expected.w, epsilon = 1e-3);
    }
}
