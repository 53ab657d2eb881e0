//! Immutable per-step snapshots used for render interpolation.

use std::ops::{Add, Mul};

use rigor_math::{Quat, Vec3};

use crate::body::Body;
use crate::set::BodySet;

/// Position and orientation of one rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Snapshot of all body poses at a simulation time.
///
/// Particles and rigid bodies are listed separately, each in [`BodySet`]
/// iteration order. Blending two states with `current * alpha + previous *
/// (1 - alpha)` only makes sense when both were captured from the same set
/// of bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub time: f64,
    pub particles: Vec<Vec3>,
    pub rigidbodies: Vec<Pose>,
}

impl State {
    /// Record the current poses of every body.
    pub fn capture(bodies: &BodySet, time: f64) -> Self {
        let mut particles = Vec::new();
        let mut rigidbodies = Vec::new();
        for (_, body) in bodies.iter() {
            match body {
                Body::Particle(p) => particles.push(p.position),
                Body::Rigid(r) => rigidbodies.push(Pose {
                    position: r.position,
                    orientation: r.orientation,
                }),
            }
        }
        Self {
            time,
            particles,
            rigidbodies,
        }
    }

    /// Blend towards `current` by `alpha` (clamped to [0, 1]), renormalizing
    /// the orientations.
    pub fn interpolate(previous: &State, current: &State, alpha: f64) -> State {
        let alpha = alpha.clamp(0.0, 1.0);
        let mut blended = current.clone() * alpha + previous.clone() * (1.0 - alpha);
        for pose in &mut blended.rigidbodies {
            pose.orientation = pose.orientation.normalize();
        }
        blended
    }

    pub fn len(&self) -> usize {
        self.particles.len() + self.rigidbodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Mul<f64> for State {
    type Output = State;

    fn mul(self, s: f64) -> State {
        State {
            time: self.time * s,
            particles: self.particles.into_iter().map(|p| p * s).collect(),
            rigidbodies: self
                .rigidbodies
                .into_iter()
                .map(|pose| Pose {
                    position: pose.position * s,
                    orientation: pose.orientation * s,
                })
                .collect(),
        }
    }
}

impl Add for State {
    type Output = State;

    /// Pairwise sum; entries past the shorter snapshot are dropped.
    fn add(self, other: State) -> State {
        State {
            time: self.time + other.time,
            particles: self
                .particles
                .iter()
                .zip(&other.particles)
                .map(|(a, b)| a + b)
                .collect(),
            rigidbodies: self
                .rigidbodies
                .iter()
                .zip(&other.rigidbodies)
                .map(|(a, b)| Pose {
                    position: a.position + b.position,
                    orientation: a.orientation + b.orientation,
                })
                .collect(),
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn interpolation_stays_between_endpoints(
            a in -100.0f64..100.0,
            b in -100.0f64..100.0,
            angle in 0.0f64..3.0,
            alpha in -1.0f64..2.0,
        ) {
            let previous = State {
                time: 0.0,
                particles: vec![Vec3::new(a, 0.0, 0.0)],
                rigidbodies: vec![Pose { position: Vec3::zeros(), orientation: Quat::identity() }],
            };
            let current = State {
                time: 1.0,
                particles: vec![Vec3::new(b, 0.0, 0.0)],
                rigidbodies: vec![Pose {
                    position: Vec3::zeros(),
                    orientation: Quat::from_axis_angle(&Vec3::y(), angle),
                }],
            };
            let blended = State::interpolate(&previous, &current, alpha);
            let x = blended.particles[0].x;
            prop_assert!(x >= a.min(b) - 1e-9 && x <= a.max(b) + 1e-9);
            prop_assert!((blended.rigidbodies[0].orientation.norm() - 1.0).abs() < 1e-9);
            prop_assert!(blended.time >= 0.0 && blended.time <= 1.0);
        }
    }
}
