//! Time integration for rigor bodies.

pub mod integrator;

pub use integrator::{integrate, integrate_particle, integrate_rigidbody};

use rigor_body::{BodySet, State};

/// Pluggable integration scheme.
///
/// Implementations advance every body in the set by `dt` using the forces
/// already accumulated and return the resulting snapshot.
pub trait Integrator {
    fn integrate(&self, bodies: &mut BodySet, dt: f64, time: f64) -> State;
}

/// Semi-implicit (symplectic) Euler: velocity first, then position.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn integrate(&self, bodies: &mut BodySet, dt: f64, time: f64) -> State {
        integrate(bodies, dt, time)
    }
}
