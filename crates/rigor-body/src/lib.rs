//! Body model and state types for the rigor physics core.
//!
//! `Particle` and `Rigidbody` are the two body kinds; `BodySet` owns them and
//! hands out generational `BodyHandle`s so the broad phase, force registry and
//! contacts can refer to a body without borrowing it.
//! `State` is the immutable per-step snapshot used for render interpolation.

pub mod body;
pub mod particle;
pub mod rigidbody;
pub mod set;
pub mod shape;
pub mod state;

pub use body::Body;
pub use particle::Particle;
pub use rigidbody::Rigidbody;
pub use set::{BodyHandle, BodySet};
pub use shape::Shape;
pub use state::{Pose, State};

use rigor_math::MIN_MASS;

/// Clamp a configured mass to [`MIN_MASS`] and return it with its inverse.
///
/// Non-positive and NaN masses are configuration errors; they are clamped
/// here once, at construction, instead of being re-checked every step.
pub(crate) fn clamp_mass(mass: f64) -> (f64, f64) {
    if mass > MIN_MASS {
        (mass, 1.0 / mass)
    } else {
        log::warn!("mass {mass} is below the minimum, clamping to {MIN_MASS}");
        (MIN_MASS, 1.0 / MIN_MASS)
    }
}
