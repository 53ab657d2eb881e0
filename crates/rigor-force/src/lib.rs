//! Force generators for rigor.
//!
//! A [`ForceRegistry`] pairs bodies with [`ForceGenerator`]s and applies them
//! in registration order at the start of every step:
//! - gravity, drag
//! - body-body and anchored springs
//! - buoyancy

pub mod generator;
pub mod registry;

pub use generator::{ForceGenerator, drag_force, spring_force, submerged_fraction};
pub use registry::ForceRegistry;
