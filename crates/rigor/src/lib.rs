//! rigor: real-time rigid-body physics core.
//!
//! This is the umbrella crate that provides the [`World`] driver and
//! re-exports core types from sub-crates. A host calls [`World::step`] once
//! per fixed timestep (or [`World::advance`] once per rendered frame) and
//! reads positions back through [`State`] snapshots.

pub mod config;
pub mod error;
pub mod world;

pub use config::WorldConfig;
pub use error::{ConfigError, Result};
pub use world::World;

pub use rigor_body::{self, Body, BodyHandle, BodySet, Particle, Pose, Rigidbody, Shape, State};
pub use rigor_collision::{
    self, BoundingBox, BoundingSphere, BoundingVolume, Bvh, Contact, ContactGenerator, PotentialContact,
    Primitive, PrimitiveHandle,
};
pub use rigor_contact::{self, ContactResolver, ResolutionStats, ResolverSettings};
pub use rigor_force::{self, ForceGenerator, ForceRegistry};
pub use rigor_guardian::{self, ConservationMonitor, ConservationState, FixedTimestep};
pub use rigor_math::{self, GRAVITY, Mat3, Quat, Vec3};
pub use rigor_rigid::{self, Integrator, SemiImplicitEuler};
