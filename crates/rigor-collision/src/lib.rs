//! Collision detection for rigor.
//!
//! Two stages:
//! - broad phase: a [`Bvh`] over bounding volumes reports leaf pairs whose
//!   volumes overlap ([`PotentialContact`]);
//! - narrow phase: closed-form detectors turn sphere, box and half-space
//!   pairs into at most one [`Contact`] each, written into a fixed-capacity
//!   [`ContactGenerator`].

pub mod bounding;
pub mod bvh;
pub mod contact;
pub mod narrow_phase;
pub mod primitive;

pub use bounding::{BoundingBox, BoundingSphere, BoundingVolume};
pub use bvh::{Bvh, Node, NodeId, NodeKind, PotentialContact};
pub use contact::{Contact, ContactGenerator, contact_basis};
pub use narrow_phase::{
    box_half_space, box_sphere, detect, intersects_box_half_space, intersects_sphere_half_space,
    intersects_sphere_sphere, sphere_half_space, sphere_sphere,
};
pub use primitive::{
    HalfSpace, Placed, Primitive, PrimitiveHandle, PrimitiveSet, WorldBox, WorldSphere,
};
