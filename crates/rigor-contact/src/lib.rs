//! Contact resolution for rigor.
//!
//! Contacts produced by `rigor-collision` are resolved in two sequential
//! passes by [`ContactResolver`]: velocity impulses first, then positional
//! projection to remove interpenetration. Friction is not modelled.

pub mod resolver;

pub use resolver::{ContactResolver, ResolutionStats, ResolverSettings};
