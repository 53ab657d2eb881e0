//! Keeping a rigor simulation honest.
//!
//! This crate provides:
//! - A fixed-timestep accumulator that turns variable frame times into whole
//!   simulation steps plus an interpolation factor
//! - Conservation monitoring (energy, momentum, angular momentum) to detect
//!   numerical drift

pub mod conservation;
pub mod time_step;

pub use conservation::{
    ConservationMonitor, ConservationState, total_angular_momentum, total_energy,
    total_kinetic_energy, total_momentum,
};
pub use time_step::FixedTimestep;
