//! World configuration and its JSON loader.

use crate::error::{ConfigError, Result};
use rigor_contact::ResolverSettings;
use rigor_math::{GRAVITY, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a [`World`](crate::World). Every key is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity vector [x, y, z] used by [`World::add_gravity`](crate::World::add_gravity).
    pub gravity: [f64; 3],
    /// Fixed simulation step (s).
    pub fixed_dt: f64,
    /// Frame-time clamp for the fixed-step accumulator (s).
    pub max_frame_time: f64,
    /// Broad-phase pair buffer capacity.
    pub max_potential_contacts: usize,
    /// Narrow-phase contact buffer capacity.
    pub max_contacts: usize,
    /// Velocity pass budget; 0 means twice the contact count.
    pub velocity_iterations: usize,
    /// Position pass budget; 0 means twice the contact count.
    pub position_iterations: usize,
    pub velocity_epsilon: f64,
    pub position_epsilon: f64,
    /// Restitution stamped on generated contacts.
    pub restitution: f64,
    /// Closing speed below which restitution is ignored.
    pub restitution_velocity_limit: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let resolver = ResolverSettings::default();
        Self {
            gravity: [0.0, -GRAVITY, 0.0],
            fixed_dt: 0.01,
            max_frame_time: 0.015,
            max_potential_contacts: 1024,
            max_contacts: 256,
            velocity_iterations: resolver.velocity_iterations,
            position_iterations: resolver.position_iterations,
            velocity_epsilon: resolver.velocity_epsilon,
            position_epsilon: resolver.position_epsilon,
            restitution: 0.0,
            restitution_velocity_limit: resolver.restitution_velocity_limit,
        }
    }
}

impl WorldConfig {
    /// Defaults without gravity.
    pub fn zero_gravity() -> Self {
        Self {
            gravity: [0.0; 3],
            ..Self::default()
        }
    }

    /// Defaults with lively contacts.
    pub fn bouncy() -> Self {
        Self {
            restitution: 0.8,
            ..Self::default()
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from(self.gravity)
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            velocity_iterations: self.velocity_iterations,
            position_iterations: self.position_iterations,
            velocity_epsilon: self.velocity_epsilon,
            position_epsilon: self.position_epsilon,
            restitution_velocity_limit: self.restitution_velocity_limit,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(invalid(format!("gravity must be finite, got {:?}", self.gravity)));
        }
        if !(self.fixed_dt > 0.0) {
            return Err(invalid(format!("fixed_dt must be positive, got {}", self.fixed_dt)));
        }
        if !(self.max_frame_time >= self.fixed_dt) {
            return Err(invalid(format!(
                "max_frame_time {} is below fixed_dt {}",
                self.max_frame_time, self.fixed_dt
            )));
        }
        if !(self.velocity_epsilon >= 0.0) || !(self.position_epsilon >= 0.0) {
            return Err(invalid("epsilons must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(invalid(format!("restitution must be in [0, 1], got {}", self.restitution)));
        }
        if !(self.restitution_velocity_limit >= 0.0) {
            return Err(invalid(format!(
                "restitution_velocity_limit must be non-negative, got {}",
                self.restitution_velocity_limit
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidParameter(message)
}
