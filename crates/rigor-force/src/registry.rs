//! Body/generator associations.

use rigor_body::{BodyHandle, BodySet};

use crate::generator::ForceGenerator;

#[derive(Debug, Clone, PartialEq)]
struct Registration {
    body: BodyHandle,
    generator: ForceGenerator,
}

/// Ordered list of (body, generator) pairs, evaluated once per step.
#[derive(Debug, Clone, Default)]
pub struct ForceRegistry {
    registrations: Vec<Registration>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `generator` to act on `body`. Duplicates are allowed and act twice.
    pub fn add(&mut self, body: BodyHandle, generator: ForceGenerator) {
        self.registrations.push(Registration { body, generator });
    }

    /// Remove the first matching association. Returns `false` if none existed.
    pub fn remove(&mut self, body: BodyHandle, generator: &ForceGenerator) -> bool {
        match self
            .registrations
            .iter()
            .position(|r| r.body == body && r.generator == *generator)
        {
            Some(i) => {
                self.registrations.remove(i);
                true
            }
            None => false,
        }
    }

    /// Drop every association that references `body`, as owner or as the
    /// far end of a spring. Returns the number removed.
    pub fn remove_body(&mut self, body: BodyHandle) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| {
            r.body != body
                && !matches!(r.generator, ForceGenerator::Spring { other, .. } if other == body)
        });
        let removed = before - self.registrations.len();
        if removed > 0 {
            log::debug!("dropped {removed} force registrations for removed body {body:?}");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &ForceGenerator)> {
        self.registrations.iter().map(|r| (r.body, &r.generator))
    }

    /// Apply every registered generator in registration order.
    pub fn update_forces(&self, bodies: &mut BodySet, dt: f64) {
        self.update_forces_filtered(bodies, dt, true);
    }

    /// As [`ForceRegistry::update_forces`], skipping gravity entries unless
    /// `include_gravity` is set.
    pub fn update_forces_filtered(&self, bodies: &mut BodySet, dt: f64, include_gravity: bool) {
        for r in &self.registrations {
            if !include_gravity && r.generator.is_gravity() {
                continue;
            }
            r.generator.update_force(r.body, bodies, dt);
        }
    }

    /// Sum of the potential energy stored by all conservative generators.
    pub fn potential_energy(&self, bodies: &BodySet) -> f64 {
        self.registrations
            .iter()
            .map(|r| r.generator.potential_energy(r.body, bodies))
            .sum()
    }
}
