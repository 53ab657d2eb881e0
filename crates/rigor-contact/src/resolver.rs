//! Iterative impulse-based contact resolver.
//!
//! Each step runs two passes over the contact batch:
//! 1. velocity: repeatedly pick the contact with the largest desired change
//!    in closing velocity, apply a frictionless impulse and propagate the
//!    resulting velocity change into every contact sharing a body;
//! 2. position: repeatedly pick the deepest contact and move its bodies apart
//!    along the normal, apportioned by inverse mass, updating the
//!    penetration of contacts sharing a body.
//!
//! Both passes stop once nothing exceeds its epsilon or the iteration budget
//! is spent.

use rigor_body::{BodyHandle, BodySet};
use rigor_collision::Contact;
use rigor_math::{Mat3, Vec3};

/// Denominators below this mean neither body can respond.
const MIN_EFFECTIVE_MASS: f64 = 1e-12;

/// Tuning for [`ContactResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    /// Velocity pass budget; 0 means twice the contact count.
    pub velocity_iterations: usize,
    /// Position pass budget; 0 means twice the contact count.
    pub position_iterations: usize,
    /// Desired velocity changes at or below this are left alone.
    pub velocity_epsilon: f64,
    /// Penetrations at or below this are left alone.
    pub position_epsilon: f64,
    /// Closing speeds below this resolve without restitution.
    pub restitution_velocity_limit: f64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            velocity_iterations: 0,
            position_iterations: 0,
            velocity_epsilon: 0.01,
            position_epsilon: 0.0001,
            restitution_velocity_limit: 0.25,
        }
    }
}

/// What the last [`ContactResolver::resolve`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub contacts: usize,
    pub velocity_iterations_used: usize,
    pub position_iterations_used: usize,
}

/// Per-contact data derived once per resolve call.
#[derive(Debug, Clone, Copy)]
struct Prepared {
    bodies: [Option<BodyHandle>; 2],
    basis: Mat3,
    /// Contact point relative to each body's centre.
    relative: [Vec3; 2],
    inverse_mass: [f64; 2],
    inverse_inertia: [Mat3; 2],
    /// Closing velocity in contact space; x is along the normal.
    velocity: Vec3,
    /// Normal velocity built up by last step's acceleration alone.
    velocity_from_acceleration: f64,
    restitution: f64,
    desired_delta_velocity: f64,
    /// Velocity change along the normal per unit impulse.
    delta_velocity_per_impulse: f64,
}

impl Prepared {
    fn new(contact: &Contact, bodies: &BodySet, dt: f64) -> Self {
        let basis = contact.basis();
        let mut prepared = Prepared {
            bodies: [None, None],
            basis,
            relative: [Vec3::zeros(); 2],
            inverse_mass: [0.0; 2],
            inverse_inertia: [Mat3::zeros(); 2],
            velocity: Vec3::zeros(),
            velocity_from_acceleration: 0.0,
            restitution: contact.restitution,
            desired_delta_velocity: 0.0,
            delta_velocity_per_impulse: 0.0,
        };

        for i in 0..2 {
            let Some((handle, body)) = contact.body_at(i).and_then(|h| bodies.get(h).map(|b| (h, b))) else {
                continue;
            };
            let sign = if i == 0 { 1.0 } else { -1.0 };
            let relative = contact.point - body.position();
            let inverse_inertia = body.inverse_inertia_world();

            prepared.bodies[i] = Some(handle);
            prepared.relative[i] = relative;
            prepared.inverse_mass[i] = body.inverse_mass();
            prepared.inverse_inertia[i] = inverse_inertia;

            let point_velocity = body.angular_velocity().cross(&relative) + body.velocity();
            prepared.velocity += basis.transpose() * point_velocity * sign;
            prepared.velocity_from_acceleration +=
                body.last_acceleration().dot(&contact.normal) * dt * sign;

            let angular = (inverse_inertia * relative.cross(&contact.normal)).cross(&relative);
            prepared.delta_velocity_per_impulse += angular.dot(&contact.normal) + body.inverse_mass();
        }
        prepared
    }

    fn update_desired_delta_velocity(&mut self, restitution_limit: f64) {
        if self.delta_velocity_per_impulse < MIN_EFFECTIVE_MASS {
            self.desired_delta_velocity = 0.0;
            return;
        }
        let closing = self.velocity.x;
        let restitution = if closing.abs() < restitution_limit {
            0.0
        } else {
            self.restitution
        };
        self.desired_delta_velocity =
            -closing - restitution * (closing - self.velocity_from_acceleration);
    }

    fn total_inverse_mass(&self) -> f64 {
        self.inverse_mass[0] + self.inverse_mass[1]
    }
}

/// Resolves a batch of contacts against the bodies they reference.
#[derive(Debug, Clone, Default)]
pub struct ContactResolver {
    pub settings: ResolverSettings,
    prepared: Vec<Prepared>,
}

impl ContactResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            prepared: Vec::new(),
        }
    }

    /// Resolve velocities, then interpenetration. Contact penetrations are
    /// updated in place as bodies move.
    pub fn resolve(&mut self, contacts: &mut [Contact], bodies: &mut BodySet, dt: f64) -> ResolutionStats {
        let mut stats = ResolutionStats {
            contacts: contacts.len(),
            ..Default::default()
        };
        if contacts.is_empty() {
            return stats;
        }

        self.prepare(contacts, bodies, dt);
        stats.velocity_iterations_used = self.adjust_velocities(contacts, bodies);
        stats.position_iterations_used = self.adjust_positions(contacts, bodies);

        log::debug!(
            "resolved {} contacts: {} velocity / {} position iterations",
            stats.contacts,
            stats.velocity_iterations_used,
            stats.position_iterations_used
        );
        stats
    }

    fn budget(configured: usize, contacts: usize) -> usize {
        if configured == 0 { contacts * 2 } else { configured }
    }

    fn prepare(&mut self, contacts: &[Contact], bodies: &BodySet, dt: f64) {
        let limit = self.settings.restitution_velocity_limit;
        self.prepared.clear();
        self.prepared.extend(contacts.iter().map(|c| {
            let mut p = Prepared::new(c, bodies, dt);
            p.update_desired_delta_velocity(limit);
            p
        }));
    }

    fn adjust_velocities(&mut self, contacts: &[Contact], bodies: &mut BodySet) -> usize {
        let budget = Self::budget(self.settings.velocity_iterations, self.prepared.len());
        let epsilon = self.settings.velocity_epsilon;
        let limit = self.settings.restitution_velocity_limit;

        let mut used = 0;
        while used < budget {
            let worst = self
                .prepared
                .iter()
                .enumerate()
                .filter(|(_, p)| p.desired_delta_velocity > epsilon)
                .max_by(|a, b| a.1.desired_delta_velocity.total_cmp(&b.1.desired_delta_velocity))
                .map(|(i, _)| i);
            let Some(index) = worst else {
                break;
            };

            let resolved = self.prepared[index];
            let impulse = resolved.basis.column(0)
                * (resolved.desired_delta_velocity / resolved.delta_velocity_per_impulse);

            let mut linear = [Vec3::zeros(); 2];
            let mut angular = [Vec3::zeros(); 2];
            for i in 0..2 {
                let Some(handle) = resolved.bodies[i] else {
                    continue;
                };
                let sign = if i == 0 { 1.0 } else { -1.0 };
                let j = impulse * sign;
                linear[i] = j * resolved.inverse_mass[i];
                angular[i] = resolved.inverse_inertia[i] * resolved.relative[i].cross(&j);
                if let Some(body) = bodies.get_mut(handle) {
                    body.apply_velocity_change(&linear[i], &angular[i]);
                }
            }

            for (c, p) in contacts.iter().zip(&mut self.prepared) {
                if !shares_body(c, &resolved.bodies) {
                    continue;
                }
                let mut touched = false;
                for b in 0..2 {
                    let Some(handle) = p.bodies[b] else {
                        continue;
                    };
                    for d in 0..2 {
                        if resolved.bodies[d] != Some(handle) {
                            continue;
                        }
                        let delta = linear[d] + angular[d].cross(&p.relative[b]);
                        let sign = if b == 0 { 1.0 } else { -1.0 };
                        p.velocity += p.basis.transpose() * delta * sign;
                        touched = true;
                    }
                }
                if touched {
                    p.update_desired_delta_velocity(limit);
                }
            }
            used += 1;
        }
        used
    }

    fn adjust_positions(&mut self, contacts: &mut [Contact], bodies: &mut BodySet) -> usize {
        let budget = Self::budget(self.settings.position_iterations, contacts.len());
        let epsilon = self.settings.position_epsilon;

        let mut used = 0;
        while used < budget {
            let worst = contacts
                .iter()
                .zip(&self.prepared)
                .enumerate()
                .filter(|(_, (c, p))| c.penetration > epsilon && p.total_inverse_mass() > 0.0)
                .max_by(|a, b| a.1.0.penetration.total_cmp(&b.1.0.penetration))
                .map(|(i, _)| i);
            let Some(index) = worst else {
                break;
            };

            let contact = contacts[index];
            let resolved = self.prepared[index];
            let total = resolved.total_inverse_mass();

            let mut moves = [Vec3::zeros(); 2];
            for i in 0..2 {
                let Some(handle) = resolved.bodies[i] else {
                    continue;
                };
                let sign = if i == 0 { 1.0 } else { -1.0 };
                moves[i] = contact.normal * (sign * contact.penetration * resolved.inverse_mass[i] / total);
                if let Some(body) = bodies.get_mut(handle) {
                    let position = body.position() + moves[i];
                    body.set_position(position);
                }
            }

            for (c, p) in contacts.iter_mut().zip(&self.prepared) {
                if !shares_body(c, &resolved.bodies) {
                    continue;
                }
                for b in 0..2 {
                    let Some(handle) = p.bodies[b] else {
                        continue;
                    };
                    for d in 0..2 {
                        if resolved.bodies[d] != Some(handle) {
                            continue;
                        }
                        let along_normal = moves[d].dot(&c.normal);
                        if b == 0 {
                            c.penetration -= along_normal;
                        } else {
                            c.penetration += along_normal;
                        }
                    }
                }
            }
            used += 1;
        }
        used
    }
}

fn shares_body(contact: &Contact, bodies: &[Option<BodyHandle>; 2]) -> bool {
    bodies.iter().flatten().any(|&h| contact.involves(h))
}
