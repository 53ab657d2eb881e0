//! The simulation driver.
//!
//! A [`World`] owns the bodies, the force registry, the collision primitives,
//! the optional broad phase and the contact buffers, and runs one fixed step
//! at a time:
//!
//! 1. clear force and torque accumulators
//! 2. run registered force generators (gravity optionally filtered out)
//! 3. integrate
//! 4. if collisions are enabled: refit the BVH, collect potential pairs,
//!    generate contacts (BVH pairs, then every body primitive against every
//!    static half-space) and resolve them

use crate::config::WorldConfig;
use rigor_body::{Body, BodyHandle, BodySet, State};
use rigor_collision::{
    BoundingSphere, Bvh, Contact, ContactGenerator, NodeId, PotentialContact, Primitive, PrimitiveHandle,
    PrimitiveSet,
};
use rigor_contact::{ContactResolver, ResolutionStats};
use rigor_force::{ForceGenerator, ForceRegistry};
use rigor_guardian::FixedTimestep;
use rigor_rigid::{Integrator, SemiImplicitEuler};

pub struct World {
    config: WorldConfig,
    bodies: BodySet,
    forces: ForceRegistry,
    primitives: PrimitiveSet,
    broad_phase: Option<Bvh<BoundingSphere>>,
    potential: Vec<PotentialContact>,
    contacts: ContactGenerator,
    resolver: ContactResolver,
    integrator: SemiImplicitEuler,
    timestep: FixedTimestep,
    stats: ResolutionStats,
    state: State,
    previous_state: State,
    time: f64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::from_config(WorldConfig::default())
    }

    /// Build an empty world. Buffers are sized from `config` once, here.
    pub fn from_config(config: WorldConfig) -> Self {
        Self {
            bodies: BodySet::new(),
            forces: ForceRegistry::new(),
            primitives: PrimitiveSet::new(),
            broad_phase: None,
            potential: Vec::with_capacity(config.max_potential_contacts),
            contacts: ContactGenerator::new(config.max_contacts).with_restitution(config.restitution),
            resolver: ContactResolver::new(config.resolver_settings()),
            integrator: SemiImplicitEuler,
            timestep: FixedTimestep::new(config.fixed_dt, config.max_frame_time),
            stats: ResolutionStats::default(),
            state: State::default(),
            previous_state: State::default(),
            time: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -- bodies ------------------------------------------------------------

    pub fn add_body(&mut self, body: impl Into<Body>) -> BodyHandle {
        let handle = self.bodies.insert(body);
        self.resnapshot();
        handle
    }

    /// Remove a body together with its broad-phase leaves, force
    /// associations and primitives. Unknown handles are a no-op.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(handle)?;
        let dropped = self.forces.remove_body(handle);
        if let Some(bvh) = &mut self.broad_phase {
            bvh.remove(handle);
        }
        for primitive in self.primitives.attached_to(handle) {
            self.primitives.remove(primitive);
        }
        log::debug!("removed body {handle:?} and {dropped} force associations");
        self.resnapshot();
        Some(body)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    // -- forces ------------------------------------------------------------

    pub fn add_force(&mut self, body: BodyHandle, generator: ForceGenerator) {
        self.forces.add(body, generator);
    }

    /// Register the configured gravity on `body`.
    pub fn add_gravity(&mut self, body: BodyHandle) {
        self.forces.add(body, ForceGenerator::gravity(self.config.gravity()));
    }

    pub fn remove_force(&mut self, body: BodyHandle, generator: &ForceGenerator) -> bool {
        self.forces.remove(body, generator)
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    pub fn forces(&self) -> &ForceRegistry {
        &self.forces
    }

    // -- collision geometry ------------------------------------------------

    pub fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveHandle {
        self.primitives.insert(primitive)
    }

    /// Broad-phase leaves that still name a removed primitive stop producing
    /// contacts.
    pub fn remove_primitive(&mut self, handle: PrimitiveHandle) -> Option<Primitive> {
        self.primitives.remove(handle)
    }

    pub fn primitives(&self) -> &PrimitiveSet {
        &self.primitives
    }

    /// Add a leaf for `body` to the broad phase, creating an empty BVH first
    /// if none is set. The leaf sphere encloses `primitive` when given,
    /// otherwise the body's own extent. Returns `None` for unknown bodies or
    /// primitives.
    pub fn insert_into_broad_phase(
        &mut self,
        body: BodyHandle,
        primitive: Option<PrimitiveHandle>,
    ) -> Option<NodeId> {
        let volume = leaf_volume(&self.primitives, &self.bodies, body, primitive)?;
        let bvh = self.broad_phase.get_or_insert_with(Bvh::new);
        Some(bvh.insert(body, primitive, volume))
    }

    /// Attach `primitive` to its body and register it with the broad phase.
    /// Half-spaces are only stored.
    pub fn add_collider(&mut self, primitive: Primitive) -> PrimitiveHandle {
        let handle = self.primitives.insert(primitive);
        if let Some(body) = primitive.body() {
            self.insert_into_broad_phase(body, Some(handle));
        }
        handle
    }

    pub fn set_broad_phase(&mut self, bvh: Bvh<BoundingSphere>) {
        self.broad_phase = Some(bvh);
    }

    pub fn broad_phase(&self) -> Option<&Bvh<BoundingSphere>> {
        self.broad_phase.as_ref()
    }

    pub fn broad_phase_mut(&mut self) -> Option<&mut Bvh<BoundingSphere>> {
        self.broad_phase.as_mut()
    }

    // -- stepping ----------------------------------------------------------

    /// Advance the simulation by one step of `dt` and return the new state.
    pub fn step(&mut self, dt: f64, gravity_enabled: bool, detect_collisions: bool) -> &State {
        self.bodies.clear_accumulators();
        self.forces.update_forces_filtered(&mut self.bodies, dt, gravity_enabled);

        let mut state = self.integrator.integrate(&mut self.bodies, dt, self.time);

        self.potential.clear();
        self.contacts.clear();
        self.stats = ResolutionStats::default();
        if detect_collisions && dt > 0.0 {
            self.detect();
            self.stats = self.resolver.resolve(self.contacts.contacts_mut(), &mut self.bodies, dt);
            if self.stats.position_iterations_used > 0 {
                state = State::capture(&self.bodies, state.time);
            }
        }

        self.time = state.time;
        self.previous_state = std::mem::replace(&mut self.state, state);
        &self.state
    }

    /// Feed one frame's wall-clock time through the fixed-step accumulator,
    /// run every step that falls due and return the state interpolated to
    /// the frame.
    pub fn advance(&mut self, frame_time: f64, gravity_enabled: bool, detect_collisions: bool) -> State {
        let due = self.timestep.accumulate(frame_time);
        let dt = self.timestep.dt();
        for _ in 0..due {
            self.step(dt, gravity_enabled, detect_collisions);
        }
        self.interpolated_state(self.timestep.alpha())
    }

    fn detect(&mut self) {
        if let Some(bvh) = &mut self.broad_phase {
            let bodies = &self.bodies;
            let primitives = &self.primitives;
            bvh.refit(|body, primitive| leaf_volume(primitives, bodies, body, primitive));
            bvh.potential_contacts(&mut self.potential, self.config.max_potential_contacts);
        }

        for pair in &self.potential {
            if self.contacts.is_full() {
                break;
            }
            let a = leaf_primitive(&self.primitives, &self.bodies, pair.bodies[0], pair.primitives[0]);
            let b = leaf_primitive(&self.primitives, &self.bodies, pair.bodies[1], pair.primitives[1]);
            if let (Some(a), Some(b)) = (a, b) {
                self.contacts.generate(&a, &b, &self.bodies);
            }
        }

        'planes: for (_, plane) in self.primitives.iter().filter(|(_, p)| p.body().is_none()) {
            for (_, primitive) in self.primitives.iter().filter(|(_, p)| p.body().is_some()) {
                if self.contacts.is_full() {
                    log::debug!("contact buffer full at {}", self.contacts.capacity());
                    break 'planes;
                }
                self.contacts.generate(primitive, plane, &self.bodies);
            }
        }
        log::trace!(
            "{} potential pairs, {} contacts",
            self.potential.len(),
            self.contacts.len()
        );
    }

    /// Capture the current poses as both the current and previous state, so
    /// interpolation stays aligned after the body set changes.
    fn resnapshot(&mut self) {
        self.state = State::capture(&self.bodies, self.time);
        self.previous_state = self.state.clone();
    }

    // -- queries -----------------------------------------------------------

    /// Broad-phase pairs from the last step.
    pub fn potential_contacts(&self) -> &[PotentialContact] {
        &self.potential
    }

    /// Contacts generated during the last step, after resolution.
    pub fn contacts(&self) -> &[Contact] {
        self.contacts.contacts()
    }

    pub fn resolution_stats(&self) -> ResolutionStats {
        self.stats
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn previous_state(&self) -> &State {
        &self.previous_state
    }

    /// `current * alpha + previous * (1 - alpha)`.
    pub fn interpolated_state(&self, alpha: f64) -> State {
        State::interpolate(&self.previous_state, &self.state, alpha)
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

/// Sphere a broad-phase leaf should occupy right now: around the named
/// primitive, or around the body itself when none is named. A removed body
/// or primitive yields `None`.
fn leaf_volume(
    primitives: &PrimitiveSet,
    bodies: &BodySet,
    body: BodyHandle,
    primitive: Option<PrimitiveHandle>,
) -> Option<BoundingSphere> {
    let b = bodies.get(body)?;
    match primitive {
        Some(handle) => {
            let p = primitives.get(handle)?;
            Some(BoundingSphere::new(b.position(), p.bounding_radius()))
        }
        None => Some(BoundingSphere::around(b)),
    }
}

/// Primitive a broad-phase leaf stands for. A leaf without one collides as
/// its body's bounding sphere; a leaf naming a removed primitive collides as
/// nothing.
fn leaf_primitive(
    primitives: &PrimitiveSet,
    bodies: &BodySet,
    body: BodyHandle,
    primitive: Option<PrimitiveHandle>,
) -> Option<Primitive> {
    match primitive {
        Some(handle) => primitives.get(handle).copied(),
        None => Primitive::for_body(body, bodies.get(body)?),
    }
}
