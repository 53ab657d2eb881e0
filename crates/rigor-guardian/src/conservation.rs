//! Conservation law monitoring for rigor worlds.
//!
//! Tracks energy, momentum, and angular momentum against a baseline to
//! detect numerical drift. Infinite-mass bodies are excluded throughout.

use rigor_body::{Body, BodySet};
use rigor_force::ForceRegistry;
use rigor_math::Vec3;

/// Baseline conservation quantities to track drift.
#[derive(Debug, Clone)]
pub struct ConservationState {
    pub baseline_energy: f64,
    pub baseline_momentum: Vec3,
    pub baseline_angular_momentum: Vec3,
}

impl ConservationState {
    /// Record the current totals as the baseline.
    pub fn new(bodies: &BodySet, forces: &ForceRegistry) -> Self {
        Self {
            baseline_energy: total_energy(bodies, forces),
            baseline_momentum: total_momentum(bodies),
            baseline_angular_momentum: total_angular_momentum(bodies),
        }
    }
}

/// Conservation law errors at the current step.
#[derive(Debug, Clone)]
pub struct ConservationMonitor {
    /// Relative energy error: |E - E₀| / |E₀|
    pub energy_error: f64,
    /// p - p₀
    pub momentum_error: Vec3,
    /// L - L₀
    pub angular_momentum_error: Vec3,
}

impl ConservationMonitor {
    /// Compare the current totals against `baseline`.
    pub fn check(baseline: &ConservationState, bodies: &BodySet, forces: &ForceRegistry) -> Self {
        let energy = total_energy(bodies, forces);

        let energy_error = if baseline.baseline_energy.abs() > 1e-12 {
            (energy - baseline.baseline_energy).abs() / baseline.baseline_energy.abs()
        } else {
            (energy - baseline.baseline_energy).abs()
        };

        let monitor = Self {
            energy_error,
            momentum_error: total_momentum(bodies) - baseline.baseline_momentum,
            angular_momentum_error: total_angular_momentum(bodies) - baseline.baseline_angular_momentum,
        };
        log::trace!(
            "conservation: dE={:.3e} |dp|={:.3e} |dL|={:.3e}",
            monitor.energy_error,
            monitor.momentum_error.norm(),
            monitor.angular_momentum_error.norm()
        );
        monitor
    }

    /// Whether any law drifted beyond its tolerance.
    pub fn is_violated(&self, energy_tol: f64, momentum_tol: f64, ang_momentum_tol: f64) -> bool {
        self.energy_error > energy_tol
            || self.momentum_error.norm() > momentum_tol
            || self.angular_momentum_error.norm() > ang_momentum_tol
    }

    /// Largest error across all laws, momentum terms squashed into [0, 1).
    pub fn max_relative_error(&self) -> f64 {
        let mom_rel = self.momentum_error.norm() / (1.0 + self.momentum_error.norm());
        let ang_rel = self.angular_momentum_error.norm() / (1.0 + self.angular_momentum_error.norm());
        self.energy_error.max(mom_rel).max(ang_rel)
    }
}

/// sum_i m_i v_i over finite-mass bodies.
pub fn total_momentum(bodies: &BodySet) -> Vec3 {
    bodies
        .iter()
        .filter(|(_, b)| b.has_finite_mass())
        .map(|(_, b)| b.momentum())
        .sum()
}

/// Translational plus rotational kinetic energy over finite-mass bodies.
pub fn total_kinetic_energy(bodies: &BodySet) -> f64 {
    bodies
        .iter()
        .filter(|(_, b)| b.has_finite_mass())
        .map(|(_, b)| b.kinetic_energy())
        .sum()
}

/// Kinetic energy plus the potential stored in the registry's gravity and
/// spring generators.
pub fn total_energy(bodies: &BodySet, forces: &ForceRegistry) -> f64 {
    total_kinetic_energy(bodies) + forces.potential_energy(bodies)
}

/// Angular momentum about the world origin: sum_i (x_i × m_i v_i + I_i ω_i).
/// Bodies with locked rotation contribute only their orbital term.
pub fn total_angular_momentum(bodies: &BodySet) -> Vec3 {
    let mut total = Vec3::zeros();
    for (_, body) in bodies.iter().filter(|(_, b)| b.has_finite_mass()) {
        total += body.position().cross(&body.momentum());
        if let Body::Rigid(r) = body {
            if let Some(inertia_world) = r.inverse_inertia_world().try_inverse() {
                total += inertia_world * r.angular_velocity;
            }
        }
    }
    total
}
