//! Universal-variable propagation of two-body state vectors.
//!
//! One code path covers elliptical, parabolic, and hyperbolic orbits: Kepler's
//! equation is solved for the universal anomaly `x` by Newton iteration and the
//! Lagrange coefficients map the epoch state to the propagated one.

use cosmo_core::constants::ORBIT_TOLERANCE;
use cosmo_core::vector::{self, Vector3};

use crate::stumpff;
use crate::{Orbit, OrbitError};

/// Iteration controls for the Newton solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationSettings {
    /// Step size (relative to `max(1, |x|)`) below which the solve has converged.
    pub tolerance: f64,
    /// Hard cap on Newton iterations; the best estimate is used when it is hit.
    pub max_iterations: u32,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            tolerance: ORBIT_TOLERANCE,
            max_iterations: 64,
        }
    }
}

/// Propagated state plus solver diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagation {
    pub position: Vector3,
    pub velocity: Vector3,
    pub universal_anomaly: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Propagate `(r0, v0)` by `dt` seconds around a body with gravitational parameter `mu`.
pub fn propagate_state(
    mu: f64,
    r0: &Vector3,
    v0: &Vector3,
    dt: f64,
    settings: &PropagationSettings,
) -> Propagation {
    let r0_mag = vector::norm(r0);
    let v0_mag = vector::norm(v0);
    let sqrt_mu = mu.sqrt();
    let vr0 = vector::dot(r0, v0) / r0_mag;
    let alpha = 2.0 / r0_mag - v0_mag * v0_mag / mu;

    let mut x = initial_guess(mu, r0_mag, vr0, alpha, dt);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iterations {
        iterations += 1;
        let x2 = x * x;
        let z = alpha * x2;
        let (c, s) = (stumpff::c(z), stumpff::s(z));
        let f = r0_mag * vr0 / sqrt_mu * x2 * c + (1.0 - alpha * r0_mag) * x2 * x * s
            + r0_mag * x
            - sqrt_mu * dt;
        let df = r0_mag * vr0 / sqrt_mu * x * (1.0 - z * s)
            + (1.0 - alpha * r0_mag) * x2 * c
            + r0_mag;
        let step = f / df;
        if !step.is_finite() {
            break;
        }
        x -= step;
        if step.abs() <= settings.tolerance * x.abs().max(1.0) {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            dt,
            alpha,
            iterations,
            "universal anomaly did not converge; using best estimate"
        );
    }

    let x2 = x * x;
    let z = alpha * x2;
    let (c, s) = (stumpff::c(z), stumpff::s(z));

    let f = 1.0 - x2 / r0_mag * c;
    let g = dt - x2 * x / sqrt_mu * s;
    let position = vector::add(&vector::scale(r0, f), &vector::scale(v0, g));
    let r = vector::norm(&position);
    let f_dot = sqrt_mu / (r * r0_mag) * (alpha * x2 * x * s - x);
    let g_dot = 1.0 - x2 / r * c;
    let velocity = vector::add(&vector::scale(r0, f_dot), &vector::scale(v0, g_dot));

    Propagation {
        position,
        velocity,
        universal_anomaly: x,
        iterations,
        converged,
    }
}

fn initial_guess(mu: f64, r0: f64, vr0: f64, alpha: f64, dt: f64) -> f64 {
    let linear = mu.sqrt() * alpha.abs() * dt;
    if alpha >= 0.0 {
        return linear;
    }
    // The linear seed overshoots exponentially on long hyperbolic arcs.
    let a = 1.0 / alpha;
    let sign = if dt >= 0.0 { 1.0 } else { -1.0 };
    let log_seed = sign
        * (-a).sqrt()
        * ((-2.0 * mu * alpha * dt)
            / (r0 * vr0 + sign * (-mu * a).sqrt() * (1.0 - r0 * alpha)))
            .ln();
    if log_seed.is_finite() && log_seed.abs() < linear.abs() {
        log_seed
    } else {
        linear
    }
}

impl Orbit {
    /// Propagate the epoch state by `dt` seconds with explicit solver settings.
    pub fn propagate(&self, dt: f64, settings: &PropagationSettings) -> Propagation {
        let position = self.position();
        let velocity = self.velocity();
        if dt == 0.0 {
            return Propagation {
                position,
                velocity,
                universal_anomaly: 0.0,
                iterations: 0,
                converged: true,
            };
        }
        propagate_state(self.mu(), &position, &velocity, dt, settings)
    }

    /// Position and velocity relative to the orbited body `dt` seconds after epoch.
    pub fn state_at(&self, dt: f64) -> (Vector3, Vector3) {
        let propagated = self.propagate(dt, &PropagationSettings::default());
        (propagated.position, propagated.velocity)
    }

    /// The same orbit re-based to an epoch `dt` seconds later.
    pub fn advanced(&self, dt: f64) -> Result<Orbit, OrbitError> {
        let (position, velocity) = self.state_at(dt);
        Orbit::from_state_vectors(self.mu(), position, velocity)
    }
}
