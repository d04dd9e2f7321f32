//! Orbit placement and application of propagated orbits to tree nodes.
//!
//! Orbit state is kept in metres relative to the orbited body. Writing it back
//! into the tree goes through the orbited body's local frame and is then
//! translated into the orbiting node's parent frame, which may be a different
//! branch of the hierarchy.

use cosmo_core::RandomSource;
use cosmo_core::constants::G;
use cosmo_core::vector::{self, Vector3};
use cosmo_orbits::{Orbit, PropagationSettings};

use crate::node::NodeOrbit;
use crate::tree::Hierarchy;
use crate::{HierarchyError, NodeId};

impl Hierarchy {
    /// Standard gravitational parameter of the two-body pair (m³/s²).
    pub fn gravitational_parameter(
        &self,
        orbiting: NodeId,
        orbited: NodeId,
    ) -> Result<f64, HierarchyError> {
        Ok(G * (self.node(orbited)?.mass() + self.node(orbiting)?.mass()))
    }

    /// Put `orbiting` on an orbit of the given eccentricity around `orbited`,
    /// starting from where it currently is.
    ///
    /// The node keeps its position; its velocity is overwritten with the
    /// orbital velocity.
    pub fn place_in_orbit(
        &mut self,
        orbiting: NodeId,
        orbited: NodeId,
        eccentricity: f64,
        rng: &mut dyn RandomSource,
    ) -> Result<(), HierarchyError> {
        let mu = self.gravitational_parameter(orbiting, orbited)?;
        let relative = self.separation(orbited, orbiting)?;
        let orbit = Orbit::from_eccentricity_and_position(mu, eccentricity, relative, rng)?;
        let node = self.node_mut(orbiting)?;
        node.write_velocity(orbit.velocity());
        node.write_orbit(Some(NodeOrbit { orbited, orbit }));
        Ok(())
    }

    /// Attach an existing orbit and move the node to the orbit's epoch state.
    pub fn set_orbit(
        &mut self,
        orbiting: NodeId,
        orbited: NodeId,
        orbit: Orbit,
    ) -> Result<(), HierarchyError> {
        self.node(orbited)?;
        self.node_mut(orbiting)?
            .write_orbit(Some(NodeOrbit { orbited, orbit }));
        self.apply_orbit(orbiting, 0.0)?;
        Ok(())
    }

    pub fn clear_orbit(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_orbit(None);
        Ok(())
    }

    /// Move a node to where its orbit puts it `elapsed` seconds after epoch.
    ///
    /// Returns `Ok(false)` without touching the node when it has no orbit or
    /// the orbited body cannot be resolved.
    pub fn apply_orbit(&mut self, id: NodeId, elapsed: f64) -> Result<bool, HierarchyError> {
        self.apply_orbit_with(id, elapsed, &PropagationSettings::default())
    }

    pub fn apply_orbit_with(
        &mut self,
        id: NodeId,
        elapsed: f64,
        settings: &PropagationSettings,
    ) -> Result<bool, HierarchyError> {
        let node = self.node(id)?;
        let Some(node_orbit) = node.orbit().cloned() else {
            return Ok(false);
        };
        let Some(frame) = node.parent() else {
            tracing::debug!(%id, "orbiting node has no parent frame");
            return Ok(false);
        };
        let orbited = node_orbit.orbited;
        let Some(orbited_scale) = self.resolve(orbited).map(|n| n.local_scale()) else {
            return Ok(false);
        };

        let state = node_orbit.orbit.propagate(elapsed, settings);
        let local = vector::scale(&state.position, 1.0 / orbited_scale);
        let position = self.translate(orbited, frame, local)?;

        let node = self.node_mut(id)?;
        node.write_position(position);
        node.write_velocity(state.velocity);
        Ok(true)
    }

    /// Re-base a node's orbit `dt` seconds forward and move the node there.
    pub fn advance_orbit(&mut self, id: NodeId, dt: f64) -> Result<bool, HierarchyError> {
        self.advance_orbit_with(id, dt, &PropagationSettings::default())
    }

    pub fn advance_orbit_with(
        &mut self,
        id: NodeId,
        dt: f64,
        settings: &PropagationSettings,
    ) -> Result<bool, HierarchyError> {
        let Some(node_orbit) = self.node(id)?.orbit().cloned() else {
            return Ok(false);
        };
        let state = node_orbit.orbit.propagate(dt, settings);
        let advanced =
            Orbit::from_state_vectors(node_orbit.orbit.mu(), state.position, state.velocity)?;
        self.node_mut(id)?.write_orbit(Some(NodeOrbit {
            orbited: node_orbit.orbited,
            orbit: advanced,
        }));
        let moved = self.apply_orbit_with(id, 0.0, settings);
        if moved.is_err() {
            // Orbit and position must stay in step.
            self.node_mut(id)?.write_orbit(Some(node_orbit));
        }
        moved
    }

    /// Re-derive a node's orbit from its current position and velocity,
    /// keeping its gravitational parameter.
    ///
    /// A state that no longer describes an orbit (zero separation, no angular
    /// momentum, orbited body gone) clears the orbit.
    pub fn refresh_orbit(&mut self, id: NodeId) {
        self.rederive_orbit(id, false);
    }

    /// As [`Self::refresh_orbit`], with the gravitational parameter recomputed
    /// from the current masses of both bodies.
    pub fn rebind_orbit(&mut self, id: NodeId) {
        self.rederive_orbit(id, true);
    }

    fn rederive_orbit(&mut self, id: NodeId, recompute_mu: bool) {
        let Some(node_orbit) = self.get(id).and_then(|n| n.orbit().cloned()) else {
            return;
        };
        let orbited = node_orbit.orbited;
        let rederived = self.relative_state(id, orbited).and_then(|(position, velocity)| {
            let mu = if recompute_mu {
                self.gravitational_parameter(id, orbited)?
            } else {
                node_orbit.orbit.mu()
            };
            Ok(Orbit::from_state_vectors(mu, position, velocity)?)
        });
        let replacement = match rederived {
            Ok(orbit) => Some(NodeOrbit { orbited, orbit }),
            Err(err) => {
                tracing::debug!(%id, %orbited, error = %err, "dropping orbit after state change");
                None
            }
        };
        if let Ok(node) = self.node_mut(id) {
            node.write_orbit(replacement);
        }
    }

    fn relative_state(
        &self,
        id: NodeId,
        orbited: NodeId,
    ) -> Result<(Vector3, Vector3), HierarchyError> {
        let position = self.separation(orbited, id)?;
        Ok((position, self.node(id)?.velocity()))
    }
}
