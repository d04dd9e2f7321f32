//! Derived physical quantities that depend on more than one node.

use cosmo_core::constants::G;
use cosmo_core::vector;

use crate::tree::Hierarchy;
use crate::{HierarchyError, NodeId};

impl Hierarchy {
    /// Surface gravity of a node (m/s²); zero when the node is not loaded.
    pub fn surface_gravity(&self, id: NodeId) -> f64 {
        self.get(id).map_or(0.0, |node| node.surface_gravity())
    }

    /// Magnitude of the acceleration `source` imparts on `target` (m/s²).
    ///
    /// Inside the source's containing radius the source is treated as a
    /// uniform-density ball. Unloaded nodes contribute zero.
    pub fn gravitational_acceleration(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Result<f64, HierarchyError> {
        let Some(body) = self.get(source) else {
            return Ok(0.0);
        };
        if !self.contains(target) || source == target {
            return Ok(0.0);
        }
        let d = self.distance(source, target)?;
        let radius = body.shape().containing_radius();
        if d < radius {
            Ok(G * body.mass() * d / radius.powi(3))
        } else if d > 0.0 {
            Ok(G * body.mass() / (d * d))
        } else {
            Ok(0.0)
        }
    }

    /// Mean temperature (K) combining the node's intrinsic temperature with
    /// radiative equilibrium against the body it orbits.
    ///
    /// Falls back to the intrinsic temperature when there is no resolvable
    /// orbited body, and to zero for unloaded nodes. Cached until the node's
    /// position, shape, albedo or orbit changes, or the orbited body changes.
    pub fn average_temperature(&self, id: NodeId) -> f64 {
        let Some(node) = self.get(id) else {
            return 0.0;
        };
        if let Some(kelvin) = node.cached_average_temperature() {
            return kelvin;
        }

        let intrinsic = node.temperature();
        let equilibrium = node
            .orbit()
            .and_then(|o| self.get(o.orbited).map(|star| (star, &o.orbit)))
            .map_or(0.0, |(star, orbit)| {
                let a = if orbit.eccentricity() < 1.0 {
                    orbit.semi_major_axis()
                } else {
                    vector::norm(&orbit.position())
                };
                let radius = star.shape().containing_radius();
                if a <= 0.0 || radius <= 0.0 {
                    return 0.0;
                }
                star.temperature()
                    * (radius / (2.0 * a)).sqrt()
                    * (1.0 - node.albedo()).powf(0.25)
            });

        let kelvin = if equilibrium > 0.0 {
            (intrinsic.powi(4) + equilibrium.powi(4)).powf(0.25)
        } else {
            intrinsic
        };
        node.store_average_temperature(kelvin);
        kelvin
    }
}
