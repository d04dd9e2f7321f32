//! Tree nodes and their lazily cached derived quantities.

use std::cell::Cell;
use std::fmt;

use cosmo_core::constants::{G, LOCAL_SPACE_SIZE};
use cosmo_core::vector::{Vector3, ZERO};
use cosmo_orbits::Orbit;

use crate::grid::CellGrid;
use crate::shape::Shape;
use crate::NodeId;

/// Discriminator selecting a node's entry in a kind table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(String);

impl Kind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Kind {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An orbit tied to the node being orbited. The orbiting node owns this value;
/// the orbited node is only referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOrbit {
    pub orbited: NodeId,
    pub orbit: Orbit,
}

#[derive(Debug, Clone, Default)]
struct DerivedCache {
    local_scale: Cell<Option<f64>>,
    surface_gravity: Cell<Option<f64>>,
    average_temperature: Cell<Option<f64>>,
}

/// A region or point body in the hierarchy.
///
/// Nodes are built detached (id `#0`) and receive their identity when inserted
/// into a [`crate::Hierarchy`]. Mutations of attached nodes go through the
/// hierarchy so dependent caches and orbits are kept consistent.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    kind: Kind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    position: Vector3,
    velocity: Vector3,
    shape: Shape,
    footprint: f64,
    mass: f64,
    temperature: f64,
    albedo: f64,
    pub(crate) orbit: Option<NodeOrbit>,
    pub(crate) orbit_center: Option<NodeId>,
    pub(crate) prepopulated: bool,
    pub(crate) grid: Option<CellGrid>,
    cache: DerivedCache,
}

impl Node {
    /// New detached node with the given kind, bounding shape, and mass (kg).
    pub fn new(kind: impl Into<Kind>, shape: Shape, mass: f64) -> Self {
        Self {
            id: NodeId(0),
            kind: kind.into(),
            parent: None,
            children: Vec::new(),
            position: ZERO,
            velocity: ZERO,
            shape,
            footprint: 0.0,
            mass,
            temperature: 0.0,
            albedo: 0.0,
            orbit: None,
            orbit_center: None,
            prepopulated: false,
            grid: None,
            cache: DerivedCache::default(),
        }
    }

    /// Intrinsic temperature in kelvin.
    pub fn with_temperature(mut self, kelvin: f64) -> Self {
        self.temperature = kelvin;
        self
    }

    /// Bond albedo in `[0, 1]`.
    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo.clamp(0.0, 1.0);
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Radius of space (metres) kept clear around the node when placing siblings.
    pub fn with_footprint(mut self, footprint: f64) -> Self {
        self.footprint = footprint.max(0.0);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Position in the parent's local frame.
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Velocity in m/s, relative to the orbited body when orbiting, otherwise
    /// relative to the parent frame.
    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Occupied radius in metres; never smaller than the shape itself.
    pub fn footprint(&self) -> f64 {
        self.footprint.max(self.shape.containing_radius())
    }

    /// Mass in kilograms; the authoritative physical quantity.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Mean density (kg/m³); zero for point bodies.
    pub fn density(&self) -> f64 {
        let volume = self.shape.volume();
        if volume > 0.0 { self.mass / volume } else { 0.0 }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn albedo(&self) -> f64 {
        self.albedo
    }

    pub fn orbit(&self) -> Option<&NodeOrbit> {
        self.orbit.as_ref()
    }

    /// Child that other children of this region orbit, if any.
    pub fn orbit_center(&self) -> Option<NodeId> {
        self.orbit_center
    }

    /// Whether population has run at least once for this node.
    pub fn is_prepopulated(&self) -> bool {
        self.prepopulated
    }

    pub fn grid(&self) -> Option<&CellGrid> {
        self.grid.as_ref()
    }

    /// Metres per local-frame unit for this node's children.
    pub fn local_scale(&self) -> f64 {
        cached(&self.cache.local_scale, || {
            let radius = self.shape.containing_radius();
            if radius > 0.0 {
                radius / LOCAL_SPACE_SIZE
            } else {
                1.0 / LOCAL_SPACE_SIZE
            }
        })
    }

    /// Gravitational acceleration at the containing radius (m/s²); zero for points.
    pub fn surface_gravity(&self) -> f64 {
        cached(&self.cache.surface_gravity, || {
            let radius = self.shape.containing_radius();
            if radius > 0.0 {
                G * self.mass / (radius * radius)
            } else {
                0.0
            }
        })
    }

    pub(crate) fn cached_average_temperature(&self) -> Option<f64> {
        self.cache.average_temperature.get()
    }

    pub(crate) fn store_average_temperature(&self, kelvin: f64) {
        self.cache.average_temperature.set(Some(kelvin));
    }

    pub(crate) fn write_position(&mut self, position: Vector3) {
        self.position = position;
        self.cache.average_temperature.set(None);
    }

    pub(crate) fn write_velocity(&mut self, velocity: Vector3) {
        self.velocity = velocity;
    }

    pub(crate) fn write_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.grid = None;
        self.cache.local_scale.set(None);
        self.cache.surface_gravity.set(None);
        self.cache.average_temperature.set(None);
    }

    pub(crate) fn write_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.cache.surface_gravity.set(None);
    }

    pub(crate) fn write_temperature(&mut self, kelvin: f64) {
        self.temperature = kelvin;
        self.cache.average_temperature.set(None);
    }

    pub(crate) fn write_albedo(&mut self, albedo: f64) {
        self.albedo = albedo.clamp(0.0, 1.0);
        self.cache.average_temperature.set(None);
    }

    pub(crate) fn write_orbit(&mut self, orbit: Option<NodeOrbit>) {
        self.orbit = orbit;
        self.cache.average_temperature.set(None);
    }

    pub(crate) fn invalidate_temperature(&self) {
        self.cache.average_temperature.set(None);
    }
}

fn cached(slot: &Cell<Option<f64>>, compute: impl FnOnce() -> f64) -> f64 {
    if let Some(value) = slot.get() {
        return value;
    }
    let value = compute();
    slot.set(Some(value));
    value
}
