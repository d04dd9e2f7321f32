//! Node arena: ownership, structure edits, and mutation entry points.

use std::collections::HashMap;

use cosmo_core::vector::{Vector3, ZERO};

use crate::grid::CellGrid;
use crate::node::Node;
use crate::shape::{Bounds, Shape};
use crate::store::NodeStore;
use crate::{HierarchyError, NodeId};

/// Arena owning every loaded node.
///
/// The core never discards nodes on its own; they live until [`Hierarchy::discard`].
#[derive(Default)]
pub struct Hierarchy {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    store: Option<Box<dyn NodeStore>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchy that falls back to `store` for nodes not yet loaded.
    pub fn with_store(store: Box<dyn NodeStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, HierarchyError> {
        self.nodes.get(&id).ok_or(HierarchyError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, HierarchyError> {
        self.nodes.get_mut(&id).ok_or(HierarchyError::UnknownNode(id))
    }

    fn allocate_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    /// Insert a node as the root of a new tree.
    pub fn insert_root(&mut self, mut node: Node) -> NodeId {
        let id = self.allocate_id();
        node.id = id;
        node.parent = None;
        node.children.clear();
        node.write_position(ZERO);
        self.nodes.insert(id, node);
        id
    }

    /// Attach `node` under `parent` at `position` in the parent's local frame.
    pub fn attach(
        &mut self,
        parent: NodeId,
        mut node: Node,
        position: Vector3,
    ) -> Result<NodeId, HierarchyError> {
        self.node(parent)?;
        let id = self.allocate_id();
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        node.write_position(position);
        self.nodes.insert(id, node);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Load `id` from the backing store when it is not in memory.
    ///
    /// Returns `None` when neither the arena nor the store knows the node.
    pub fn resolve(&mut self, id: NodeId) -> Option<&Node> {
        if !self.nodes.contains_key(&id) {
            let loaded = self.store.as_ref().and_then(|store| store.get(id));
            match loaded {
                Some(node) => {
                    tracing::debug!(%id, "loaded node from store");
                    self.next_id = self.next_id.max(id.0);
                    self.nodes.insert(id, node);
                }
                None => {
                    tracing::debug!(%id, "unresolved node reference");
                    return None;
                }
            }
        }
        self.nodes.get(&id)
    }

    /// Save a node to the backing store; a no-op without one.
    pub fn persist(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        let node = self.nodes.get(&id).ok_or(HierarchyError::UnknownNode(id))?;
        if let Some(store) = self.store.as_mut() {
            store.save(node);
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Direct children; empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Loaded path from the topmost ancestor down to `id`, both inclusive.
    ///
    /// The walk stops at the first ancestor not present in memory, so a
    /// partially loaded tree behaves as if its topmost loaded node were the root.
    pub fn root_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            path.push(node.id);
            current = node.parent.and_then(|parent| self.nodes.get(&parent));
        }
        path.reverse();
        path
    }

    /// Deepest node that is an ancestor of (or equal to) both `a` and `b`.
    pub fn find_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let path_a = self.root_path(a);
        let path_b = self.root_path(b);
        path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
    }

    /// Whether `ancestor` lies on `node`'s root path (a node is its own ancestor).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Move `node` under `new_parent`.
    ///
    /// When `new_parent` is one of the node's ancestors the position is
    /// re-expressed in the new frame. Otherwise the node is placed at the new
    /// parent's origin: this is the one operation that moves a node without a
    /// physical cause, and callers must reposition it if that matters.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), HierarchyError> {
        let current = self.node(node)?;
        let old_parent = current.parent;
        let old_position = current.position();
        self.node(new_parent)?;
        if self.is_ancestor(node, new_parent) {
            return Err(HierarchyError::CyclicReparent { node, new_parent });
        }
        if old_parent == Some(new_parent) {
            return Ok(());
        }

        let position = match old_parent {
            Some(old) if self.is_ancestor(new_parent, node) => {
                self.translate(old, new_parent, old_position)?
            }
            _ => {
                tracing::debug!(%node, %new_parent, "reparent outside root path resets position");
                ZERO
            }
        };

        if let Some(old) = old_parent {
            if let Some(parent) = self.nodes.get_mut(&old) {
                parent.children.retain(|child| *child != node);
            }
        }
        self.node_mut(new_parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(new_parent);
        self.set_position(node, position)
    }

    /// Cut `id` loose from its parent; it becomes the root of its own tree.
    ///
    /// A region losing its central body forgets it, so the next population
    /// pass places a new one.
    pub fn detach(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
            if parent.orbit_center == Some(id) {
                parent.orbit_center = None;
                tracing::debug!(region = %parent.id, center = %id, "central body removed");
            }
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Remove `id` and its whole sub-tree; returns the number of nodes dropped.
    pub fn discard(&mut self, id: NodeId) -> Result<usize, HierarchyError> {
        self.detach(id)?;
        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Set the child that other children of `region` orbit.
    pub fn set_orbit_center(
        &mut self,
        region: NodeId,
        center: Option<NodeId>,
    ) -> Result<(), HierarchyError> {
        self.node_mut(region)?.orbit_center = center;
        Ok(())
    }

    pub fn mark_prepopulated(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        self.node_mut(id)?.prepopulated = true;
        Ok(())
    }

    /// The region's cell grid, created with `cell_size` local units if missing.
    pub fn ensure_grid(
        &mut self,
        region: NodeId,
        cell_size: f64,
    ) -> Result<&mut CellGrid, HierarchyError> {
        let node = self.node_mut(region)?;
        Ok(node.grid.get_or_insert_with(|| CellGrid::new(cell_size)))
    }

    /// Children of `region` whose positions fall inside `bounds`.
    pub fn children_within(&self, region: NodeId, bounds: &Bounds) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&region) else {
            return Vec::new();
        };
        let scale = node.local_scale();
        node.children
            .iter()
            .filter(|child| {
                self.nodes
                    .get(child)
                    .is_some_and(|c| bounds.contains_local(&c.position(), scale))
            })
            .copied()
            .collect()
    }

    /// Move a node within its parent frame.
    ///
    /// Re-derives its orbit, and the orbits of bodies orbiting it, from the new state.
    pub fn set_position(&mut self, id: NodeId, position: Vector3) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_position(position);
        self.after_state_change(id);
        Ok(())
    }

    /// Set a node's velocity (m/s); orbits are re-derived as for [`Self::set_position`].
    pub fn set_velocity(&mut self, id: NodeId, velocity: Vector3) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_velocity(velocity);
        self.after_state_change(id);
        Ok(())
    }

    pub fn set_shape(&mut self, id: NodeId, shape: Shape) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_shape(shape);
        self.invalidate_orbiter_temperatures(id);
        Ok(())
    }

    /// Change a body's mass; orbits around it are re-derived for the new gravitational parameter.
    pub fn set_mass(&mut self, id: NodeId, mass: f64) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_mass(mass);
        self.rebind_orbit(id);
        for orbiter in self.orbiters_of(id) {
            self.rebind_orbit(orbiter);
        }
        Ok(())
    }

    pub fn set_temperature(&mut self, id: NodeId, kelvin: f64) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_temperature(kelvin);
        self.invalidate_orbiter_temperatures(id);
        Ok(())
    }

    pub fn set_albedo(&mut self, id: NodeId, albedo: f64) -> Result<(), HierarchyError> {
        self.node_mut(id)?.write_albedo(albedo);
        self.invalidate_orbiter_temperatures(id);
        Ok(())
    }

    /// Nodes whose orbit references `id` as the orbited body.
    pub fn orbiters_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.orbit.as_ref().is_some_and(|o| o.orbited == id))
            .map(|node| node.id)
            .collect()
    }

    fn after_state_change(&mut self, id: NodeId) {
        self.refresh_orbit(id);
        for orbiter in self.orbiters_of(id) {
            self.refresh_orbit(orbiter);
        }
    }

    fn invalidate_orbiter_temperatures(&self, id: NodeId) {
        for orbiter in self.orbiters_of(id) {
            if let Some(node) = self.nodes.get(&orbiter) {
                node.invalidate_temperature();
            }
        }
    }
}
