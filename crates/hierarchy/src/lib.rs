//! Spatial hierarchy of nested local frames.
//!
//! Every node expresses its children in a normalized local frame scaled to its
//! own containing radius, so a galaxy and a moon can live in the same tree
//! without either frame losing precision. The [`Hierarchy`] arena owns all
//! nodes; parent links are plain ids, never owning references.

pub mod grid;
pub mod node;
pub mod shape;
pub mod store;

mod frames;
mod motion;
mod physics;
mod tree;

use std::fmt;

use thiserror::Error;

pub use grid::{CellCoord, CellGrid};
pub use node::{Kind, Node, NodeOrbit};
pub use shape::{Bounds, Shape};
pub use store::{MemoryStore, NodeStore};
pub use tree::Hierarchy;

/// Stable identity of a node within a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors surfaced by hierarchy queries and mutations.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("nodes {from} and {to} do not share a common ancestor")]
    NotInSameHierarchy { from: NodeId, to: NodeId },
    #[error("node {0} is not loaded in this hierarchy")]
    UnknownNode(NodeId),
    #[error("cannot move {node} under its own descendant {new_parent}")]
    CyclicReparent { node: NodeId, new_parent: NodeId },
    #[error("orbit construction failed: {0}")]
    Orbit(#[from] cosmo_orbits::OrbitError),
}
