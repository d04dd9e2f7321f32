//! Persistence collaborator used to resolve nodes outside the in-memory tree.

use std::collections::HashMap;

use crate::NodeId;
use crate::node::Node;

/// Lookup and save operations backing a partially loaded hierarchy.
///
/// A failed lookup is an expected outcome, not an error.
pub trait NodeStore {
    fn get(&self, id: NodeId) -> Option<Node>;
    fn save(&mut self, node: &Node);
}

/// `NodeStore` keeping snapshots in a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: HashMap<NodeId, Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).cloned()
    }

    fn save(&mut self, node: &Node) {
        self.nodes.insert(node.id(), node.clone());
    }
}
