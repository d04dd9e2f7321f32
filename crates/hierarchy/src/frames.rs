//! Translation of positions between the local frames of two nodes.

use cosmo_core::vector::{self, Vector3, ZERO};

use crate::tree::Hierarchy;
use crate::{HierarchyError, NodeId};

impl Hierarchy {
    /// Re-express `position`, given in `from`'s local frame, in `to`'s local frame.
    ///
    /// Each level up applies `parent = node.position + p * node.scale / parent.scale`;
    /// the walk down applies the inverse. Fails when the nodes share no ancestor.
    pub fn translate(
        &self,
        from: NodeId,
        to: NodeId,
        position: Vector3,
    ) -> Result<Vector3, HierarchyError> {
        if from == to {
            return Ok(position);
        }
        let path_from = self.root_path(from);
        let path_to = self.root_path(to);
        let shared = path_from
            .iter()
            .zip(path_to.iter())
            .take_while(|(a, b)| a == b)
            .count();
        if shared == 0 {
            return Err(HierarchyError::NotInSameHierarchy { from, to });
        }

        let mut p = position;
        for pair in path_from[shared - 1..].windows(2).rev() {
            let (parent, child) = (self.node(pair[0])?, self.node(pair[1])?);
            let ratio = child.local_scale() / parent.local_scale();
            p = vector::add(&child.position(), &vector::scale(&p, ratio));
        }
        for pair in path_to[shared - 1..].windows(2) {
            let (parent, child) = (self.node(pair[0])?, self.node(pair[1])?);
            let ratio = parent.local_scale() / child.local_scale();
            p = vector::scale(&vector::sub(&p, &child.position()), ratio);
        }
        Ok(p)
    }

    /// Position of `node` (its own origin) expressed in `frame`'s local frame.
    pub fn position_in(&self, node: NodeId, frame: NodeId) -> Result<Vector3, HierarchyError> {
        self.translate(node, frame, ZERO)
    }

    /// Euclidean distance between two nodes in metres.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<f64, HierarchyError> {
        self.node(a)?;
        self.node(b)?;
        if a == b {
            return Ok(0.0);
        }
        let ancestor = self
            .find_common_ancestor(a, b)
            .ok_or(HierarchyError::NotInSameHierarchy { from: a, to: b })?;
        let pa = self.position_in(a, ancestor)?;
        let pb = self.position_in(b, ancestor)?;
        Ok(vector::distance(&pa, &pb) * self.node(ancestor)?.local_scale())
    }

    /// Vector from `from` to `to` in metres, oriented in the common ancestor's axes.
    pub fn separation(&self, from: NodeId, to: NodeId) -> Result<Vector3, HierarchyError> {
        let ancestor = self
            .find_common_ancestor(from, to)
            .ok_or(HierarchyError::NotInSameHierarchy { from, to })?;
        let pa = self.position_in(from, ancestor)?;
        let pb = self.position_in(to, ancestor)?;
        Ok(vector::scale(
            &vector::sub(&pb, &pa),
            self.node(ancestor)?.local_scale(),
        ))
    }
}
