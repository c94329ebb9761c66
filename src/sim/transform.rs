//! Transform arena with parent-to-child delta propagation
//!
//! Transforms form a forest: each transform carries an ordered list of child
//! handles into the same arena, and every mutating operation computes the
//! delta between old and new state and re-applies it to the whole subtree.
//! There are no parent back-pointers; a parent triggers child updates but
//! never owns them. Clients must mutate transforms only through the arena
//! operations, otherwise the tree goes inconsistent.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::rotate_point_around;

/// Handle into a [`Transforms`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformId(pub(crate) u32);

/// Position, rotation and scale of one simulated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: DVec2,
    /// Rotation in radians, counter-clockwise
    pub rotation: f64,
    /// Per-axis scale
    pub scale: DVec2,
    /// Ordered child handles; updated through [`Transforms::attach`]
    children: Vec<TransformId>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            rotation: 0.0,
            scale: DVec2::ONE,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Transform at `position` with no rotation and unit scale.
    pub fn at(position: DVec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Transform at `position` rotated by `rotation` radians.
    pub fn at_rotated(position: DVec2, rotation: f64) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Child handles in attachment order.
    pub fn children(&self) -> &[TransformId] {
        &self.children
    }
}

/// Arena owning every transform in a simulation.
///
/// Slots are never reclaimed: handles stay valid for the life of the world,
/// which keeps child lists safe after body removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transforms {
    items: Vec<Transform>,
}

impl Transforms {
    /// Add a transform, returning its handle.
    pub fn insert(&mut self, transform: Transform) -> TransformId {
        let id = TransformId(self.items.len() as u32);
        self.items.push(transform);
        id
    }

    /// Read access. Handles are only minted by [`insert`](Self::insert), so
    /// lookups cannot fail.
    pub fn get(&self, id: TransformId) -> &Transform {
        &self.items[id.0 as usize]
    }

    fn get_mut(&mut self, id: TransformId) -> &mut Transform {
        &mut self.items[id.0 as usize]
    }

    /// Number of transforms ever inserted.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the arena holds no transforms.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Attach `child` under `parent`. Rejected (with a log, returning
    /// `false`) when the attachment would create a cycle, when `child`
    /// already has a parent, or when `child == parent`.
    pub fn attach(&mut self, parent: TransformId, child: TransformId) -> bool {
        if parent == child {
            log::warn!("attach: transform cannot be its own child");
            return false;
        }
        if self.items.iter().any(|t| t.children.contains(&child)) {
            log::warn!("attach: transform {:?} already has a parent", child);
            return false;
        }
        if self.is_descendant(child, parent) {
            log::warn!("attach: {:?} is an ancestor of {:?}, cycle rejected", child, parent);
            return false;
        }
        self.get_mut(parent).children.push(child);
        true
    }

    /// True when `descendant` is reachable from `root` through child links.
    fn is_descendant(&self, root: TransformId, descendant: TransformId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for &child in &self.get(id).children {
                if child == descendant {
                    return true;
                }
                stack.push(child);
            }
        }
        false
    }

    /// Translate a transform and its whole subtree by `diff`.
    pub fn change_pos(&mut self, id: TransformId, diff: DVec2) {
        let children = self.get(id).children.clone();
        for child in children {
            self.change_pos(child, diff);
        }
        self.get_mut(id).position += diff;
    }

    /// Move a transform to `new_pos`; children keep their relative offsets.
    pub fn set_pos(&mut self, id: TransformId, new_pos: DVec2) {
        let diff = new_pos - self.get(id).position;
        self.change_pos(id, diff);
    }

    /// Rotate a transform by `delta` radians. Children orbit the parent's
    /// origin and inherit the rotation delta.
    pub fn rotate(&mut self, id: TransformId, delta: f64) {
        let origin = self.get(id).position;
        let children = self.get(id).children.clone();
        for child in children {
            let old = self.get(child).position;
            let new = rotate_point_around(old, origin, delta);
            // Spinning the child subtree about the child, then carrying it to
            // its orbit position, composes to a rigid rotation about the
            // parent origin.
            self.rotate(child, delta);
            self.change_pos(child, new - old);
        }
        self.get_mut(id).rotation += delta;
    }

    /// Set absolute rotation; propagates the delta like [`rotate`](Self::rotate).
    pub fn set_rot(&mut self, id: TransformId, new_rot: f64) {
        let delta = new_rot - self.get(id).rotation;
        self.rotate(id, delta);
    }

    /// Multiply scale by `factor`. Child offsets from the parent origin are
    /// scaled by the same factor, and child scales multiply.
    pub fn scale_by(&mut self, id: TransformId, factor: DVec2) {
        let origin = self.get(id).position;
        let children = self.get(id).children.clone();
        for child in children {
            let old = self.get(child).position;
            let new = origin + (old - origin) * factor;
            self.scale_by(child, factor);
            self.change_pos(child, new - old);
        }
        self.get_mut(id).scale *= factor;
    }

    /// Set absolute scale. A zero component in the current scale makes the
    /// ratio undefined; the call is rejected with a log.
    pub fn set_scale(&mut self, id: TransformId, new_scale: DVec2) {
        let old = self.get(id).scale;
        if old.x == 0.0 || old.y == 0.0 {
            log::warn!("set_scale: current scale {:?} has a zero component, rejected", old);
            return;
        }
        self.scale_by(id, new_scale / old);
        // Pin the node itself to the exact requested value
        self.get_mut(id).scale = new_scale;
    }

    /// Replace position, rotation and scale in one call, propagating all
    /// three deltas to the subtree (scale ratio, then rotation delta, then
    /// translation). Rejected when the current scale has a zero component.
    pub fn set_transform(&mut self, id: TransformId, position: DVec2, rotation: f64, scale: DVec2) {
        let old = self.get(id).scale;
        if old.x == 0.0 || old.y == 0.0 {
            log::warn!("set_transform: current scale {:?} has a zero component, rejected", old);
            return;
        }
        self.scale_by(id, scale / old);
        self.get_mut(id).scale = scale;
        self.set_rot(id, rotation);
        self.set_pos(id, position);
    }
}
