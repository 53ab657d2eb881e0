//! Incremental bounding volume hierarchy for the broad phase.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Bodies are
//! only ever stored at leaves; every internal node has exactly two children
//! and a volume that is the merge of theirs. The tree is never rebalanced.

use rigor_body::BodyHandle;

use crate::bounding::BoundingVolume;
use crate::primitive::PrimitiveHandle;

/// Index of a node in the arena.
pub type NodeId = usize;

/// Leaf payload or the two children of an internal node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Leaf {
        body: BodyHandle,
        primitive: Option<PrimitiveHandle>,
    },
    Internal {
        children: [NodeId; 2],
    },
}

#[derive(Debug, Clone)]
pub struct Node<V> {
    pub parent: Option<NodeId>,
    pub volume: V,
    pub kind: NodeKind,
}

impl<V> Node<V> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// Two leaves whose volumes overlap. Not yet a verified contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PotentialContact {
    pub bodies: [BodyHandle; 2],
    pub primitives: [Option<PrimitiveHandle>; 2],
}

/// Bounding volume hierarchy over volumes of type `V`.
#[derive(Debug, Clone)]
pub struct Bvh<V: BoundingVolume> {
    nodes: Vec<Option<Node<V>>>,
    free_list: Vec<NodeId>,
    root: Option<NodeId>,
    leaf_count: usize,
}

impl<V: BoundingVolume> Default for Bvh<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: BoundingVolume> Bvh<V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: None,
            leaf_count: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    /// Number of leaves.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes, leaves and internal.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Ids of all live nodes.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i))
    }

    /// Leaf payloads with their volumes.
    pub fn leaves(&self) -> impl Iterator<Item = (BodyHandle, Option<PrimitiveHandle>, &V)> {
        self.nodes.iter().filter_map(|n| match n {
            Some(Node {
                volume,
                kind: NodeKind::Leaf { body, primitive },
                ..
            }) => Some((*body, *primitive, volume)),
            _ => None,
        })
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.find_leaf(body).is_some()
    }

    /// Longest root-to-leaf path, in edges. Zero for an empty tree or a lone leaf.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, d)) = stack.pop() {
            deepest = deepest.max(d);
            if let Some(NodeKind::Internal { children }) = self.node(id).map(|n| n.kind) {
                stack.push((children[0], d + 1));
                stack.push((children[1], d + 1));
            }
        }
        deepest
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.root = None;
        self.leaf_count = 0;
    }

    fn alloc(&mut self, node: Node<V>) -> NodeId {
        match self.free_list.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn free(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id) {
            if slot.take().is_some() {
                self.free_list.push(id);
            }
        }
    }

    /// Insert a body with its volume and return the new leaf.
    ///
    /// Descends into the child whose volume grows least (ties go to child
    /// 0); the leaf reached becomes internal, with its old payload as child 0
    /// and the new one as child 1.
    pub fn insert(&mut self, body: BodyHandle, primitive: Option<PrimitiveHandle>, volume: V) -> NodeId {
        self.leaf_count += 1;
        let new_kind = NodeKind::Leaf { body, primitive };

        let Some(mut current) = self.root else {
            let id = self.alloc(Node {
                parent: None,
                volume,
                kind: new_kind,
            });
            self.root = Some(id);
            log::trace!("bvh: {body:?} inserted as root");
            return id;
        };

        loop {
            let Some(node) = self.node(current) else {
                break;
            };
            match node.kind {
                NodeKind::Leaf { .. } => break,
                NodeKind::Internal { children } => {
                    let growth = |id: NodeId| {
                        self.node(id)
                            .map_or(f64::INFINITY, |n| n.volume.growth(&volume))
                    };
                    current = if growth(children[1]) < growth(children[0]) {
                        children[1]
                    } else {
                        children[0]
                    };
                }
            }
        }

        let Some((old_volume, old_kind)) = self.node(current).map(|n| (n.volume.clone(), n.kind)) else {
            return current;
        };
        let first = self.alloc(Node {
            parent: Some(current),
            volume: old_volume,
            kind: old_kind,
        });
        let second = self.alloc(Node {
            parent: Some(current),
            volume,
            kind: new_kind,
        });
        if let Some(node) = self.nodes[current].as_mut() {
            node.kind = NodeKind::Internal {
                children: [first, second],
            };
        }
        self.recalculate_bounding_volume(current, true);
        log::trace!("bvh: {body:?} inserted by splitting leaf {current}");
        second
    }

    /// Remove every leaf holding `body`. Returns `false` if there were none.
    pub fn remove(&mut self, body: BodyHandle) -> bool {
        let mut removed = false;
        while let Some(leaf) = self.find_leaf(body) {
            self.remove_leaf(leaf);
            removed = true;
        }
        if removed {
            log::debug!("bvh: removed {body:?}, {} leaves remain", self.leaf_count);
        }
        removed
    }

    fn find_leaf(&self, body: BodyHandle) -> Option<NodeId> {
        self.nodes.iter().position(|n| {
            matches!(n, Some(Node { kind: NodeKind::Leaf { body: b, .. }, .. }) if *b == body)
        })
    }

    /// Remove a leaf: its sibling's contents move into the parent, both
    /// shells are freed and volumes are recomputed upward from the parent.
    fn remove_leaf(&mut self, leaf: NodeId) {
        let Some(parent) = self.node(leaf).map(|n| n.parent) else {
            return;
        };
        self.leaf_count = self.leaf_count.saturating_sub(1);

        let Some(parent) = parent else {
            self.free(leaf);
            self.root = None;
            return;
        };

        let sibling = match self.node(parent).map(|n| n.kind) {
            Some(NodeKind::Internal { children }) => {
                if children[0] == leaf {
                    children[1]
                } else {
                    children[0]
                }
            }
            _ => {
                self.free(leaf);
                return;
            }
        };
        let Some((volume, kind)) = self.node(sibling).map(|n| (n.volume.clone(), n.kind)) else {
            self.free(leaf);
            return;
        };

        if let Some(node) = self.nodes[parent].as_mut() {
            node.volume = volume;
            node.kind = kind;
        }
        if let NodeKind::Internal { children } = kind {
            for child in children {
                if let Some(c) = self.nodes[child].as_mut() {
                    c.parent = Some(parent);
                }
            }
        }
        self.free(sibling);
        self.free(leaf);
        self.recalculate_bounding_volume(parent, true);
    }

    /// Recompute an internal node's volume from its children; leaves keep
    /// their own. With `recurse`, continue through every ancestor.
    pub fn recalculate_bounding_volume(&mut self, id: NodeId, recurse: bool) {
        let mut current = Some(id);
        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                return;
            };
            let parent = node.parent;
            if let NodeKind::Internal { children } = node.kind {
                if let (Some(a), Some(b)) = (self.node(children[0]), self.node(children[1])) {
                    let merged = V::merge(&a.volume, &b.volume);
                    if let Some(n) = self.nodes[id].as_mut() {
                        n.volume = merged;
                    }
                }
            }
            current = if recurse { parent } else { None };
        }
    }

    /// Rebuild every leaf volume from `volume_of` and re-merge all internal
    /// volumes bottom-up. Leaves for which `volume_of` returns `None` keep
    /// their volume.
    pub fn refit<F>(&mut self, volume_of: F)
    where
        F: Fn(BodyHandle, Option<PrimitiveHandle>) -> Option<V>,
    {
        let Some(root) = self.root else {
            return;
        };
        // Pre-order, so walking it backwards visits children before parents.
        let mut order = Vec::with_capacity(self.node_count());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(NodeKind::Internal { children }) = self.node(id).map(|n| n.kind) {
                stack.extend(children);
            }
        }
        for &id in order.iter().rev() {
            let Some(kind) = self.node(id).map(|n| n.kind) else {
                continue;
            };
            match kind {
                NodeKind::Leaf { body, primitive } => {
                    if let Some(volume) = volume_of(body, primitive) {
                        if let Some(n) = self.nodes[id].as_mut() {
                            n.volume = volume;
                        }
                    }
                }
                NodeKind::Internal { .. } => self.recalculate_bounding_volume(id, false),
            }
        }
    }

    /// Collect overlapping leaf pairs into `out` (cleared first), writing at
    /// most `limit` records. Returns the number written.
    ///
    /// Each unordered pair of overlapping leaves is reported once; leaves of
    /// the same body are never paired.
    pub fn potential_contacts(&self, out: &mut Vec<PotentialContact>, limit: usize) -> usize {
        out.clear();
        let Some(root) = self.root else {
            return 0;
        };
        if limit == 0 {
            return 0;
        }
        let written = self.within(root, out, limit);
        if written == limit {
            log::debug!("bvh: potential contact buffer full at {limit}");
        }
        written
    }

    /// Pairs with both leaves under `id`.
    fn within(&self, id: NodeId, out: &mut Vec<PotentialContact>, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }
        let Some(NodeKind::Internal { children }) = self.node(id).map(|n| n.kind) else {
            return 0;
        };
        let mut count = self.within(children[0], out, limit);
        count += self.within(children[1], out, limit - count);
        count += self.between(children[0], children[1], out, limit - count);
        count
    }

    /// Pairs with one leaf under `a` and the other under `b`.
    fn between(&self, a: NodeId, b: NodeId, out: &mut Vec<PotentialContact>, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }
        let (Some(na), Some(nb)) = (self.node(a), self.node(b)) else {
            return 0;
        };
        if !na.volume.overlaps(&nb.volume) {
            return 0;
        }

        match (na.kind, nb.kind) {
            (
                NodeKind::Leaf {
                    body: body_a,
                    primitive: prim_a,
                },
                NodeKind::Leaf {
                    body: body_b,
                    primitive: prim_b,
                },
            ) => {
                if body_a == body_b {
                    return 0;
                }
                out.push(PotentialContact {
                    bodies: [body_a, body_b],
                    primitives: [prim_a, prim_b],
                });
                1
            }
            // A leaf on either side: split the other. Otherwise split the larger.
            (NodeKind::Internal { children }, NodeKind::Leaf { .. }) => {
                self.split_first(children, b, out, limit)
            }
            (NodeKind::Leaf { .. }, NodeKind::Internal { children }) => {
                self.split_first(children, a, out, limit)
            }
            (NodeKind::Internal { children: ca }, NodeKind::Internal { children: cb }) => {
                if na.volume.size() >= nb.volume.size() {
                    self.split_first(ca, b, out, limit)
                } else {
                    self.split_first(cb, a, out, limit)
                }
            }
        }
    }

    fn split_first(
        &self,
        children: [NodeId; 2],
        other: NodeId,
        out: &mut Vec<PotentialContact>,
        limit: usize,
    ) -> usize {
        let count = self.between(children[0], other, out, limit);
        count + self.between(children[1], other, out, limit - count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding::{BoundingBox, BoundingSphere};
    use rigor_body::{BodySet, Particle};
    use rigor_math::Vec3;
    use std::collections::HashSet;

    fn bodies(n: usize) -> (BodySet, Vec<BodyHandle>) {
        let mut set = BodySet::new();
        let hs = (0..n)
            .map(|i| set.insert(Particle::new(Vec3::new(i as f64, 0.0, 0.0), 1.0)))
            .collect();
        (set, hs)
    }

    fn sphere(x: f64, r: f64) -> BoundingSphere {
        BoundingSphere::new(Vec3::new(x, 0.0, 0.0), r)
    }

    fn assert_tight<V: BoundingVolume>(bvh: &Bvh<V>) {
        for id in bvh.node_ids() {
            let Some(node) = bvh.node(id) else { continue };
            if let NodeKind::Internal { children } = node.kind {
                for c in children {
                    let child = bvh.node(c).expect("live child");
                    assert_eq!(child.parent, Some(id));
                    assert!(node.volume.contains(&child.volume));
                    assert!(node.volume.size() >= child.volume.size() * (1.0 - 1e-9));
                }
            }
        }
    }

    #[test]
    fn test_first_insert_is_root_leaf() {
        let (_, h) = bodies(1);
        let mut bvh = Bvh::new();
        let leaf = bvh.insert(h[0], None, sphere(0.0, 1.0));
        assert_eq!(bvh.root(), Some(leaf));
        assert!(bvh.node(leaf).is_some_and(|n| n.is_leaf() && n.parent.is_none()));
        assert_eq!(bvh.len(), 1);
        assert_eq!(bvh.depth(), 0);
    }

    #[test]
    fn test_insert_splits_leaf() {
        let (_, h) = bodies(2);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(4.0, 1.0));
        let root = bvh.root().and_then(|r| bvh.node(r)).expect("root");
        let NodeKind::Internal { children } = root.kind else {
            panic!("root should be internal");
        };
        assert!(matches!(bvh.node(children[0]).map(|n| n.kind), Some(NodeKind::Leaf { body, .. }) if body == h[0]));
        assert!(matches!(bvh.node(children[1]).map(|n| n.kind), Some(NodeKind::Leaf { body, .. }) if body == h[1]));
        assert!((root.volume.radius - 3.0).abs() < 1e-12);
        assert_eq!(bvh.node_count(), 3);
    }

    #[test]
    fn test_insert_descends_least_growth() {
        let (_, h) = bodies(3);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(10.0, 1.0));
        // Close to the second leaf: it should be paired with it.
        bvh.insert(h[2], None, sphere(11.0, 1.0));
        let root = bvh.root().and_then(|r| bvh.node(r)).expect("root");
        let NodeKind::Internal { children } = root.kind else {
            panic!("root should be internal");
        };
        assert!(bvh.node(children[0]).is_some_and(Node::is_leaf));
        assert!(bvh.node(children[1]).is_some_and(|n| !n.is_leaf()));
        assert_tight(&bvh);
    }

    #[test]
    fn test_merge_tightness_many_bodies() {
        let (_, h) = bodies(32);
        let mut bvh = Bvh::new();
        for (i, &b) in h.iter().enumerate() {
            let x = ((i * 7919) % 97) as f64;
            bvh.insert(b, None, sphere(x, 0.5 + (i % 3) as f64));
        }
        assert_eq!(bvh.len(), 32);
        assert_eq!(bvh.node_count(), 63);
        assert_tight(&bvh);
    }

    #[test]
    fn test_remove_reverse_order_empties_tree() {
        let (_, h) = bodies(8);
        let mut bvh = Bvh::new();
        for (i, &b) in h.iter().enumerate() {
            bvh.insert(b, None, sphere(i as f64 * 1.5, 1.0));
        }
        for &b in h.iter().rev() {
            assert!(bvh.remove(b));
            assert_tight(&bvh);
        }
        assert!(bvh.is_empty());
        assert_eq!(bvh.root(), None);
        assert_eq!(bvh.len(), 0);
        assert_eq!(bvh.node_count(), 0);
    }

    #[test]
    fn test_remove_promotes_sibling_subtree() {
        let (_, h) = bodies(4);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(20.0, 1.0));
        bvh.insert(h[2], None, sphere(21.0, 1.0));
        bvh.insert(h[3], None, sphere(22.0, 1.0));
        assert!(bvh.remove(h[0]));
        assert_eq!(bvh.len(), 3);
        assert_eq!(bvh.node_count(), 5);
        let root = bvh.root().expect("root");
        assert!(bvh.node(root).is_some_and(|n| n.parent.is_none() && !n.is_leaf()));
        assert_tight(&bvh);
        for &b in &h[1..] {
            assert!(bvh.contains(b));
        }
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (mut set, h) = bodies(2);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        let gone = set.insert(Particle::new(Vec3::zeros(), 1.0));
        assert!(!bvh.remove(gone));
        assert!(!bvh.remove(h[1]));
        assert_eq!(bvh.len(), 1);
    }

    #[test]
    fn test_potential_contacts_limits() {
        let (_, h) = bodies(3);
        let mut bvh = Bvh::new();
        for (i, &b) in h.iter().enumerate() {
            bvh.insert(b, None, sphere(i as f64 * 0.5, 1.0));
        }
        let mut out = Vec::new();
        assert_eq!(bvh.potential_contacts(&mut out, 0), 0);
        assert!(out.is_empty());

        let n = bvh.potential_contacts(&mut out, 1000);
        assert_eq!(n, out.len());
        assert!(n <= 3);
        let unique: HashSet<_> = out
            .iter()
            .map(|p| {
                let mut pair = p.bodies;
                pair.sort();
                pair
            })
            .collect();
        assert_eq!(unique.len(), n);
        // All three overlap each other.
        assert_eq!(n, 3);

        assert_eq!(bvh.potential_contacts(&mut out, 2), 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_potential_contacts_skip_separated() {
        let (_, h) = bodies(3);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(1.0, 1.0));
        bvh.insert(h[2], None, sphere(50.0, 1.0));
        let mut out = Vec::new();
        assert_eq!(bvh.potential_contacts(&mut out, 10), 1);
        let pair: HashSet<_> = out[0].bodies.into_iter().collect();
        assert!(pair.contains(&h[0]) && pair.contains(&h[1]));
    }

    #[test]
    fn test_empty_tree_has_no_contacts() {
        let bvh: Bvh<BoundingSphere> = Bvh::new();
        let mut out = vec![];
        assert_eq!(bvh.potential_contacts(&mut out, 100), 0);
        assert_eq!(bvh.depth(), 0);
    }

    #[test]
    fn test_refit_follows_bodies() {
        let (mut set, h) = bodies(2);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(1.0, 1.0));
        if let Some(b) = set.get_mut(h[1]) {
            b.set_position(Vec3::new(10.0, 0.0, 0.0));
        }
        bvh.refit(|handle, _| set.get(handle).map(|b| BoundingSphere::new(b.position(), 1.0)));
        let mut out = Vec::new();
        assert_eq!(bvh.potential_contacts(&mut out, 10), 0);
        assert_tight(&bvh);
        let root = bvh.root().and_then(|r| bvh.node(r)).expect("root");
        assert!((root.volume.radius - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_refit_rederives_leaf_extent() {
        let (_, h) = bodies(2);
        let mut bvh = Bvh::new();
        bvh.insert(h[0], None, sphere(0.0, 1.0));
        bvh.insert(h[1], None, sphere(3.0, 1.0));
        let mut out = Vec::new();
        assert_eq!(bvh.potential_contacts(&mut out, 10), 0);

        // Same centres, grown radii.
        bvh.refit(|handle, _| {
            let x = if handle == h[0] { 0.0 } else { 3.0 };
            Some(BoundingSphere::new(Vec3::new(x, 0.0, 0.0), 2.0))
        });
        assert_eq!(bvh.potential_contacts(&mut out, 10), 1);
        assert_tight(&bvh);
    }

    #[test]
    fn test_box_volumes() {
        let (_, h) = bodies(4);
        let mut bvh = Bvh::new();
        for (i, &b) in h.iter().enumerate() {
            bvh.insert(
                b,
                None,
                BoundingBox::new(Vec3::new(i as f64 * 1.5, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            );
        }
        assert_tight(&bvh);
        let mut out = Vec::new();
        // Only neighbours overlap.
        assert_eq!(bvh.potential_contacts(&mut out, 100), 3);
    }
}
