//! Shape arena: ownership, membership and anchored transform composition.
//!
//! Shapes live in a `StableDiGraph` addressed by `ShapeKey`; an edge runs
//! from each group to every child it owns. A child's back-reference to its
//! group is the plain key inside `Membership`, used only for lookup.
//!
//! Transforms follow `point' = M · point`. A shape's world transform is the
//! product of its ancestors' local transforms with its own:
//! `W = G_outer · … · G_parent · T`.

use crate::diagnostic::{Diagnostic, DiagnosticKind, SceneError, TransformReport};
use crate::id::ShapeId;
use crate::model::{GroupData, Membership, ShapeGeometry, ShapeKey, ShapeKind, ShapeNode};
use crate::transform::{anchored, is_invertible};
use kurbo::{Affine, BezPath, Point, Rect, Shape};
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Every shape of one document.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    graph: StableDiGraph<ShapeNode, ()>,
    /// Index from `ShapeId` → `ShapeKey` for lookup by name.
    id_index: HashMap<ShapeId, ShapeKey>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    /// Add a shape. It always enters unattached; a group enters empty.
    pub fn insert(&mut self, mut node: ShapeNode) -> ShapeKey {
        node.membership = Membership::Unattached;
        if let Some(group) = node.kind.as_group_mut() {
            group.children.clear();
        }
        let id = node.id;
        let key = self.graph.add_node(node);
        if let Some(previous) = self.id_index.insert(id, key) {
            log::debug!("scene: id {id} moved from {previous:?} to {key:?}");
        }
        key
    }

    /// Add a shape with a generated id.
    pub fn add(&mut self, kind: ShapeKind) -> ShapeKey {
        self.insert(ShapeNode::anonymous(kind))
    }

    pub fn get(&self, key: ShapeKey) -> Option<&ShapeNode> {
        self.graph.node_weight(key)
    }

    /// Look up a shape by its id.
    pub fn get_by_id(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.id_index.get(&id).and_then(|key| self.graph.node_weight(*key))
    }

    pub fn key_of(&self, id: ShapeId) -> Option<ShapeKey> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, key: ShapeKey) -> bool {
        self.graph.contains_node(key)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = ShapeKey> + '_ {
        self.graph.node_indices()
    }

    /// Shapes not owned by any group, in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = ShapeKey> + '_ {
        self.graph
            .node_indices()
            .filter(|k| self.graph[*k].membership == Membership::Unattached)
    }

    /// Mutable local geometry of a leaf, for node editing.
    pub fn geometry_mut(&mut self, key: ShapeKey) -> Option<&mut dyn ShapeGeometry> {
        self.graph.node_weight_mut(key)?.kind.geometry_mut()
    }

    /// The group owning `key`, if any.
    pub fn parent(&self, key: ShapeKey) -> Option<ShapeKey> {
        self.get(key)?.membership.group()
    }

    /// Child keys a group lists, stale entries included.
    pub fn children(&self, group: ShapeKey) -> &[ShapeKey] {
        self.get(group)
            .and_then(|n| n.kind.as_group())
            .map(GroupData::children)
            .unwrap_or_default()
    }

    /// `child` is alive and its membership points back at `group`.
    pub fn is_member(&self, group: ShapeKey, child: ShapeKey) -> bool {
        self.get(child)
            .is_some_and(|n| n.membership.group() == Some(group))
    }

    /// Owning groups from the nearest outward.
    fn ancestors(&self, key: ShapeKey) -> Vec<ShapeKey> {
        let mut out = Vec::new();
        let mut current = key;
        while let Some(parent) = self.parent(current)
            && self.contains(parent)
            && out.len() < self.graph.node_count()
        {
            out.push(parent);
            current = parent;
        }
        out
    }

    // ─── Geometry in scene space ─────────────────────────────────────────

    /// Product of every ancestor's local transform with the shape's own.
    pub fn world_transform(&self, key: ShapeKey) -> Option<Affine> {
        let own = self.get(key)?.transform;
        Some(self.parent_world(key) * own)
    }

    /// World transform of the frame `key` lives in (identity at top level).
    fn parent_world(&self, key: ShapeKey) -> Affine {
        self.ancestors(key)
            .iter()
            .fold(Affine::IDENTITY, |m, g| self.graph[*g].transform * m)
    }

    /// Append the outline of `key` (and its members, for a group) mapped
    /// through `m`. With `snapshot`, a group's direct children are placed
    /// by their attach-time transforms instead of their live ones.
    fn append_outline(&self, key: ShapeKey, m: Affine, snapshot: bool, out: &mut BezPath) {
        let Some(node) = self.get(key) else { return };
        match &node.kind {
            ShapeKind::Group(group) => {
                for &child in group.children() {
                    let Some(child_node) = self.get(child) else { continue };
                    let Membership::Attached { group: owner, initial } = child_node.membership else {
                        continue;
                    };
                    if owner != key {
                        continue;
                    }
                    let t = if snapshot { initial } else { child_node.transform };
                    self.append_outline(child, m * t, false, out);
                }
            }
            kind => {
                if let Some(geom) = kind.geometry() {
                    out.extend((m * geom.outline()).elements().iter().copied());
                }
            }
        }
    }

    /// Tight axis-aligned bounds in scene space. `None` for an unknown key
    /// or an empty group.
    pub fn scene_bounds(&self, key: ShapeKey) -> Option<Rect> {
        let world = self.world_transform(key)?;
        let mut path = BezPath::new();
        self.append_outline(key, world, false, &mut path);
        (!path.elements().is_empty()).then(|| path.bounding_box())
    }

    /// Union of the scene bounds of several shapes.
    pub fn selection_bounds(&self, keys: &[ShapeKey]) -> Option<Rect> {
        keys.iter()
            .filter_map(|k| self.scene_bounds(*k))
            .reduce(|a, b| a.union(b))
    }

    /// The anchor `apply_transform` uses when none is given, in scene space.
    ///
    /// A custom anchor wins. Otherwise a leaf uses the center of its local
    /// bounds carried by its transform; a group uses the center of its
    /// members' bounds at their snapshot positions, so repeated calls during
    /// one gesture see the same point.
    pub fn default_anchor(&self, key: ShapeKey) -> Option<Point> {
        let node = self.get(key)?;
        let world = self.world_transform(key)?;
        if let Some(local) = node.anchor {
            return Some(world * local);
        }
        match &node.kind {
            ShapeKind::Group(_) => {
                let mut path = BezPath::new();
                self.append_outline(key, world, true, &mut path);
                if path.elements().is_empty() {
                    Some(world * Point::ZERO)
                } else {
                    Some(path.bounding_box().center())
                }
            }
            kind => kind.geometry().map(|g| world * g.local_bounds().center()),
        }
    }

    /// Pin the anchor of `key` to a scene-space point. The point is stored in
    /// the shape's local frame so it travels with the shape.
    pub fn set_anchor(&mut self, key: ShapeKey, scene_point: Point) -> bool {
        let Some(world) = self.world_transform(key) else {
            return false;
        };
        if !is_invertible(world) {
            return false;
        }
        self.graph[key].anchor = Some(world.inverse() * scene_point);
        true
    }

    pub fn clear_anchor(&mut self, key: ShapeKey) {
        if let Some(node) = self.graph.node_weight_mut(key) {
            node.anchor = None;
        }
    }

    // ─── Transforms ──────────────────────────────────────────────────────

    /// Apply `delta` around `anchor` (scene space; defaults to
    /// `default_anchor`).
    ///
    /// - Top-level leaf: `T' = Translate(anchor) · delta · Translate(-anchor) · T`.
    ///   Successive calls accumulate, so a drag may feed incremental deltas.
    /// - Top-level group: `delta` is the total since the last snapshot; each
    ///   member becomes `Ti' = G⁻¹ · anchored(delta) · G · Ti0` where `Ti0` is
    ///   its snapshot and `G` the group's world transform.
    /// - A shape owned by a group is transformed only through its group.
    ///
    /// Never fails; anything skipped is reported.
    pub fn apply_transform(&mut self, key: ShapeKey, delta: Affine, anchor: Option<Point>) -> TransformReport {
        let mut report = TransformReport::default();
        let Some(node) = self.get(key) else {
            report.push(Diagnostic::new(key, DiagnosticKind::UnknownShape, "no such shape"));
            return report;
        };
        if let Some(group) = node.membership.group() {
            report.push(Diagnostic::new(
                key,
                DiagnosticKind::MembershipLocked,
                format!("owned by group {group:?}; transform the group instead"),
            ));
            return report;
        }
        let is_group = node.is_group();
        let anchor = anchor
            .or_else(|| self.default_anchor(key))
            .unwrap_or(Point::ZERO);

        if is_group {
            self.compose_group(key, delta, anchor, &mut report);
        } else {
            let node = &mut self.graph[key];
            node.transform = anchored(delta, anchor) * node.transform;
        }
        report
    }

    /// Fan `delta` out over the members of `group` from their snapshots.
    fn compose_group(&mut self, group: ShapeKey, delta: Affine, anchor: Point, report: &mut TransformReport) {
        let world = self.world_transform(group).unwrap_or(Affine::IDENTITY);
        if !is_invertible(world) {
            report.push(Diagnostic::new(
                group,
                DiagnosticKind::SingularTransform,
                "group frame cannot be inverted",
            ));
            return;
        }
        let scene_delta = anchored(delta, anchor);
        let local_delta = world.inverse() * scene_delta * world;

        let children: SmallVec<[ShapeKey; 8]> = SmallVec::from_slice(self.children(group));
        log::debug!("compose_group {group:?}: {} members", children.len());

        for child in children {
            let Some(node) = self.graph.node_weight_mut(child) else {
                report.push(Diagnostic::new(
                    child,
                    DiagnosticKind::StaleGroupMember,
                    format!("member of {group:?} no longer exists"),
                ));
                continue;
            };
            match node.membership {
                Membership::Attached { group: owner, initial } if owner == group => {
                    node.transform = local_delta * initial;
                }
                _ => report.push(Diagnostic::new(
                    child,
                    DiagnosticKind::StaleGroupMember,
                    format!("listed by {group:?} but not owned by it"),
                )),
            }
        }

        if let Some(data) = self.graph[group].kind.as_group_mut() {
            data.decoration = scene_delta * data.decoration_initial;
        }
    }

    /// Make the members' current transforms the new snapshot base. Called
    /// when an interactive gesture ends.
    pub fn commit_group_transform(&mut self, group: ShapeKey) -> TransformReport {
        let mut report = TransformReport::default();
        let children: SmallVec<[ShapeKey; 8]> = SmallVec::from_slice(self.children(group));
        for child in children {
            match self.graph.node_weight_mut(child) {
                Some(node) if node.membership.group() == Some(group) => {
                    node.membership = Membership::Attached {
                        group,
                        initial: node.transform,
                    };
                }
                _ => report.push(Diagnostic::new(
                    child,
                    DiagnosticKind::StaleGroupMember,
                    format!("skipped while committing {group:?}"),
                )),
            }
        }
        match self.graph.node_weight_mut(group).map(|n| n.kind.as_group_mut()) {
            Some(Some(data)) => data.decoration_initial = data.decoration,
            Some(None) => {}
            None => report.push(Diagnostic::new(group, DiagnosticKind::UnknownShape, "no such group")),
        }
        report
    }

    /// Fold a leaf's local transform into its geometry and reset the
    /// transform to identity. Returns `false` when the shape kind cannot
    /// represent the transformed geometry (e.g. a rotated rectangle).
    pub fn bake_transform(&mut self, key: ShapeKey) -> bool {
        let Some(node) = self.graph.node_weight_mut(key) else {
            return false;
        };
        let t = node.transform;
        if t == Affine::IDENTITY {
            return true;
        }
        let attached = matches!(node.membership, Membership::Attached { .. });
        if attached && !is_invertible(t) {
            return false;
        }
        let Some(geometry) = node.kind.geometry_mut() else {
            return false;
        };
        if !geometry.bake_transform(t) {
            return false;
        }
        node.anchor = node.anchor.map(|a| t * a);
        if let Membership::Attached { group, initial } = node.membership {
            node.membership = Membership::Attached {
                group,
                initial: initial * t.inverse(),
            };
        }
        node.transform = Affine::IDENTITY;
        true
    }

    // ─── Membership ──────────────────────────────────────────────────────

    /// Move an unattached shape into `group`, keeping its scene position.
    ///
    /// The shape's transform is rebased into the group's frame
    /// (`T = G⁻¹ · W`) and that rebased transform becomes its snapshot.
    pub fn attach(&mut self, group: ShapeKey, child: ShapeKey) -> Result<(), SceneError> {
        let group_node = self.get(group).ok_or(SceneError::UnknownShape(group))?;
        if !group_node.is_group() {
            return Err(SceneError::NotAGroup(group));
        }
        let child_node = self.get(child).ok_or(SceneError::UnknownShape(child))?;
        if let Some(owner) = child_node.membership.group() {
            return Err(SceneError::AlreadyAttached { child, group: owner });
        }
        if group == child || self.ancestors(group).contains(&child) {
            return Err(SceneError::WouldCycle { child, group });
        }
        let group_world = self.world_transform(group).unwrap_or(Affine::IDENTITY);
        if !is_invertible(group_world) {
            return Err(SceneError::SingularTransform(group));
        }
        let child_world = self.world_transform(child).unwrap_or(Affine::IDENTITY);
        let local = group_world.inverse() * child_world;

        let node = &mut self.graph[child];
        node.transform = local;
        node.membership = Membership::Attached { group, initial: local };
        // A reused key may still sit in the list as a stale entry.
        if let Some(data) = self.graph[group].kind.as_group_mut()
            && !data.children.contains(&child)
        {
            data.children.push(child);
        }
        self.graph.update_edge(group, child, ());
        log::debug!("attach {child:?} → {group:?}");
        Ok(())
    }

    /// Take a shape out of its group, restoring an absolute (scene-space)
    /// transform. The shape can be transformed directly again.
    pub fn detach(&mut self, child: ShapeKey) -> Result<(), SceneError> {
        let node = self.get(child).ok_or(SceneError::UnknownShape(child))?;
        let group = node.membership.group().ok_or(SceneError::NotAttached(child))?;
        let world = self.world_transform(child).unwrap_or(node.transform);

        let node = &mut self.graph[child];
        node.transform = world;
        node.membership = Membership::Unattached;
        if let Some(data) = self.graph.node_weight_mut(group).and_then(|n| n.kind.as_group_mut()) {
            data.children.retain(|k| *k != child);
        }
        if let Some(edge) = self.graph.find_edge(group, child) {
            self.graph.remove_edge(edge);
        }
        log::debug!("detach {child:?} ← {group:?}");
        Ok(())
    }

    /// Create a group owning `keys` (in the given order). Every key must be
    /// an unattached shape; nothing changes if one is not.
    pub fn group(&mut self, keys: &[ShapeKey]) -> Result<ShapeKey, SceneError> {
        let mut members: SmallVec<[ShapeKey; 8]> = SmallVec::new();
        for &key in keys {
            let node = self.get(key).ok_or(SceneError::UnknownShape(key))?;
            if let Some(owner) = node.membership.group() {
                return Err(SceneError::AlreadyAttached { child: key, group: owner });
            }
            if !members.contains(&key) {
                members.push(key);
            }
        }
        let group = self.add(ShapeKind::Group(GroupData::default()));
        for key in members {
            self.attach(group, key)?;
        }
        Ok(group)
    }

    /// Dissolve a group. Its members keep their scene position and move to
    /// the group's own parent (or the top level). Returns the freed members.
    pub fn ungroup(&mut self, group: ShapeKey) -> Result<Vec<ShapeKey>, SceneError> {
        let node = self.get(group).ok_or(SceneError::UnknownShape(group))?;
        if !node.is_group() {
            return Err(SceneError::NotAGroup(group));
        }
        let outer = node.membership.group();
        if outer.is_some() {
            self.detach(group)?;
        }
        let members: Vec<ShapeKey> = self
            .children(group)
            .iter()
            .copied()
            .filter(|c| self.is_member(group, *c))
            .collect();
        for &child in &members {
            self.detach(child)?;
            if let Some(outer) = outer {
                self.attach(outer, child)?;
            }
        }
        self.remove_node(group);
        Ok(members)
    }

    /// Remove a shape from the arena. A destroyed group first releases its
    /// members to the top level. A destroyed member stays listed by its group
    /// until `prune_stale`; group operations skip it with a diagnostic.
    pub fn destroy(&mut self, key: ShapeKey) -> Option<ShapeNode> {
        let members: Vec<ShapeKey> = self
            .children(key)
            .iter()
            .copied()
            .filter(|c| self.is_member(key, *c))
            .collect();
        for child in members {
            if let Err(err) = self.detach(child) {
                log::warn!("destroy {key:?}: {err}");
            }
        }
        self.remove_node(key)
    }

    fn remove_node(&mut self, key: ShapeKey) -> Option<ShapeNode> {
        let removed = self.graph.remove_node(key)?;
        if self.id_index.get(&removed.id) == Some(&key) {
            self.id_index.remove(&removed.id);
        }
        log::debug!("removed {key:?} ({})", removed.id);
        Some(removed)
    }

    /// Drop stale entries from a group's child list. Returns how many.
    pub fn prune_stale(&mut self, group: ShapeKey) -> usize {
        let keep: SmallVec<[ShapeKey; 8]> = self
            .children(group)
            .iter()
            .copied()
            .filter(|c| self.is_member(group, *c))
            .collect();
        match self.graph.node_weight_mut(group).and_then(|n| n.kind.as_group_mut()) {
            Some(data) => {
                let removed = data.children.len() - keep.len();
                data.children = keep;
                removed
            }
            None => 0,
        }
    }
}
