//! Hierarchical transform scene graph
//!
//! Nodes are stored in a slot map arena. Roots are kept in insertion order
//! and children in attachment order, which together define the stable
//! traversal order used for drawing.
//!
//! World matrices are propagated eagerly: every call that changes a local
//! transform or the hierarchy recomputes the affected subtree before it
//! returns, so [`SceneGraph::world_matrix`] never observes stale data.

use crate::foundation::math::Mat4;
use crate::render::{DisplayOptions, Geometry, RenderError, Style};
use crate::scene::{NodeId, SceneError, SceneNode, Transform};
use slotmap::SlotMap;

/// Arena-backed transform hierarchy
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
    default_display: DisplayOptions,
    default_style: Style,
}

impl SceneGraph {
    /// Create an empty graph with default node style
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph whose new nodes start with the given style
    pub fn with_defaults(display: DisplayOptions, style: Style) -> Self {
        Self {
            default_display: display,
            default_style: style,
            ..Self::default()
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(id).ok_or(SceneError::InvalidReference(id))
    }

    /// Borrow a node mutably (style, display and visibility only)
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::InvalidReference(id))
    }

    /// Insert a new parentless node
    pub fn insert_root(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let (display, style) = (self.default_display, self.default_style);
        let id = self
            .nodes
            .insert_with_key(|id| SceneNode::new(id, name, display, style));
        self.roots.push(id);
        log::trace!("inserted root node {:?}", id);
        id
    }

    /// Create a new node directly under `parent`
    pub fn spawn_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        let child = self.insert_root(name);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Attach `child` under `parent`, detaching it from any previous parent
    ///
    /// The moved subtree's world matrices are recomputed before returning.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;

        if parent == child || self.ancestors(parent)?.contains(&child) {
            return Err(SceneError::HierarchyCycle { parent, child });
        }

        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.propagate(child);
        Ok(())
    }

    /// Detach `child` from `parent`; the subtree becomes a root
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(SceneError::InvalidReference(child));
        }

        self.detach(child);
        self.roots.push(child);
        self.propagate(child);
        Ok(())
    }

    /// Remove a node and its whole subtree from the arena
    ///
    /// Returns the removed ids in pre-order so callers can release anything
    /// keyed on them (picking colours, selection entries).
    pub fn destroy(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.node(id)?;
        if self.nodes[id].parent.is_some() {
            self.detach(id);
        } else {
            self.roots.retain(|root| *root != id);
        }

        let removed = self.collect_subtree(id);
        for node in &removed {
            self.nodes.remove(*node);
        }
        log::debug!("destroyed {} node(s) rooted at {:?}", removed.len(), id);
        Ok(removed)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    /// Children of a node in draw order
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(self.node(id)?.children())
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut chain = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.nodes.get(ancestor).and_then(|node| node.parent);
        }
        Ok(chain)
    }

    /// First node with the given name in traversal order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse().into_iter().find(|id| self.nodes[*id].name() == name)
    }

    /// Every node in stable depth-first pre-order
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            order.extend(self.collect_subtree(*root));
        }
        order
    }

    /// `id` followed by all its descendants in pre-order
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.node(id)?;
        Ok(self.collect_subtree(id))
    }

    /// Visible nodes in traversal order; hidden nodes hide their subtree
    pub fn traverse_visible(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.visible {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Cached world matrix
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        Ok(*self.node(id)?.world_matrix())
    }

    /// Cached local matrix
    pub fn local_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        Ok(*self.node(id)?.local_matrix())
    }

    /// Set translation from exactly three components
    pub fn set_translation(&mut self, id: NodeId, values: &[f32]) -> Result<(), SceneError> {
        self.node_mut(id)?.transform_mut().set_translation(values)?;
        self.transform_changed(id);
        Ok(())
    }

    /// Set Euler rotation (radians) from exactly three components
    pub fn set_rotation(&mut self, id: NodeId, values: &[f32]) -> Result<(), SceneError> {
        self.node_mut(id)?.transform_mut().set_rotation(values)?;
        self.transform_changed(id);
        Ok(())
    }

    /// Set scale from exactly three components
    pub fn set_scale(&mut self, id: NodeId, values: &[f32]) -> Result<(), SceneError> {
        self.node_mut(id)?.transform_mut().set_scale(values)?;
        self.transform_changed(id);
        Ok(())
    }

    /// Replace the whole local transform
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(id)?.set_transform(transform);
        self.propagate(id);
        Ok(())
    }

    /// Assign a local matrix; shear is dropped (see [`Transform::set_matrix`])
    pub fn set_matrix(&mut self, id: NodeId, matrix: &Mat4) -> Result<(), SceneError> {
        self.node_mut(id)?.transform_mut().set_matrix(matrix);
        self.transform_changed(id);
        Ok(())
    }

    /// Attach geometry and build its draw buffers
    pub fn attach_geometry(&mut self, id: NodeId, geometry: impl Into<Geometry>) -> Result<Option<Geometry>, SceneError> {
        let node = self.node_mut(id)?;
        let previous = node.replace_geometry(Some(geometry.into()));
        node.init_buffer();
        Ok(previous)
    }

    /// Remove the attached geometry, leaving a pure transform group
    pub fn detach_geometry(&mut self, id: NodeId) -> Result<Option<Geometry>, SceneError> {
        let node = self.node_mut(id)?;
        let previous = node.replace_geometry(None);
        node.init_buffer();
        Ok(previous)
    }

    /// Mutate attached geometry in place and refresh its buffers
    ///
    /// `edit` reports whether it changed topology (vertex or element counts).
    /// A topology change regenerates the buffers; otherwise they are updated
    /// in place, which fails with [`RenderError::TopologyMismatch`] if the
    /// edit changed counts without saying so.
    pub fn edit_geometry<F>(&mut self, id: NodeId, edit: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Geometry) -> bool,
    {
        let node = self.nodes.get_mut(id).ok_or(SceneError::InvalidReference(id))?;
        let topology_changed = match node.geometry_mut() {
            Some(geometry) => edit(geometry),
            None => return Err(RenderError::NotInitialised),
        };

        if topology_changed {
            node.init_buffer();
            Ok(())
        } else {
            node.update_buffer()
        }
    }

    /// Regenerate buffers after a style or display change
    pub fn rebuild_buffers(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.node_mut(id)?.init_buffer();
        Ok(())
    }

    /// Refresh buffer contents in place after an attribute-only change
    pub fn refresh_buffers(&mut self, id: NodeId) -> Result<(), RenderError> {
        self.node_mut(id)?.update_buffer()
    }

    pub(crate) fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.set_selected(selected);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_pick_color(&mut self, id: NodeId, color: Option<crate::picking::PickColor>) -> Result<(), SceneError> {
        self.node_mut(id)?.set_pick_color(color);
        Ok(())
    }

    fn transform_changed(&mut self, id: NodeId) {
        self.nodes[id].refresh_local_matrix();
        self.propagate(id);
    }

    /// Unlink `id` from its parent's child list or from the root list
    fn detach(&mut self, id: NodeId) {
        match self.nodes[id].parent.take() {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
    }

    /// `id` and all its descendants in pre-order
    fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.nodes[current].children.iter().rev());
        }
        order
    }

    /// Recompute world matrices for `id` and everything below it
    fn propagate(&mut self, id: NodeId) {
        let parent_world = self.nodes[id]
            .parent
            .map_or_else(Mat4::identity, |parent| *self.nodes[parent].world_matrix());

        let mut stack = vec![(id, parent_world)];
        while let Some((current, parent_world)) = stack.pop() {
            let node = &mut self.nodes[current];
            let world = parent_world * node.local_matrix();
            node.set_world_matrix(world);
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Point3, Vec3};
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    fn chain() -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root("root");
        let a = graph.spawn_child(root, "A").unwrap();
        let b = graph.spawn_child(a, "B").unwrap();
        (graph, root, a, b)
    }

    #[test]
    fn test_root_world_equals_local() {
        let mut graph = SceneGraph::new();
        let root = graph.insert_root("root");
        graph.set_translation(root, &[1.0, 2.0, 3.0]).unwrap();
        graph.set_rotation(root, &[0.2, 0.4, 0.6]).unwrap();
        graph.set_scale(root, &[2.0, 2.0, 0.5]).unwrap();

        assert_eq!(graph.world_matrix(root).unwrap(), graph.local_matrix(root).unwrap());
    }

    #[test]
    fn test_translation_chain_scenario() {
        let (mut graph, _root, a, b) = chain();
        graph.set_translation(a, &[1.0, 0.0, 0.0]).unwrap();
        graph.set_translation(b, &[0.0, 1.0, 0.0]).unwrap();

        assert_relative_eq!(graph.world_matrix(a).unwrap().translation_part(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(graph.world_matrix(b).unwrap().translation_part(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_world_composes_recursively() {
        let (mut graph, root, a, b) = chain();
        let c = graph.spawn_child(b, "C").unwrap();

        let transforms = [
            (root, Transform::new(Vec3::new(0.5, -1.0, 2.0), Vec3::new(0.1, 0.2, 0.3), Vec3::new(1.0, 2.0, 1.0))),
            (a, Transform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-0.4, 0.0, 1.2), Vec3::new(0.5, 0.5, 0.5))),
            (b, Transform::new(Vec3::new(0.0, 3.0, -1.0), Vec3::new(0.0, 0.9, 0.0), Vec3::new(1.0, 1.0, 3.0))),
            (c, Transform::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(0.7, -0.7, 0.1), Vec3::new(0.2, 1.0, 1.0))),
        ];
        for (id, transform) in transforms {
            graph.set_transform(id, transform).unwrap();
        }

        for (child, parent) in [(c, b), (b, a), (a, root)] {
            let expected = graph.world_matrix(parent).unwrap() * graph.local_matrix(child).unwrap();
            assert_relative_eq!(graph.world_matrix(child).unwrap(), expected, epsilon = 1e-5);
        }
        assert_eq!(graph.world_matrix(root).unwrap(), graph.local_matrix(root).unwrap());
    }

    #[test]
    fn test_ancestor_change_propagates_eagerly() {
        let (mut graph, root, _a, b) = chain();
        graph.set_translation(root, &[0.0, 0.0, 5.0]).unwrap();

        let p = graph.world_matrix(b).unwrap().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 5.0));

        graph.set_rotation(root, &[0.0, 0.0, std::f32::consts::FRAC_PI_2]).unwrap();
        graph.set_translation(b, &[1.0, 0.0, 0.0]).unwrap();
        let p = graph.world_matrix(b).unwrap().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_reparent_recomputes_subtree() {
        let (mut graph, root, a, b) = chain();
        graph.set_translation(a, &[1.0, 0.0, 0.0]).unwrap();
        let other = graph.insert_root("other");
        graph.set_translation(other, &[0.0, 0.0, -4.0]).unwrap();

        graph.add_child(other, b).unwrap();

        assert!(graph.children(a).unwrap().is_empty());
        assert_eq!(graph.parent(b).unwrap(), Some(other));
        assert_relative_eq!(graph.world_matrix(b).unwrap().translation_part(), Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(graph.roots(), &[root, other]);
    }

    #[test]
    fn test_remove_child_makes_subtree_root_relative() {
        let (mut graph, root, a, b) = chain();
        graph.set_translation(root, &[3.0, 0.0, 0.0]).unwrap();
        graph.set_translation(b, &[0.0, 1.0, 0.0]).unwrap();

        graph.remove_child(root, a).unwrap();

        assert_eq!(graph.parent(a).unwrap(), None);
        assert!(graph.roots().contains(&a));
        assert_eq!(graph.world_matrix(a).unwrap(), graph.local_matrix(a).unwrap());
        assert_relative_eq!(graph.world_matrix(b).unwrap().translation_part(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_remove_child_rejects_non_child() {
        let (mut graph, root, _a, b) = chain();
        assert!(matches!(
            graph.remove_child(root, b),
            Err(SceneError::InvalidReference(id)) if id == b
        ));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let (mut graph, root, a, b) = chain();
        assert!(matches!(graph.add_child(b, root), Err(SceneError::HierarchyCycle { .. })));
        assert!(matches!(graph.add_child(a, a), Err(SceneError::HierarchyCycle { .. })));
        // Hierarchy unchanged
        assert_eq!(graph.parent(a).unwrap(), Some(root));
    }

    #[test]
    fn test_stale_and_unknown_ids_fail() {
        let (mut graph, _root, a, b) = chain();
        let removed = graph.destroy(a).unwrap();
        assert_eq!(removed, vec![a, b]);

        assert!(matches!(graph.world_matrix(b), Err(SceneError::InvalidReference(_))));
        assert!(matches!(graph.set_translation(a, &[0.0; 3]), Err(SceneError::InvalidReference(_))));

        let bogus = NodeId::from(KeyData::from_ffi(u64::MAX));
        assert!(matches!(graph.node(bogus), Err(SceneError::InvalidReference(_))));
    }

    #[test]
    fn test_invalid_transform_input_is_typed() {
        let (mut graph, _root, a, _b) = chain();
        let err = graph.set_scale(a, &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidTransform { component: "scale", .. }));
    }

    #[test]
    fn test_traversal_order_is_stable() {
        let mut graph = SceneGraph::new();
        let r1 = graph.insert_root("r1");
        let x = graph.spawn_child(r1, "x").unwrap();
        let y = graph.spawn_child(r1, "y").unwrap();
        let x1 = graph.spawn_child(x, "x1").unwrap();
        let r2 = graph.insert_root("r2");

        assert_eq!(graph.traverse(), vec![r1, x, x1, y, r2]);

        graph.node_mut(x).unwrap().visible = false;
        assert_eq!(graph.traverse_visible(), vec![r1, y, r2]);
        assert_eq!(graph.find_by_name("x1"), Some(x1));
    }

    #[test]
    fn test_set_matrix_propagates() {
        let (mut graph, _root, a, b) = chain();
        let m = Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)) * Mat4::rotation_y(0.5);
        graph.set_matrix(a, &m).unwrap();

        assert_relative_eq!(graph.local_matrix(a).unwrap(), m, epsilon = 1e-5);
        assert_relative_eq!(graph.world_matrix(b).unwrap(), m, epsilon = 1e-5);
    }
}
