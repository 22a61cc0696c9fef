//! Selection state machine
//!
//! Applies resolved picks to the active selection according to the current
//! mode, and holds the wait flags of the interactive blocking calls.

use crate::foundation::math::Point3;
use crate::input::PointerTracker;
use crate::picking::{InstanceMap, PickingIndex};
use crate::render::GeometryKind;
use crate::scene::{NodeId, SceneGraph};

/// What a box drag does to the objects it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxAction {
    /// Add covered objects (Ctrl-drag)
    Add,
    /// Remove covered objects (Shift-drag)
    Remove,
}

/// Selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Replace the selection with the hit; a miss clears it
    Single,
    /// Add the hit to the selection
    Multi,
    /// Remove the hit from the selection
    Deselect,
    /// Transient mode for the duration of a box drag
    Box(BoxAction),
}

impl From<BoxAction> for SelectionMode {
    fn from(action: BoxAction) -> Self {
        Self::Box(action)
    }
}

/// Active selection and interaction state
#[derive(Debug)]
pub struct SelectionSession {
    mode: SelectionMode,
    overwrite: Option<SelectionMode>,
    allowed: Vec<GeometryKind>,
    selected: Vec<NodeId>,
    pub(crate) pointer: PointerTracker,
    pub(crate) wait_selection: bool,
    pub(crate) wait_plane: Option<bool>,
    pub(crate) plane_point: Option<Point3>,
}

impl SelectionSession {
    /// Empty selection in single mode
    pub fn new(pointer: PointerTracker) -> Self {
        Self {
            mode: SelectionMode::Single,
            overwrite: None,
            allowed: Vec::new(),
            selected: Vec::new(),
            pointer,
            wait_selection: false,
            wait_plane: None,
            plane_point: None,
        }
    }

    /// Current mode
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Set the persistent mode
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.overwrite = None;
    }

    /// Geometry kinds that may be added; empty allows everything
    pub fn allowed(&self) -> &[GeometryKind] {
        &self.allowed
    }

    /// Restrict which kinds adding modes accept
    pub fn set_allowed(&mut self, allowed: Vec<GeometryKind>) {
        self.allowed = allowed;
    }

    /// Selected nodes in selection order
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Whether a blocking call is waiting for the user
    pub fn is_waiting(&self) -> bool {
        self.wait_selection || self.wait_plane.is_some()
    }

    /// Switch to a transient mode, remembering the persistent one
    pub fn begin_transient(&mut self, mode: SelectionMode) {
        if self.overwrite.is_none() {
            self.overwrite = Some(self.mode);
        }
        self.mode = mode;
    }

    /// Return to the persistent mode saved by [`Self::begin_transient`]
    pub fn end_transient(&mut self) {
        if let Some(previous) = self.overwrite.take() {
            self.mode = previous;
        }
    }

    /// Apply a pick result using the current mode
    pub fn apply(&mut self, scene: &mut SceneGraph, hit: Option<NodeId>) {
        self.apply_with(scene, hit, self.mode);
    }

    /// Apply a pick result using `mode`
    ///
    /// Hits on destroyed nodes count as misses, as do hits the allowed-kind
    /// filter rejects in an adding mode.
    pub fn apply_with(&mut self, scene: &mut SceneGraph, hit: Option<NodeId>, mode: SelectionMode) {
        let hit = hit.filter(|id| scene.contains(*id));
        match mode {
            SelectionMode::Single => {
                self.clear(scene);
                if let Some(id) = hit.filter(|id| self.accepts(scene, *id)) {
                    self.add(scene, id);
                }
            }
            SelectionMode::Multi | SelectionMode::Box(BoxAction::Add) => {
                if let Some(id) = hit.filter(|id| self.accepts(scene, *id)) {
                    self.add(scene, id);
                }
            }
            SelectionMode::Deselect | SelectionMode::Box(BoxAction::Remove) => {
                if let Some(id) = hit {
                    self.remove(scene, id);
                }
            }
        }
    }

    /// Pick the object under pixel (`x`, `y`) and apply it
    ///
    /// Out-of-bounds pixels are a miss. Returns the resolved object.
    pub fn select_one(
        &mut self,
        index: &PickingIndex<NodeId>,
        scene: &mut SceneGraph,
        x: u32,
        y: u32,
        map: &InstanceMap,
    ) -> Option<NodeId> {
        let hit = map.pixel(x, y).and_then(|color| index.resolve(color));
        log::debug!("pick at ({x}, {y}) resolved to {hit:?} in {:?} mode", self.mode);
        self.apply(scene, hit);
        hit
    }

    /// Apply every distinct object in the map under a transient box mode
    ///
    /// The map is expected to hold only the dragged rectangle. Returns the
    /// resolved objects in first-occurrence order.
    pub fn select_region(
        &mut self,
        index: &PickingIndex<NodeId>,
        scene: &mut SceneGraph,
        map: &InstanceMap,
        action: BoxAction,
    ) -> Vec<NodeId> {
        let hits: Vec<NodeId> = map
            .distinct_colors()
            .into_iter()
            .filter_map(|color| index.resolve(color))
            .collect();
        log::debug!("box {action:?} covered {} object(s)", hits.len());

        self.begin_transient(SelectionMode::Box(action));
        for hit in &hits {
            self.apply(scene, Some(*hit));
        }
        self.end_transient();
        hits
    }

    /// Deselect everything
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        for id in self.selected.drain(..) {
            scene.set_selected(id, false);
        }
    }

    /// Forget nodes that no longer exist
    pub(crate) fn forget(&mut self, removed: &[NodeId]) {
        self.selected.retain(|id| !removed.contains(id));
    }

    fn accepts(&self, scene: &SceneGraph, id: NodeId) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        scene
            .node(id)
            .ok()
            .and_then(|node| node.kind())
            .is_some_and(|kind| self.allowed.contains(&kind))
    }

    fn add(&mut self, scene: &mut SceneGraph, id: NodeId) {
        if !self.selected.contains(&id) {
            self.selected.push(id);
            scene.set_selected(id, true);
        }
    }

    fn remove(&mut self, scene: &mut SceneGraph, id: NodeId) {
        self.selected.retain(|selected| *selected != id);
        scene.set_selected(id, false);
    }
}

impl Default for SelectionSession {
    fn default() -> Self {
        Self::new(PointerTracker::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::picking::PickColor;
    use crate::render::{PointCloud, PolyMesh};

    struct Fixture {
        scene: SceneGraph,
        index: PickingIndex<NodeId>,
        session: SelectionSession,
        nodes: Vec<NodeId>,
    }

    fn fixture(count: usize) -> Fixture {
        let mut scene = SceneGraph::new();
        let mut index = PickingIndex::new(11, usize::MAX);
        let nodes: Vec<NodeId> = (0..count)
            .map(|i| {
                let id = scene.insert_root(format!("n{i}"));
                index.register(id).unwrap();
                id
            })
            .collect();
        Fixture {
            scene,
            index,
            session: SelectionSession::default(),
            nodes,
        }
    }

    impl Fixture {
        fn map_with(&self, pixels: &[(u32, u32, NodeId)]) -> InstanceMap {
            let mut map = InstanceMap::new(8, 8);
            for (x, y, id) in pixels {
                map.set_pixel(*x, *y, self.index.color_of(*id).unwrap());
            }
            map
        }

        fn is_selected(&self, id: NodeId) -> bool {
            self.scene.node(id).unwrap().is_selected()
        }
    }

    #[test]
    fn test_single_mode_replaces_and_miss_clears() {
        let mut f = fixture(2);
        let (a, b) = (f.nodes[0], f.nodes[1]);

        f.session.apply(&mut f.scene, Some(a));
        f.session.apply(&mut f.scene, Some(b));
        assert_eq!(f.session.selected(), &[b]);
        assert!(!f.is_selected(a));
        assert!(f.is_selected(b));

        f.session.apply(&mut f.scene, None);
        assert!(f.session.selected().is_empty());
        assert!(!f.is_selected(b));
    }

    #[test]
    fn test_multi_adds_and_miss_is_noop() {
        let mut f = fixture(2);
        let (a, b) = (f.nodes[0], f.nodes[1]);
        f.session.set_mode(SelectionMode::Multi);

        f.session.apply(&mut f.scene, Some(a));
        f.session.apply(&mut f.scene, Some(b));
        f.session.apply(&mut f.scene, Some(a));
        f.session.apply(&mut f.scene, None);

        assert_eq!(f.session.selected(), &[a, b]);
    }

    #[test]
    fn test_deselect_removes_and_miss_is_noop() {
        let mut f = fixture(2);
        let (a, b) = (f.nodes[0], f.nodes[1]);
        f.session.set_mode(SelectionMode::Multi);
        f.session.apply(&mut f.scene, Some(a));
        f.session.apply(&mut f.scene, Some(b));

        f.session.set_mode(SelectionMode::Deselect);
        f.session.apply(&mut f.scene, Some(a));
        f.session.apply(&mut f.scene, None);

        assert_eq!(f.session.selected(), &[b]);
        assert!(!f.is_selected(a));
    }

    #[test]
    fn test_select_one_reads_row_y_column_x() {
        let mut f = fixture(2);
        let (a, b) = (f.nodes[0], f.nodes[1]);
        let map = f.map_with(&[(5, 2, a), (2, 5, b)]);

        let hit = f.session.select_one(&f.index, &mut f.scene, 5, 2, &map);
        assert_eq!(hit, Some(a));

        // Background and out-of-bounds pixels are misses
        assert_eq!(f.session.select_one(&f.index, &mut f.scene, 0, 0, &map), None);
        assert_eq!(f.session.select_one(&f.index, &mut f.scene, 50, 2, &map), None);
        assert!(f.session.selected().is_empty());
    }

    #[test]
    fn test_unregistered_colour_is_a_miss() {
        let mut f = fixture(1);
        let a = f.nodes[0];
        f.session.apply(&mut f.scene, Some(a));

        let mut map = InstanceMap::new(2, 2);
        let stray = (1..)
            .map(PickColor::from_u32)
            .find(|c| f.index.resolve(*c).is_none())
            .unwrap();
        map.set_pixel(0, 0, stray);

        f.session.set_mode(SelectionMode::Multi);
        assert_eq!(f.session.select_one(&f.index, &mut f.scene, 0, 0, &map), None);
        assert_eq!(f.session.selected(), &[a]);
    }

    #[test]
    fn test_region_selects_distinct_objects() {
        let mut f = fixture(3);
        let (a, b, c) = (f.nodes[0], f.nodes[1], f.nodes[2]);
        let map = f.map_with(&[(0, 0, a), (1, 0, a), (3, 3, c), (4, 4, c)]);

        let hits = f.session.select_region(&f.index, &mut f.scene, &map, BoxAction::Add);

        assert_eq!(hits, vec![a, c]);
        assert_eq!(f.session.selected(), &[a, c]);
        assert!(!f.is_selected(b));
        // Box is transient
        assert_eq!(f.session.mode(), SelectionMode::Single);
    }

    #[test]
    fn test_box_remove_reverts_to_persistent_mode() {
        let mut f = fixture(3);
        let (a, b, c) = (f.nodes[0], f.nodes[1], f.nodes[2]);
        f.session.set_mode(SelectionMode::Multi);
        for id in [a, b, c] {
            f.session.apply(&mut f.scene, Some(id));
        }

        let map = f.map_with(&[(0, 0, b)]);
        f.session.select_region(&f.index, &mut f.scene, &map, BoxAction::Remove);

        assert_eq!(f.session.selected(), &[a, c]);
        assert_eq!(f.session.mode(), SelectionMode::Multi);
    }

    #[test]
    fn test_allowed_kinds_filter_adding_modes() {
        let mut f = fixture(0);
        let mesh = f.scene.insert_root("mesh");
        let cloud = f.scene.insert_root("cloud");
        f.scene.attach_geometry(mesh, PolyMesh::cuboid([1.0; 3])).unwrap();
        f.scene.attach_geometry(cloud, PointCloud::new(vec![Point3::origin()])).unwrap();

        f.session.set_allowed(vec![GeometryKind::Mesh]);
        f.session.set_mode(SelectionMode::Multi);
        f.session.apply(&mut f.scene, Some(cloud));
        f.session.apply(&mut f.scene, Some(mesh));
        assert_eq!(f.session.selected(), &[mesh]);

        // A filtered hit in single mode behaves like a miss
        f.session.set_mode(SelectionMode::Single);
        f.session.apply(&mut f.scene, Some(cloud));
        assert!(f.session.selected().is_empty());
    }

    #[test]
    fn test_destroyed_node_hit_is_a_miss() {
        let mut f = fixture(1);
        let a = f.nodes[0];
        f.scene.destroy(a).unwrap();

        f.session.set_mode(SelectionMode::Multi);
        f.session.apply(&mut f.scene, Some(a));
        assert!(f.session.selected().is_empty());
    }
}
