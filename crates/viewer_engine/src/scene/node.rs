//! Scene node storage
//!
//! Nodes live in the [`SceneGraph`](crate::scene::SceneGraph) arena. The
//! parent link is a plain key into that arena; the child list is the owning
//! side of the relationship.

use crate::foundation::math::Mat4;
use crate::picking::PickColor;
use crate::render::{
    BufferOptions, DisplayOptions, Geometry, GeometryKind, RenderError, RenderableBuffer, Style,
    ToRenderable,
};
use crate::scene::Transform;

slotmap::new_key_type! {
    /// Stable handle to a node in a scene graph
    pub struct NodeId;
}

/// One node of the transform hierarchy
///
/// Transform state is read-only from outside the graph: every mutation goes
/// through [`SceneGraph`](crate::scene::SceneGraph) so world matrices can be
/// propagated to the subtree.
#[derive(Debug)]
pub struct SceneNode {
    id: NodeId,
    name: String,
    transform: Transform,
    local_matrix: Mat4,
    world_matrix: Mat4,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    /// Whether the node (and its subtree) is drawn
    pub visible: bool,
    selected: bool,

    /// Per-bucket draw toggles
    pub display: DisplayOptions,
    /// Default colours and sizes
    pub style: Style,

    geometry: Option<Geometry>,
    buffer: RenderableBuffer,
    pick_color: Option<PickColor>,
}

impl SceneNode {
    pub(crate) fn new(id: NodeId, name: String, display: DisplayOptions, style: Style) -> Self {
        Self {
            id,
            name,
            transform: Transform::identity(),
            local_matrix: Mat4::identity(),
            world_matrix: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            visible: true,
            selected: false,
            display,
            style,
            geometry: None,
            buffer: RenderableBuffer::new(),
            pick_color: None,
        }
    }

    /// Arena handle of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Cached `Translate · Rotate · Scale`
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// Cached composition of all ancestor local matrices with this one
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in draw order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node is part of the active selection
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Attached geometry, if any
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Kind of the attached geometry; `None` for pure transform groups
    pub fn kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(|geometry| geometry.kind())
    }

    /// Draw buffers generated from the attached geometry
    pub fn buffer(&self) -> &RenderableBuffer {
        &self.buffer
    }

    /// Identifier colour used by the picking pass
    pub fn pick_color(&self) -> Option<PickColor> {
        self.pick_color
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.local_matrix = transform.local_matrix();
        self.transform = transform;
    }

    pub(crate) fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub(crate) fn refresh_local_matrix(&mut self) {
        self.local_matrix = self.transform.local_matrix();
    }

    pub(crate) fn set_world_matrix(&mut self, world: Mat4) {
        self.world_matrix = world;
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_pick_color(&mut self, color: Option<PickColor>) {
        self.pick_color = color;
    }

    pub(crate) fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        self.geometry.as_mut()
    }

    /// Regenerate all buckets, sized to the current topology
    pub(crate) fn init_buffer(&mut self) {
        let options = BufferOptions::new(&self.style, self.display.suppress_coplanar_edges);
        match &self.geometry {
            Some(geometry) => self.buffer.init(geometry, &options),
            None => self.buffer = RenderableBuffer::new(),
        }
    }

    /// Refresh bucket contents in place; topology must not have changed
    pub(crate) fn update_buffer(&mut self) -> Result<(), RenderError> {
        let options = BufferOptions::new(&self.style, self.display.suppress_coplanar_edges);
        match &self.geometry {
            Some(geometry) => self.buffer.update(geometry, &options),
            None => Err(RenderError::NotInitialised),
        }
    }

    pub(crate) fn replace_geometry(&mut self, geometry: Option<Geometry>) -> Option<Geometry> {
        std::mem::replace(&mut self.geometry, geometry)
    }
}
