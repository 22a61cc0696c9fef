//! Scene renderer - walks the scene graph and feeds a [`RenderBackend`]
//!
//! Nodes are visited in stable pre-order (roots in insertion order, children
//! in list order). Hidden nodes hide their subtree. Selection highlight and
//! opacity are passed as uniforms so toggling selection never touches the
//! node buffers.

use crate::render::{BackendResult, Bucket, Color, DrawUniforms, PassKind, RenderBackend};
use crate::scene::{SceneGraph, SceneNode};

/// High-level scene renderer
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    highlight_color: Color,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(Color::rgb(1.0, 0.6, 0.0))
    }
}

impl SceneRenderer {
    /// Create a renderer tinting selected nodes with `highlight_color`
    pub fn new(highlight_color: Color) -> Self {
        Self { highlight_color }
    }

    /// Selection tint
    pub fn highlight_color(&self) -> Color {
        self.highlight_color
    }

    /// Record the shaded pass; returns the number of draws issued
    pub fn render<B: RenderBackend + ?Sized>(&self, scene: &SceneGraph, backend: &mut B) -> BackendResult<usize> {
        backend.begin_pass(PassKind::Shaded)?;
        let mut draws = 0;

        for id in scene.traverse_visible() {
            let node = scene.node(id)?;
            let uniforms = DrawUniforms {
                color_override: None,
                highlight: node.is_selected().then_some(self.highlight_color),
                opacity: node.style.opacity,
                point_size: node.style.point_size,
                line_width: node.style.line_width,
            };
            draws += draw_node(node, &uniforms, backend)?;
        }

        backend.end_pass()?;
        Ok(draws)
    }

    /// Record the identifier pass
    ///
    /// Only nodes holding a picking colour are drawn, each flat in that
    /// colour; everything else stays at the cleared (reserved black) value.
    pub fn render_identifiers<B: RenderBackend + ?Sized>(&self, scene: &SceneGraph, backend: &mut B) -> BackendResult<usize> {
        backend.begin_pass(PassKind::Identifier)?;
        let mut draws = 0;

        for id in scene.traverse_visible() {
            let node = scene.node(id)?;
            let Some(pick_color) = node.pick_color() else {
                continue;
            };
            let uniforms = DrawUniforms {
                color_override: Some(pick_color.to_color()),
                highlight: None,
                opacity: 1.0,
                point_size: node.style.point_size,
                line_width: node.style.line_width,
            };
            draws += draw_node(node, &uniforms, backend)?;
        }

        backend.end_pass()?;
        Ok(draws)
    }
}

fn draw_node<B: RenderBackend + ?Sized>(node: &SceneNode, uniforms: &DrawUniforms, backend: &mut B) -> BackendResult<usize> {
    let buffer = node.buffer();
    if !buffer.is_initialised() {
        return Ok(0);
    }

    let enabled = |bucket: Bucket| match bucket {
        Bucket::Points => node.display.show_points,
        Bucket::Lines => node.display.show_lines,
        Bucket::FrontFaces | Bucket::BackFaces => node.display.show_faces,
    };

    let mut draws = 0;
    let mut bound = false;
    for bucket in Bucket::ALL.into_iter().filter(|b| enabled(*b)) {
        let Some(data) = buffer.bucket(bucket) else {
            continue;
        };
        if !bound {
            backend.bind_world_matrix(node.world_matrix());
            bound = true;
        }
        backend.draw(data, uniforms)?;
        draws += 1;
    }
    Ok(draws)
}
