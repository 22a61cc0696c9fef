//! Backend abstraction for drawing scene buckets
//!
//! The scene renderer walks the graph and issues, per visible node, a world
//! matrix bind followed by one draw per enabled bucket. A backend only needs
//! to rasterise those buckets; it never sees the scene graph itself.

use crate::foundation::math::Mat4;
use crate::render::{BucketData, Color, RenderError};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Kind of pass being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Normal shaded pass with styles and highlights
    Shaded,
    /// Flat identifier colours for picking
    Identifier,
}

/// Draw-time uniforms for one bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    /// Replace every element colour (identifier pass)
    pub color_override: Option<Color>,
    /// Selection highlight tint
    pub highlight: Option<Color>,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
    /// Point size in pixels
    pub point_size: f32,
    /// Line width in pixels
    pub line_width: f32,
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            color_override: None,
            highlight: None,
            opacity: 1.0,
            point_size: 1.0,
            line_width: 1.0,
        }
    }
}

impl DrawUniforms {
    /// Colour an element is drawn with once uniforms are applied
    pub fn resolve(&self, element_color: Color) -> Color {
        if let Some(flat) = self.color_override {
            return flat;
        }
        let base = self.highlight.map_or(element_color, |tint| element_color.lerp(tint, 0.6));
        base.with_alpha(base.a * self.opacity)
    }
}

/// Rendering backend trait
pub trait RenderBackend {
    /// Start a pass, clearing colour and depth
    fn begin_pass(&mut self, pass: PassKind) -> BackendResult<()>;

    /// Set the model matrix for following draws
    fn bind_world_matrix(&mut self, world: &Mat4);

    /// Draw one bucket with the bound world matrix
    fn draw(&mut self, bucket: &BucketData, uniforms: &DrawUniforms) -> BackendResult<()>;

    /// Finish the current pass
    fn end_pass(&mut self) -> BackendResult<()>;
}
