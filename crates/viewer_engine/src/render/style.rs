//! Per-node display toggles and draw style

use crate::render::color::Color;
use serde::{Deserialize, Serialize};

/// Which buckets of a node are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Draw the point bucket
    pub show_points: bool,
    /// Draw the line bucket
    pub show_lines: bool,
    /// Draw the front and back face buckets
    pub show_faces: bool,
    /// Hide interior edges between coplanar faces when building lines
    pub suppress_coplanar_edges: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_points: false,
            show_lines: true,
            show_faces: true,
            suppress_coplanar_edges: false,
        }
    }
}

/// Default colours and sizes for the draw buckets of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Default point colour
    pub point_color: Color,
    /// Default line colour
    pub line_color: Color,
    /// Default face colour (front and back)
    pub face_color: Color,
    /// Point size in pixels
    pub point_size: f32,
    /// Line width in pixels
    pub line_width: f32,
    /// Opacity applied at draw time
    pub opacity: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            point_color: Color::rgb(0.1, 0.1, 0.1),
            line_color: Color::rgb(0.05, 0.05, 0.05),
            face_color: Color::rgb(0.7, 0.7, 0.75),
            point_size: 4.0,
            line_width: 1.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    /// Builder pattern: set the face colour
    pub fn with_face_color(mut self, color: Color) -> Self {
        self.face_color = color;
        self
    }

    /// Builder pattern: set the line colour
    pub fn with_line_color(mut self, color: Color) -> Self {
        self.line_color = color;
        self
    }

    /// Builder pattern: set the point colour
    pub fn with_point_color(mut self, color: Color) -> Self {
        self.point_color = color;
        self
    }

    /// Builder pattern: set the opacity (clamped to `[0, 1]`)
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}
