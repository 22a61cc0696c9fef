//! # Rendering
//!
//! Turns node geometry into draw-ready buffers and records draw passes
//! against a [`RenderBackend`].
//!
//! ## Architecture
//!
//! - **Geometry**: point clouds, line sets and polygon meshes behind the
//!   [`ToRenderable`] seam
//! - **Buffers**: one [`RenderableBuffer`] per node, split into point, line,
//!   front-face and back-face buckets
//! - **Renderer**: [`SceneRenderer`] walks the scene graph and issues the
//!   shaded pass or the flat identifier pass used for picking
//! - **Rasterizer**: CPU backend producing RGB8 read-back images
//!
//! Buffers are rebuilt only when topology changes; colour and position edits
//! are written in place through [`RenderableBuffer::update`].

mod backend;
mod buffer;
mod color;
mod geometry;
mod rasterizer;
mod renderer;
mod style;
pub mod triangulate;

pub use backend::{BackendResult, DrawUniforms, PassKind, RenderBackend};
pub use buffer::{Bucket, BucketData, BufferOptions, RenderableBuffer};
pub use color::{Color, ColorOverrides};
pub use geometry::{Geometry, GeometryKind, LineSet, PointCloud, PolyMesh, ToRenderable};
pub use rasterizer::{ndc_to_pixel, Rasterizer};
pub use renderer::SceneRenderer;
pub use style::{DisplayOptions, Style};
pub use triangulate::EdgeKey;

use crate::scene::SceneError;
use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// In-place update attempted before the buffer was built
    #[error("renderable buffer has not been initialised")]
    NotInitialised,

    /// In-place update would change a bucket's element count
    #[error("topology of the {bucket:?} bucket changed; rebuild the buffer")]
    TopologyMismatch {
        /// Bucket whose size changed
        bucket: Bucket,
    },

    /// Geometry fails validation
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Scene graph error
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}
