//! # Viewer Engine
//!
//! Scene graph, draw-buffer generation and colour-identifier picking for an
//! interactive 3D viewer.
//!
//! ## Features
//!
//! - **Scene graph**: hierarchical nodes with eagerly propagated world matrices
//! - **Draw buffers**: points, lines and two-sided faces built from point
//!   clouds, line sets and polygon meshes
//! - **Picking**: single, multi, deselect and box selection through a flat
//!   identifier pass, plus ground plane picks
//! - **Blocking selection**: script threads wait for the user to finish a
//!   selection while the UI and render threads keep running
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use viewer_engine::prelude::*;
//! use std::sync::{Arc, RwLock};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ViewerConfig::default();
//!     let mut scene = config.render.scene_graph();
//!     let cube = scene.insert_root("cube");
//!     scene.attach_geometry(cube, PolyMesh::cuboid([0.5, 0.5, 0.5]))?;
//!
//!     let scene = Arc::new(RwLock::new(scene));
//!     let pool = Arc::new(WorkerPool::new(config.engine.worker_threads)?);
//!     let picking = PickingService::new(&config, scene, pool)?;
//!     picking.register(cube)?;
//!
//!     // Render thread: publish armed picks every frame
//!     let mut raster = Rasterizer::new(640, 480);
//!     picking.render_frame(&mut raster);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod input;
pub mod picking;
pub mod render;
pub mod scene;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ViewerConfig},
        foundation::{
            math::{Mat4, Mat4Ext, Point3, Vec3},
            workers::WorkerPool,
        },
        input::{KeyEvent, Modifiers, NamedKey, PointerEvent},
        picking::{BoxAction, CancelToken, GroundPlane, PickingError, PickingHandle, PickingService, SelectionMode},
        render::{Color, Geometry, GeometryKind, LineSet, PointCloud, PolyMesh, Rasterizer, SceneRenderer, Style},
        scene::{NodeId, SceneError, SceneGraph, Transform},
    };
}
