//! Scene graph
//!
//! Hierarchical transform tree for the viewer. Each node carries a local
//! [`Transform`], an eagerly maintained world matrix and optionally some
//! geometry with its generated draw buffers.
//!
//! ## Architecture
//!
//! ```text
//! SceneGraph (arena, owns every node)
//!      ↓
//! SceneNode (transform, style, geometry, draw buffers)
//!      ↓
//! SceneRenderer (stable pre-order traversal → RenderBackend)
//! ```

mod graph;
mod node;
mod transform;

pub use graph::SceneGraph;
pub use node::{NodeId, SceneNode};
pub use transform::Transform;

use thiserror::Error;

/// Scene graph errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// A transform component did not have exactly three values
    #[error("invalid {component}: expected {expected} components, got {actual}")]
    InvalidTransform {
        /// Component name (translation, rotation or scale)
        component: &'static str,
        /// Required number of values
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// The node id is unknown, stale, or not in the expected relationship
    #[error("invalid node reference: {0:?}")]
    InvalidReference(NodeId),

    /// Attaching the node would make it its own ancestor
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Requested parent
        parent: NodeId,
        /// Node being attached
        child: NodeId,
    },
}
