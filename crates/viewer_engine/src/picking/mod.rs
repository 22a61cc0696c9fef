//! Colour-identifier picking
//!
//! Pickable nodes get a unique 24-bit colour. The render thread draws an
//! identifier pass with every node flat in its colour, and the read-back
//! pixels are decoded into selections on a worker thread.
//!
//! ## Architecture
//!
//! ```text
//! UI events ──► PickingHandle ──arms──► render thread (PickRenderer)
//!                    ▲                        │ instance map
//!                    │ notify                 ▼
//!              blocking callers ◄── poller ◄─ Mailbox
//! ```

mod cancel;
mod color;
mod index;
mod instance_map;
mod mailbox;
mod plane;
mod service;
mod session;

pub use cancel::CancelToken;
pub use color::PickColor;
pub use index::{PickingIndex, CAPACITY};
pub use instance_map::{InstanceMap, PixelRect};
pub use mailbox::Mailbox;
pub use plane::{GroundPlane, PlanePicker};
pub use service::{PickFrame, PickRenderer, PickRequest, PickingHandle, PickingService, RedrawRequest};
pub use session::{BoxAction, SelectionMode, SelectionSession};

use crate::foundation::workers::WorkerPoolError;
use crate::render::RenderError;
use crate::scene::SceneError;
use thiserror::Error;

/// Picking errors
///
/// Misses are never errors: they resolve to "no object".
#[derive(Debug, Error)]
pub enum PickingError {
    /// Every assignable colour is in use
    #[error("picking registry exhausted: all {} colours are assigned", CAPACITY)]
    RegistryExhausted,

    /// Read-back bytes do not match the map dimensions
    #[error("instance map holds {actual} bytes, expected {expected}")]
    InstanceMapSize {
        /// `width × height × 3`
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// The blocking call was cancelled through its token
    #[error("interactive selection cancelled")]
    Cancelled,

    /// Another blocking selection is already waiting for the user
    #[error("an interactive selection is already in progress")]
    InteractionInProgress,

    /// The picking service has shut down
    #[error("picking service stopped")]
    ServiceStopped,

    /// The worker pool cannot host the poller and a script worker
    #[error("worker pool needs at least {required} threads, has {actual}")]
    PoolTooSmall {
        /// Minimum thread count
        required: usize,
        /// Actual thread count
        actual: usize,
    },

    /// Scene graph error
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Rendering error
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Worker pool error
    #[error("worker pool error: {0}")]
    Pool(#[from] WorkerPoolError),
}
