//! Viewer settings
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes.

use crate::config::{Config, ConfigError};
use crate::picking::GroundPlane;
use crate::render::{Color, DisplayOptions, SceneRenderer, Style};
use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `env_logger` filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Threads in the worker pool (poller plus script workers)
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 3,
        }
    }
}

/// Picking service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Poller wake-up interval
    pub poll_interval_ms: u64,
    /// Seed for identifier colour allocation
    pub seed: u64,
    /// Registry size past which a warning is logged
    pub registry_warn_threshold: usize,
    /// Pointer travel in pixels that turns a click into a drag
    pub drag_threshold_px: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            seed: 0x5eed,
            registry_warn_threshold: 100_000,
            drag_threshold_px: 5.0,
        }
    }
}

impl PickingConfig {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Buffer generation and draw settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default for new nodes: drop interior edges between coplanar faces
    pub suppress_coplanar_edges: bool,
    /// Tint applied to selected nodes
    pub highlight_color: Color,
    /// Style given to new nodes
    pub default_style: Style,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            suppress_coplanar_edges: false,
            highlight_color: Color::rgb(1.0, 0.6, 0.0),
            default_style: Style::default(),
        }
    }
}

impl RenderConfig {
    /// Scene renderer using these settings
    pub fn scene_renderer(&self) -> SceneRenderer {
        SceneRenderer::new(self.highlight_color)
    }

    /// Empty scene graph whose nodes start with these settings
    pub fn scene_graph(&self) -> SceneGraph {
        let display = DisplayOptions {
            suppress_coplanar_edges: self.suppress_coplanar_edges,
            ..DisplayOptions::default()
        };
        SceneGraph::with_defaults(display, self.default_style)
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Picking settings
    pub picking: PickingConfig,
    /// Render settings
    pub render: RenderConfig,
    /// Ground plane used by plane picking
    pub plane: GroundPlane,
}

impl ViewerConfig {
    /// Builder pattern: set worker thread count
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.engine.worker_threads = threads;
        self
    }

    /// Builder pattern: set the poller interval
    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.picking.poll_interval_ms = interval;
        self
    }

    /// Builder pattern: set the colour allocation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.picking.seed = seed;
        self
    }

    /// Builder pattern: set the ground plane
    pub fn with_plane(mut self, plane: GroundPlane) -> Self {
        self.plane = plane;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.worker_threads < 2 {
            return Err(ConfigError::Invalid(format!(
                "worker_threads must be at least 2 (poller plus one script worker), got {}",
                self.engine.worker_threads
            )));
        }
        if self.picking.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".to_string()));
        }
        if self.picking.drag_threshold_px < 0.0 {
            return Err(ConfigError::Invalid("drag_threshold_px must not be negative".to_string()));
        }
        let [min_x, min_z] = self.plane.min;
        let [max_x, max_z] = self.plane.max;
        if max_x <= min_x || max_z <= min_z {
            return Err(ConfigError::Invalid("plane max must exceed plane min".to_string()));
        }
        Ok(())
    }
}

impl Config for ViewerConfig {}
