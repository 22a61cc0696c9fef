//! Linear RGBA colours and per-element colour overrides

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Linear RGBA colour, laid out for direct upload into vertex buffers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Create a colour from all four channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque colour
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same colour with a different alpha
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Quantise to 8-bit RGB, clamping out-of-range channels
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Linear blend towards `other` by `t`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Explicit colours for individual elements, keyed by index or edge
///
/// Elements without an entry fall back to the bucket default colour supplied
/// at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorOverrides<K: Eq + Hash> {
    overrides: HashMap<K, Color>,
}

impl<K: Eq + Hash> ColorOverrides<K> {
    /// Create an empty override table
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Set the colour for one element
    pub fn set(&mut self, key: K, color: Color) {
        self.overrides.insert(key, color);
    }

    /// Drop the override for one element
    pub fn clear(&mut self, key: &K) -> Option<Color> {
        self.overrides.remove(key)
    }

    /// Colour for `key`, or `default` when none was set
    pub fn resolve(&self, key: &K, default: Color) -> Color {
        self.overrides.get(key).copied().unwrap_or(default)
    }

    /// Number of explicit overrides
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether no overrides are set
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl<K: Eq + Hash> Default for ColorOverrides<K> {
    fn default() -> Self {
        Self::new()
    }
}
