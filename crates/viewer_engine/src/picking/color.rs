//! 24-bit identifier colours

use crate::render::Color;
use std::fmt;

/// Identifier colour of a pickable object
///
/// Pure black is the background of the identifier pass and pure white is
/// kept free for overlays, so neither is ever assigned to an object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickColor(pub [u8; 3]);

impl PickColor {
    /// Background colour of the identifier pass
    pub const BLACK: Self = Self([0, 0, 0]);
    /// Reserved overlay colour
    pub const WHITE: Self = Self([255, 255, 255]);

    /// Build from the low 24 bits of `value` (`0xRRGGBB`)
    pub const fn from_u32(value: u32) -> Self {
        Self([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }

    /// Pack as `0xRRGGBB`
    pub const fn to_u32(self) -> u32 {
        let [r, g, b] = self.0;
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// Whether this is one of the two reserved colours
    pub fn is_reserved(self) -> bool {
        self == Self::BLACK || self == Self::WHITE
    }

    /// As a float colour for the identifier pass uniforms
    pub fn to_color(self) -> Color {
        let [r, g, b] = self.0;
        Color::rgb(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0)
    }
}

impl From<[u8; 3]> for PickColor {
    fn from(rgb: [u8; 3]) -> Self {
        Self(rgb)
    }
}

impl fmt::Debug for PickColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PickColor(#{:06x})", self.to_u32())
    }
}
