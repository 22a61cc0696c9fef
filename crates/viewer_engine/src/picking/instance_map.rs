//! Read-back of the identifier pass
//!
//! An instance map is an H×W×3 byte grid, row-major with row 0 at the top.
//! Every pickable object is drawn flat in its identifier colour; pixels no
//! object covered stay black.

use crate::picking::{PickColor, PickingError};
use std::collections::HashSet;

/// Rectangle of pixels, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left column
    pub min_x: u32,
    /// Top row
    pub min_y: u32,
    /// Right column
    pub max_x: u32,
    /// Bottom row
    pub max_y: u32,
}

impl PixelRect {
    /// Rectangle spanned by two opposite corners in any order
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    /// Whether the pixel lies inside
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Identifier pass pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceMap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl InstanceMap {
    /// All-background map
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }

    /// Wrap read-back bytes, checking they match `width × height × 3`
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PickingError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(PickingError::InstanceMapSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour at column `x`, row `y`; `None` outside the map
    pub fn pixel(&self, x: u32, y: u32) -> Option<PickColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut rgb = [0; 3];
        rgb.copy_from_slice(&self.pixels[offset..offset + 3]);
        Some(PickColor(rgb))
    }

    /// Overwrite one pixel; out-of-range writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: PickColor) {
        if x < self.width && y < self.height {
            let offset = self.offset(x, y);
            self.pixels[offset..offset + 3].copy_from_slice(&color.0);
        }
    }

    /// Distinct non-reserved colours in first-occurrence order
    pub fn distinct_colors(&self) -> Vec<PickColor> {
        let mut seen = HashSet::new();
        self.pixels
            .chunks_exact(3)
            .map(|rgb| PickColor([rgb[0], rgb[1], rgb[2]]))
            .filter(|color| !color.is_reserved() && seen.insert(*color))
            .collect()
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_checks_size() {
        assert!(InstanceMap::from_raw(2, 2, vec![0; 12]).is_ok());
        let err = InstanceMap::from_raw(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, PickingError::InstanceMapSize { expected: 12, actual: 11 }));
    }

    #[test]
    fn test_pixel_addressing_is_row_then_column() {
        let mut map = InstanceMap::new(4, 3);
        let color = PickColor::from_u32(0x0a_0b0c);
        map.set_pixel(3, 1, color);

        assert_eq!(map.pixel(3, 1), Some(color));
        assert_eq!(map.pixel(1, 3), None);
        assert_eq!(&map.as_bytes()[(4 + 3) * 3..(4 + 3) * 3 + 3], &[0x0a, 0x0b, 0x0c]);
    }

    #[test]
    fn test_distinct_colors_skip_reserved() {
        let mut map = InstanceMap::new(3, 2);
        let a = PickColor::from_u32(0x11_0000);
        let c = PickColor::from_u32(0x00_0033);
        map.set_pixel(0, 0, a);
        map.set_pixel(1, 0, PickColor::WHITE);
        map.set_pixel(2, 0, c);
        map.set_pixel(0, 1, a);

        assert_eq!(map.distinct_colors(), vec![a, c]);
    }

    #[test]
    fn test_rect_from_corners() {
        let rect = PixelRect::from_corners((10, 2), (4, 8));
        assert_eq!(rect, PixelRect { min_x: 4, min_y: 2, max_x: 10, max_y: 8 });
        assert!(rect.contains(4, 8));
        assert!(!rect.contains(11, 5));
    }
}
