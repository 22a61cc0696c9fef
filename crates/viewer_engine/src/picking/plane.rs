//! Ground plane picking through barycentric colour tagging
//!
//! The plane pass draws one triangle whose corners are pure red, green and
//! blue. The triangle is twice the size of the bounded square along both
//! axes, so it covers the square completely:
//!
//! ```text
//!  z
//!  ^  B
//!  |  |\
//!  |  | \
//!  |  +--+  <- bounded square (min..max)
//!  |  |  |\
//!  |  R--+-G
//!  +-----------> x
//! ```
//!
//! A read-back pixel's normalised RGB are the barycentric weights of the
//! corners, which reconstructs the 2D position on the plane.

use crate::foundation::math::Point3;
use crate::picking::InstanceMap;
use serde::{Deserialize, Serialize};

/// Capability to turn a pixel into a point on a plane
pub trait PlanePicker {
    /// World point under pixel (`x`, `y`) of a pre-rendered plane pass
    ///
    /// Returns `None` for background pixels and for points outside the
    /// plane's bounds.
    fn pick_plane(&self, x: u32, y: u32, map: &InstanceMap, snap: bool) -> Option<Point3>;
}

/// Bounded horizontal plane at a fixed height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    /// Minimum (x, z) corner
    pub min: [f32; 2],
    /// Maximum (x, z) corner
    pub max: [f32; 2],
    /// Y coordinate of the plane
    pub height: f32,
    /// Grid cell size used for snapping; snapping is off when not positive
    pub grid_pitch: f32,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            min: [-50.0, -50.0],
            max: [50.0, 50.0],
            height: 0.0,
            grid_pitch: 1.0,
        }
    }
}

impl GroundPlane {
    /// Plane spanning `min..max` in x and z at `height`
    pub fn new(min: [f32; 2], max: [f32; 2], height: f32) -> Self {
        Self {
            min,
            max,
            height,
            ..Self::default()
        }
    }

    /// Builder pattern: set the snapping pitch
    pub fn with_grid_pitch(mut self, grid_pitch: f32) -> Self {
        self.grid_pitch = grid_pitch;
        self
    }

    /// Corners of the tagging triangle: red, green, blue
    pub fn tag_triangle(&self) -> [Point3; 3] {
        let [x0, z0] = self.min;
        let (w, d) = self.extent();
        [
            Point3::new(x0, self.height, z0),
            Point3::new(x0 + 2.0 * w, self.height, z0),
            Point3::new(x0, self.height, z0 + 2.0 * d),
        ]
    }

    /// Reconstruct the plane point from a tagged pixel colour
    pub fn decode(&self, rgb: [u8; 3]) -> Option<Point3> {
        let [r, g, b] = rgb.map(f32::from);
        let sum = r + g + b;
        if sum <= 0.0 {
            return None;
        }

        let [x0, z0] = self.min;
        let (w, d) = self.extent();
        let x = x0 + 2.0 * w * (g / sum);
        let z = z0 + 2.0 * d * (b / sum);
        self.contains(x, z).then(|| Point3::new(x, self.height, z))
    }

    /// Round x and z to the nearest grid line
    pub fn snap(&self, point: Point3) -> Point3 {
        if self.grid_pitch <= 0.0 {
            return point;
        }
        let round = |v: f32| (v / self.grid_pitch).round() * self.grid_pitch;
        Point3::new(round(point.x), point.y, round(point.z))
    }

    /// Whether (x, z) lies within the bounds
    pub fn contains(&self, x: f32, z: f32) -> bool {
        (self.min[0]..=self.max[0]).contains(&x) && (self.min[1]..=self.max[1]).contains(&z)
    }

    fn extent(&self) -> (f32, f32) {
        (self.max[0] - self.min[0], self.max[1] - self.min[1])
    }
}

impl PlanePicker for GroundPlane {
    fn pick_plane(&self, x: u32, y: u32, map: &InstanceMap, snap: bool) -> Option<Point3> {
        let point = self.decode(map.pixel(x, y)?.0)?;
        Some(if snap { self.snap(point) } else { point })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::PickColor;
    use approx::assert_relative_eq;

    fn plane() -> GroundPlane {
        GroundPlane::new([0.0, 0.0], [10.0, 10.0], 0.0)
    }

    #[test]
    fn test_corner_colours_decode_to_corners() {
        let plane = plane();
        assert_relative_eq!(plane.decode([255, 0, 0]).unwrap(), Point3::new(0.0, 0.0, 0.0));
        // Green and blue corners lie outside the square
        assert_eq!(plane.decode([0, 255, 0]), None);
        assert_eq!(plane.decode([0, 0, 255]), None);
        assert_eq!(plane.decode([0, 0, 0]), None);
    }

    #[test]
    fn test_interior_point_decodes() {
        // (3, 6) has weights g = 0.15, b = 0.3, r = 0.55
        let plane = plane();
        let point = plane.decode([140, 38, 77]).unwrap();
        assert_relative_eq!(point.x, 3.0, epsilon = 0.05);
        assert_relative_eq!(point.z, 6.0, epsilon = 0.05);
        assert_relative_eq!(plane.snap(point), Point3::new(3.0, 0.0, 6.0));
    }

    #[test]
    fn test_snap_respects_pitch() {
        let plane = plane().with_grid_pitch(2.5);
        assert_relative_eq!(plane.snap(Point3::new(3.4, 1.0, 6.1)), Point3::new(2.5, 1.0, 5.0));

        let free = plane.with_grid_pitch(0.0);
        assert_relative_eq!(free.snap(Point3::new(3.4, 1.0, 6.1)), Point3::new(3.4, 1.0, 6.1));
    }

    #[test]
    fn test_pick_plane_reads_map() {
        let plane = plane();
        let mut map = InstanceMap::new(4, 4);
        map.set_pixel(1, 2, PickColor([140, 38, 77]));

        assert_relative_eq!(plane.pick_plane(1, 2, &map, true).unwrap(), Point3::new(3.0, 0.0, 6.0));
        assert_eq!(plane.pick_plane(0, 0, &map, true), None);
        assert_eq!(plane.pick_plane(9, 9, &map, false), None);
    }
}
