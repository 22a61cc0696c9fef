//! Pointer gesture tracking
//!
//! Turns press/move/release sequences into clicks and box drags expressed in
//! pixels of the pick target.

use crate::picking::PixelRect;

/// Default distance in pixels before a press turns into a drag
pub const DEFAULT_DRAG_THRESHOLD: f64 = 5.0;

/// Completed pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Release close to the press
    Click {
        /// Column
        x: u32,
        /// Row
        y: u32,
    },
    /// Release past the drag threshold
    Drag {
        /// Box between press and release, inclusive
        rect: PixelRect,
        /// Release pixel
        end: (u32, u32),
    },
}

impl Gesture {
    /// Pixel the gesture ended on
    pub fn end(&self) -> (u32, u32) {
        match *self {
            Self::Click { x, y } => (x, y),
            Self::Drag { end, .. } => end,
        }
    }
}

/// Pointer position and pending press, in window pixels
#[derive(Debug, Clone)]
pub struct PointerTracker {
    position: (f64, f64),
    anchor: Option<(f64, f64)>,
    viewport: (u32, u32),
    drag_threshold: f64,
}

impl PointerTracker {
    /// Tracker for a `width` × `height` pick target
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: (0.0, 0.0),
            anchor: None,
            viewport: (width, height),
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }

    /// Builder pattern: set the drag threshold
    #[must_use]
    pub fn with_drag_threshold(mut self, threshold: f64) -> Self {
        self.drag_threshold = threshold;
        self
    }

    /// Pick target size; positions are clamped into it
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Pointer moved
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.position = (x, y);
    }

    /// Button pressed; anchors a possible drag
    pub fn press(&mut self, x: f64, y: f64) {
        self.position = (x, y);
        self.anchor = Some((x, y));
    }

    /// Button released
    ///
    /// A release without a tracked press counts as a click where it lands.
    pub fn release(&mut self, x: f64, y: f64) -> Gesture {
        self.position = (x, y);
        let dragging = self.is_dragging();
        let end = self.pixel();
        let anchor = self.anchor.take();

        match anchor {
            Some((ax, ay)) if dragging => Gesture::Drag {
                rect: PixelRect::from_corners(self.clamp(ax, ay), end),
                end,
            },
            _ => Gesture::Click { x: end.0, y: end.1 },
        }
    }

    /// Whether the held button has moved past the drag threshold
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some_and(|(ax, ay)| {
            let (x, y) = self.position;
            (x - ax).hypot(y - ay) >= self.drag_threshold
        })
    }

    /// Current position as a pixel of the pick target
    pub fn pixel(&self) -> (u32, u32) {
        self.clamp(self.position.0, self.position.1)
    }

    fn clamp(&self, x: f64, y: f64) -> (u32, u32) {
        let clamp = |v: f64, size: u32| v.floor().clamp(0.0, f64::from(size.saturating_sub(1))) as u32;
        (clamp(x, self.viewport.0), clamp(y, self.viewport.1))
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_release_is_a_click() {
        let mut pointer = PointerTracker::new(100, 100);
        pointer.press(10.0, 10.0);
        pointer.move_to(13.0, 13.0);
        assert!(!pointer.is_dragging());
        assert_eq!(pointer.release(13.0, 13.0), Gesture::Click { x: 13, y: 13 });
    }

    #[test]
    fn test_drag_rect_normalises_and_clamps() {
        let mut pointer = PointerTracker::new(100, 50);
        pointer.press(80.5, 10.2);
        pointer.move_to(120.0, -3.0);
        assert!(pointer.is_dragging());

        let gesture = pointer.release(120.0, -3.0);
        assert_eq!(
            gesture,
            Gesture::Drag {
                rect: PixelRect { min_x: 80, min_y: 0, max_x: 99, max_y: 10 },
                end: (99, 0),
            }
        );
        assert!(!pointer.is_dragging());
    }

    #[test]
    fn test_release_without_press_clicks_in_place() {
        let mut pointer = PointerTracker::new(640, 480).with_drag_threshold(1.0);
        assert_eq!(pointer.release(700.0, 12.7), Gesture::Click { x: 639, y: 12 });
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut pointer = PointerTracker::new(100, 100).with_drag_threshold(20.0);
        pointer.press(0.0, 0.0);
        assert!(matches!(pointer.release(10.0, 10.0), Gesture::Click { .. }));
    }
}
