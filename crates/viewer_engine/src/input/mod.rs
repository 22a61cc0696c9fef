//! Input events delivered by the windowing layer
//!
//! The viewer does not own a window; whatever does forwards pointer and key
//! events in device pixels through these types.

pub mod picking;

pub use picking::{Gesture, PointerTracker};

bitflags::bitflags! {
    /// Modifier keys held during a pointer event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift: deselect / box deselect
        const SHIFT = 1 << 0;
        /// Control: multi-select / box add
        const CTRL = 1 << 1;
        /// Alt
        const ALT = 1 << 2;
    }
}

/// Pointer event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Pointer moved
    Move,
    /// Primary button pressed
    Press,
    /// Primary button released
    Release,
}

/// Pointer event in device pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Event phase
    pub kind: PointerEventKind,
    /// Column
    pub x: f64,
    /// Row
    pub y: f64,
    /// Modifier keys held
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Pointer moved to (`x`, `y`)
    pub fn moved(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self { kind: PointerEventKind::Move, x, y, modifiers }
    }

    /// Button pressed at (`x`, `y`)
    pub fn pressed(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self { kind: PointerEventKind::Press, x, y, modifiers }
    }

    /// Button released at (`x`, `y`)
    pub fn released(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self { kind: PointerEventKind::Release, x, y, modifiers }
    }
}

/// Named keys the picking layer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    /// Finish an interactive selection
    Enter,
    /// Escape
    Escape,
    /// Shift
    Shift,
    /// Control
    Control,
    /// Any other key
    Other,
}

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key
    pub key: NamedKey,
    /// `true` on press, `false` on release
    pub pressed: bool,
}

impl KeyEvent {
    /// Key pressed
    pub fn pressed(key: NamedKey) -> Self {
        Self { key, pressed: true }
    }

    /// Key released
    pub fn released(key: NamedKey) -> Self {
        Self { key, pressed: false }
    }
}
