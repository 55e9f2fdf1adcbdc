//! Input event types fed to the board by the host shell.

use kurbo::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform command modifier (Ctrl, or Cmd on macOS).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer event in canvas-local screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerInput {
    pub position: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }
}

/// A key press with its modifier state.
///
/// Key names follow the DOM convention: "Tab", "Enter", "Backspace",
/// "Delete", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", " ".
#[derive(Debug, Clone)]
pub struct KeyInput {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: key.to_string(),
            modifiers,
        }
    }
}
