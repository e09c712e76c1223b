use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedPoint;

/// Mouse button for press/release primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        f.write_str(name)
    }
}

/// Virtual key understood by the injection facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualKey {
    Back,
    Tab,
    Return,
    Shift,
    Control,
    Alt,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Insert,
    Delete,
    /// Function key `F1`..=`F12`
    F(u8),
    /// Raw virtual-key code
    Other(u16),
}

impl VirtualKey {
    /// Win32 virtual-key code
    pub fn code(&self) -> u16 {
        match self {
            VirtualKey::Back => 0x08,
            VirtualKey::Tab => 0x09,
            VirtualKey::Return => 0x0D,
            VirtualKey::Shift => 0x10,
            VirtualKey::Control => 0x11,
            VirtualKey::Alt => 0x12,
            VirtualKey::Escape => 0x1B,
            VirtualKey::Space => 0x20,
            VirtualKey::PageUp => 0x21,
            VirtualKey::PageDown => 0x22,
            VirtualKey::End => 0x23,
            VirtualKey::Home => 0x24,
            VirtualKey::Left => 0x25,
            VirtualKey::Up => 0x26,
            VirtualKey::Right => 0x27,
            VirtualKey::Down => 0x28,
            VirtualKey::Insert => 0x2D,
            VirtualKey::Delete => 0x2E,
            VirtualKey::F(n) => 0x6F + u16::from(*n),
            VirtualKey::Other(code) => *code,
        }
    }
}

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualKey::F(n) => write!(f, "f{}", n),
            VirtualKey::Other(code) => write!(f, "vk{:#04x}", code),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A single injection primitive, executed in sequence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputAction {
    /// Absolute move in normalized coordinates
    MoveTo { point: NormalizedPoint },
    /// Relative move in pixels
    MoveBy { dx: i32, dy: i32 },
    ButtonDown { button: MouseButton },
    ButtonUp { button: MouseButton },
    KeyDown { key: VirtualKey },
    KeyUp { key: VirtualKey },
    /// Unicode text typed without key translation
    Text { text: String },
}

impl InputAction {
    /// Whether the action goes to the mouse rather than the keyboard
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            InputAction::MoveTo { .. }
                | InputAction::MoveBy { .. }
                | InputAction::ButtonDown { .. }
                | InputAction::ButtonUp { .. }
        )
    }
}

/// Keyboard input item accepted by `send_keys`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Text; line breaks become `Return` presses
    Text(String),
    Char(char),
    Key(VirtualKey),
}

impl From<&str> for KeyInput {
    fn from(text: &str) -> Self {
        KeyInput::Text(text.to_string())
    }
}

impl From<String> for KeyInput {
    fn from(text: String) -> Self {
        KeyInput::Text(text)
    }
}

impl From<char> for KeyInput {
    fn from(c: char) -> Self {
        KeyInput::Char(c)
    }
}

impl From<VirtualKey> for KeyInput {
    fn from(key: VirtualKey) -> Self {
        KeyInput::Key(key)
    }
}
