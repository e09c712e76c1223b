use super::errors::InputError;
use super::injector::Injector;
use super::types::{KeyInput, MouseButton, VirtualKey};

/// Record a list of key inputs on an injector.
///
/// Text is split on line breaks: `"\r\n"` and `"\n"` are first normalized to
/// `"\r"`, every `"\r"` becomes a `Return` key press and the runs between
/// become text entries. A char is a one-character text entry and a key is a
/// key press.
pub fn append_key_inputs(injector: &mut Injector, keys: &[KeyInput]) {
    for key in keys {
        match key {
            KeyInput::Text(text) => append_text(injector, text),
            KeyInput::Char(c) => {
                injector.text_entry(c.to_string());
            }
            KeyInput::Key(key) => {
                injector.key_press(*key);
            }
        }
    }
}

fn append_text(injector: &mut Injector, text: &str) {
    let text = text.replace("\r\n", "\r").replace('\n', "\r");
    let mut segments = text.split('\r').peekable();

    while let Some(segment) = segments.next() {
        injector.text_entry(segment);
        if segments.peek().is_some() {
            injector.key_press(VirtualKey::Return);
        }
    }
}

/// Parse a key name such as `"enter"`, `"esc"`, `"f5"` or `"0x41"`.
///
/// Matching is case-insensitive.
pub fn parse_key_name(name: &str) -> Result<VirtualKey, InputError> {
    let lower = name.trim().to_ascii_lowercase();
    let key = match lower.as_str() {
        "enter" | "return" => VirtualKey::Return,
        "esc" | "escape" => VirtualKey::Escape,
        "tab" => VirtualKey::Tab,
        "space" => VirtualKey::Space,
        "backspace" | "back" => VirtualKey::Back,
        "delete" | "del" => VirtualKey::Delete,
        "insert" | "ins" => VirtualKey::Insert,
        "left" => VirtualKey::Left,
        "right" => VirtualKey::Right,
        "up" => VirtualKey::Up,
        "down" => VirtualKey::Down,
        "home" => VirtualKey::Home,
        "end" => VirtualKey::End,
        "pageup" | "pgup" => VirtualKey::PageUp,
        "pagedown" | "pgdn" => VirtualKey::PageDown,
        "shift" => VirtualKey::Shift,
        "ctrl" | "control" => VirtualKey::Control,
        "alt" => VirtualKey::Alt,
        _ => return parse_numbered_key(&lower, name),
    };
    Ok(key)
}

fn parse_numbered_key(lower: &str, original: &str) -> Result<VirtualKey, InputError> {
    let unknown = || InputError::UnknownKey {
        name: original.to_string(),
    };

    if let Some(hex) = lower.strip_prefix("0x") {
        let code = u16::from_str_radix(hex, 16).map_err(|_| unknown())?;
        return Ok(VirtualKey::Other(code));
    }

    if let Some(number) = lower.strip_prefix('f') {
        let n: u8 = number.parse().map_err(|_| unknown())?;
        if (1..=12).contains(&n) {
            return Ok(VirtualKey::F(n));
        }
    }

    Err(unknown())
}

/// Parse a mouse button name (`left`, `right`, `middle`).
pub fn parse_button_name(name: &str) -> Result<MouseButton, InputError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "left" => Ok(MouseButton::Left),
        "right" => Ok(MouseButton::Right),
        "middle" => Ok(MouseButton::Middle),
        _ => Err(InputError::UnknownButton {
            name: name.to_string(),
        }),
    }
}
