use tracing::debug;

use super::types::{InputAction, MouseButton, VirtualKey};
use crate::geometry::{GeometryError, NormalizedPoint, ScreenPoint, ScreenSize, normalize_point};

/// Builder handed to the action closure of a dispatch.
///
/// Records primitives in call order. Pixel moves are converted into the
/// normalized space of the display resolution captured at construction,
/// with the configured bias added to both axes.
#[derive(Debug, Clone)]
pub struct Injector {
    screen: ScreenSize,
    bias: i32,
    actions: Vec<InputAction>,
}

impl Injector {
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidResolution` for a non-positive screen size.
    pub fn new(screen: ScreenSize, bias: i32) -> Result<Self, GeometryError> {
        // Validates the resolution once so later conversions cannot fail.
        normalize_point(ScreenPoint::default(), screen, bias)?;
        Ok(Self {
            screen,
            bias,
            actions: Vec::new(),
        })
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Move to an absolute pixel position
    pub fn move_mouse_to(&mut self, point: ScreenPoint) -> &mut Self {
        let normalized = match normalize_point(point, self.screen, self.bias) {
            Ok(normalized) => normalized,
            // Unreachable: the resolution was validated in `new`.
            Err(_) => NormalizedPoint::default(),
        };
        debug!(
            event = "core.input.move_normalized",
            x = point.x,
            y = point.y,
            normalized_x = normalized.x,
            normalized_y = normalized.y,
            screen = %self.screen
        );
        self.move_mouse_to_normalized(normalized)
    }

    /// Move to a position already expressed in normalized coordinates
    pub fn move_mouse_to_normalized(&mut self, point: NormalizedPoint) -> &mut Self {
        self.push(InputAction::MoveTo { point })
    }

    /// Move relative to the current cursor position, in pixels
    pub fn move_mouse_by(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.push(InputAction::MoveBy { dx, dy })
    }

    pub fn button_down(&mut self, button: MouseButton) -> &mut Self {
        self.push(InputAction::ButtonDown { button })
    }

    pub fn button_up(&mut self, button: MouseButton) -> &mut Self {
        self.push(InputAction::ButtonUp { button })
    }

    /// Press and release a button without moving
    pub fn click(&mut self, button: MouseButton) -> &mut Self {
        self.button_down(button).button_up(button)
    }

    pub fn double_click(&mut self, button: MouseButton) -> &mut Self {
        self.click(button).click(button)
    }

    pub fn left_button_down(&mut self) -> &mut Self {
        self.button_down(MouseButton::Left)
    }

    pub fn left_button_up(&mut self) -> &mut Self {
        self.button_up(MouseButton::Left)
    }

    pub fn left_button_click(&mut self) -> &mut Self {
        self.click(MouseButton::Left)
    }

    pub fn right_button_click(&mut self) -> &mut Self {
        self.click(MouseButton::Right)
    }

    pub fn key_down(&mut self, key: VirtualKey) -> &mut Self {
        self.push(InputAction::KeyDown { key })
    }

    pub fn key_up(&mut self, key: VirtualKey) -> &mut Self {
        self.push(InputAction::KeyUp { key })
    }

    /// Press and release a key
    pub fn key_press(&mut self, key: VirtualKey) -> &mut Self {
        self.key_down(key).key_up(key)
    }

    /// Type text as Unicode input; empty text records nothing
    pub fn text_entry(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        self.push(InputAction::Text { text })
    }

    pub fn actions(&self) -> &[InputAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn into_actions(self) -> Vec<InputAction> {
        self.actions
    }

    fn push(&mut self, action: InputAction) -> &mut Self {
        self.actions.push(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injector() -> Injector {
        Injector::new(ScreenSize::new(1920, 1080), 1).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_screen() {
        assert!(Injector::new(ScreenSize::new(0, 0), 1).is_err());
    }

    #[test]
    fn test_move_applies_bias() {
        let mut injector = injector();
        injector.move_mouse_to(ScreenPoint::new(100, 100));
        assert_eq!(
            injector.actions(),
            &[InputAction::MoveTo {
                point: NormalizedPoint { x: 3414, y: 6069 }
            }]
        );
    }

    #[test]
    fn test_click_expands_to_down_up() {
        let mut injector = injector();
        injector.left_button_click();
        assert_eq!(
            injector.into_actions(),
            vec![
                InputAction::ButtonDown {
                    button: MouseButton::Left
                },
                InputAction::ButtonUp {
                    button: MouseButton::Left
                },
            ]
        );
    }

    #[test]
    fn test_chain_preserves_order() {
        let mut injector = injector();
        injector
            .left_button_down()
            .move_mouse_by(40, 0)
            .left_button_up()
            .key_press(VirtualKey::Escape);
        let actions = injector.into_actions();
        assert_eq!(actions.len(), 5);
        assert_eq!(actions[1], InputAction::MoveBy { dx: 40, dy: 0 });
        assert_eq!(
            actions[4],
            InputAction::KeyUp {
                key: VirtualKey::Escape
            }
        );
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let mut injector = injector();
        injector.text_entry("");
        assert!(injector.is_empty());
    }

    #[test]
    fn test_double_click_is_two_clicks() {
        let mut injector = injector();
        injector.double_click(MouseButton::Right);
        assert_eq!(injector.actions().len(), 4);
    }
}
