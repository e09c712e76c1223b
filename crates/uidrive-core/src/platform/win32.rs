//! Win32 input injection and window activation.

use std::ffi::c_void;
use std::mem::size_of;

use tracing::{debug, warn};
use windows::Win32::Foundation::{GetLastError, HWND, POINT};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT, SendInput, SetActiveWindow, SetFocus,
    VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetForegroundWindow, GetSystemMetrics, HWND_NOTOPMOST, HWND_TOPMOST, IsWindow,
    IsWindowVisible, SM_CXSCREEN, SM_CYSCREEN, SWP_NOMOVE, SWP_NOSIZE, SetForegroundWindow,
    SetWindowPos,
};

use super::errors::PlatformError;
use super::traits::{InputBackend, WindowManager};
use super::types::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenSize};
use crate::input::{InputAction, MouseButton, VirtualKey};

/// Backend driving the real Windows desktop through `SendInput`
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Platform;

impl Win32Platform {
    pub fn new() -> Self {
        Self
    }
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.raw() as usize as *mut c_void)
}

fn from_hwnd(hwnd: HWND) -> Option<WindowHandle> {
    if hwnd.is_invalid() {
        None
    } else {
        Some(WindowHandle(hwnd.0 as usize as u64))
    }
}

fn native_error(call: &'static str, error: windows::core::Error) -> PlatformError {
    PlatformError::NativeCall {
        call,
        code: error.code().0,
    }
}

fn last_error(call: &'static str) -> PlatformError {
    let code = unsafe { GetLastError() };
    PlatformError::NativeCall {
        call,
        code: code.0 as i32,
    }
}

fn mouse_input(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn button_flags(button: MouseButton, down: bool) -> MOUSE_EVENT_FLAGS {
    match (button, down) {
        (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
        (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

fn key_input(key: VirtualKey, up: bool) -> INPUT {
    let flags = if up {
        KEYEVENTF_KEYUP
    } else {
        KEYBD_EVENT_FLAGS(0)
    };
    keyboard_input(key.code(), 0, flags)
}

/// Expand actions into the native event records `SendInput` consumes
fn native_inputs(actions: &[InputAction]) -> Vec<INPUT> {
    let mut inputs = Vec::with_capacity(actions.len());
    for action in actions {
        match action {
            InputAction::MoveTo { point } => inputs.push(mouse_input(
                point.x,
                point.y,
                MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE,
            )),
            InputAction::MoveBy { dx, dy } => {
                inputs.push(mouse_input(*dx, *dy, MOUSEEVENTF_MOVE));
            }
            InputAction::ButtonDown { button } => {
                inputs.push(mouse_input(0, 0, button_flags(*button, true)));
            }
            InputAction::ButtonUp { button } => {
                inputs.push(mouse_input(0, 0, button_flags(*button, false)));
            }
            InputAction::KeyDown { key } => inputs.push(key_input(*key, false)),
            InputAction::KeyUp { key } => inputs.push(key_input(*key, true)),
            InputAction::Text { text } => {
                for unit in text.encode_utf16() {
                    inputs.push(keyboard_input(0, unit, KEYEVENTF_UNICODE));
                    inputs.push(keyboard_input(
                        0,
                        unit,
                        KEYEVENTF_UNICODE | KEYEVENTF_KEYUP,
                    ));
                }
            }
        }
    }
    inputs
}

impl InputBackend for Win32Platform {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn screen_resolution(&self) -> Result<ScreenSize, PlatformError> {
        let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if width <= 0 || height <= 0 {
            return Err(PlatformError::InvalidResolution { width, height });
        }
        Ok(ScreenSize::new(width, height))
    }

    fn send_input(&self, actions: &[InputAction]) -> Result<usize, PlatformError> {
        let inputs = native_inputs(actions);
        if inputs.is_empty() {
            return Ok(0);
        }

        let inserted = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) } as usize;
        debug!(
            event = "core.platform.send_input_completed",
            requested = inputs.len(),
            inserted = inserted
        );

        if inserted == 0 {
            return Err(last_error("SendInput"));
        }
        if inserted != inputs.len() {
            warn!(
                event = "core.platform.send_input_partial",
                requested = inputs.len(),
                inserted = inserted
            );
            return Err(PlatformError::InputBlocked {
                inserted,
                requested: inputs.len(),
            });
        }
        Ok(inserted)
    }

    fn cursor_position(&self) -> Result<ScreenPoint, PlatformError> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.map_err(|e| native_error("GetCursorPos", e))?;
        Ok(ScreenPoint::new(point.x, point.y))
    }
}

impl WindowManager for Win32Platform {
    fn foreground_window(&self) -> Option<WindowHandle> {
        from_hwnd(unsafe { GetForegroundWindow() })
    }

    fn set_foreground_window(&self, window: WindowHandle) -> bool {
        unsafe { SetForegroundWindow(to_hwnd(window)) }.as_bool()
    }

    fn set_topmost(&self, window: WindowHandle, topmost: bool) -> Result<(), PlatformError> {
        let insert_after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
        unsafe {
            SetWindowPos(
                to_hwnd(window),
                Some(insert_after),
                0,
                0,
                0,
                0,
                SWP_NOSIZE | SWP_NOMOVE,
            )
        }
        .map_err(|e| native_error("SetWindowPos", e))
    }

    fn set_active_window(&self, window: WindowHandle) -> Result<(), PlatformError> {
        unsafe { SetActiveWindow(to_hwnd(window)) }
            .map(|_| ())
            .map_err(|e| native_error("SetActiveWindow", e))
    }

    fn set_focus(&self, window: WindowHandle) -> Result<(), PlatformError> {
        unsafe { SetFocus(Some(to_hwnd(window))) }
            .map(|_| ())
            .map_err(|e| native_error("SetFocus", e))
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        unsafe { IsWindow(Some(to_hwnd(window))) }.as_bool()
    }

    fn is_window_visible(&self, window: WindowHandle) -> bool {
        unsafe { IsWindowVisible(to_hwnd(window)) }.as_bool()
    }
}
