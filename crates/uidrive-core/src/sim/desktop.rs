//! In-process desktop implementing the platform traits.
//!
//! Absolute moves are mapped back to pixels the way the OS does it, mouse
//! input goes to the window under the cursor (or the window holding mouse
//! capture) and keyboard input goes to the foreground window.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::geometry::{Rect, ScreenPoint, ScreenSize, denormalize_point};
use crate::input::{InputAction, MouseButton, VirtualKey};
use crate::platform::{InputBackend, PlatformError, WindowHandle, WindowManager};

/// Win32 `ERROR_INVALID_WINDOW_HANDLE`
const INVALID_WINDOW_HANDLE: i32 = 1400;

const FIRST_WINDOW_HANDLE: u64 = 0x1_0000;

/// Event routed to a simulated window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    MouseMove { point: ScreenPoint },
    MouseDown { button: MouseButton, point: ScreenPoint },
    MouseUp { button: MouseButton, point: ScreenPoint },
    KeyDown { key: VirtualKey },
    KeyUp { key: VirtualKey },
    Char { ch: char },
    Activated,
    Deactivated,
}

/// Receiver of the events routed to one window.
///
/// Called on the injecting thread; implementations marshal to their own
/// thread as needed.
pub trait InputSink: Send + Sync {
    fn deliver(&self, event: WindowEvent);
}

/// Sink that drops every event
#[derive(Debug, Default)]
pub struct NullSink;

impl InputSink for NullSink {
    fn deliver(&self, _event: WindowEvent) {}
}

/// Sink that keeps every event, for assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WindowEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<WindowEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InputSink for RecordingSink {
    fn deliver(&self, event: WindowEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

struct SimWindow {
    handle: WindowHandle,
    bounds: Rect,
    visible: bool,
    topmost: bool,
    sink: Arc<dyn InputSink>,
}

#[derive(Debug, Default, Clone, Copy)]
struct FailureKnobs {
    refuse_foreground: bool,
    missing_foreground_reads: u32,
    cursor_report_lag: u32,
    events_before_failure: Option<usize>,
}

type Delivery = (Arc<dyn InputSink>, WindowEvent);

struct DesktopState {
    screen: ScreenSize,
    cursor: ScreenPoint,
    reported_cursor: ScreenPoint,
    stale_reads: u32,
    // Front to back.
    windows: Vec<SimWindow>,
    foreground: Option<WindowHandle>,
    active: Option<WindowHandle>,
    focus: Option<WindowHandle>,
    capture: Option<WindowHandle>,
    buttons_down: Vec<MouseButton>,
    next_handle: u64,
    knobs: FailureKnobs,
    injected_total: usize,
}

impl DesktopState {
    fn index_of(&self, window: WindowHandle) -> Option<usize> {
        self.windows.iter().position(|w| w.handle == window)
    }

    fn window(&self, window: WindowHandle) -> Option<&SimWindow> {
        self.windows.iter().find(|w| w.handle == window)
    }

    fn sink(&self, window: WindowHandle) -> Option<Arc<dyn InputSink>> {
        self.window(window).map(|w| w.sink.clone())
    }

    fn window_at(&self, point: ScreenPoint) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|w| w.visible && w.bounds.contains(point))
            .map(|w| w.handle)
    }

    /// Move a window to the front of its band (topmost windows stay above).
    fn raise(&mut self, index: usize) {
        let window = self.windows.remove(index);
        let position = if window.topmost {
            0
        } else {
            self.windows
                .iter()
                .position(|w| !w.topmost)
                .unwrap_or(self.windows.len())
        };
        self.windows.insert(position, window);
    }

    fn activate(&mut self, window: WindowHandle, deliveries: &mut Vec<Delivery>) -> bool {
        let Some(index) = self.index_of(window) else {
            return false;
        };
        if !self.windows[index].visible {
            return false;
        }

        if let Some(previous) = self.foreground.filter(|&p| p != window) {
            if let Some(sink) = self.sink(previous) {
                deliveries.push((sink, WindowEvent::Deactivated));
            }
        }
        if self.foreground != Some(window) {
            deliveries.push((self.windows[index].sink.clone(), WindowEvent::Activated));
        }

        self.raise(index);
        self.foreground = Some(window);
        self.active = Some(window);
        self.focus = Some(window);
        true
    }

    fn remove(&mut self, window: WindowHandle, deliveries: &mut Vec<Delivery>) -> bool {
        let Some(index) = self.index_of(window) else {
            return false;
        };
        self.windows.remove(index);

        if self.capture == Some(window) {
            self.capture = None;
        }
        if self.active == Some(window) {
            self.active = None;
        }
        if self.focus == Some(window) {
            self.focus = None;
        }
        if self.foreground == Some(window) {
            self.foreground = None;
            let next = self.windows.iter().find(|w| w.visible).map(|w| w.handle);
            if let Some(next) = next {
                self.activate(next, deliveries);
            }
        }
        true
    }

    fn mouse_target(&self) -> Option<WindowHandle> {
        self.capture.or_else(|| self.window_at(self.cursor))
    }

    fn deliver_to(
        &self,
        window: Option<WindowHandle>,
        event: WindowEvent,
        deliveries: &mut Vec<Delivery>,
    ) {
        if let Some(sink) = window.and_then(|w| self.sink(w)) {
            deliveries.push((sink, event));
        }
    }

    fn clamp_to_screen(&self, point: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x.clamp(0, self.screen.width - 1),
            point.y.clamp(0, self.screen.height - 1),
        )
    }

    fn apply(
        &mut self,
        action: &InputAction,
        deliveries: &mut Vec<Delivery>,
    ) -> Result<(), PlatformError> {
        match action {
            InputAction::MoveTo { point } => {
                self.cursor = denormalize_point(*point, self.screen).map_err(|_| {
                    PlatformError::InvalidResolution {
                        width: self.screen.width,
                        height: self.screen.height,
                    }
                })?;
                let cursor = self.cursor;
                self.deliver_to(
                    self.mouse_target(),
                    WindowEvent::MouseMove { point: cursor },
                    deliveries,
                );
            }
            InputAction::MoveBy { dx, dy } => {
                self.cursor = self.clamp_to_screen(self.cursor.offset(*dx, *dy));
                let cursor = self.cursor;
                self.deliver_to(
                    self.mouse_target(),
                    WindowEvent::MouseMove { point: cursor },
                    deliveries,
                );
            }
            InputAction::ButtonDown { button } => {
                let target = self.mouse_target();
                if let Some(window) = target {
                    if self.foreground != Some(window) {
                        self.activate(window, deliveries);
                    }
                    self.capture = Some(window);
                }
                self.buttons_down.push(*button);
                let point = self.cursor;
                self.deliver_to(
                    target,
                    WindowEvent::MouseDown {
                        button: *button,
                        point,
                    },
                    deliveries,
                );
            }
            InputAction::ButtonUp { button } => {
                let target = self.mouse_target();
                self.buttons_down.retain(|b| b != button);
                if self.buttons_down.is_empty() {
                    self.capture = None;
                }
                let point = self.cursor;
                self.deliver_to(
                    target,
                    WindowEvent::MouseUp {
                        button: *button,
                        point,
                    },
                    deliveries,
                );
            }
            InputAction::KeyDown { key } => {
                self.deliver_to(self.foreground, WindowEvent::KeyDown { key: *key }, deliveries);
            }
            InputAction::KeyUp { key } => {
                self.deliver_to(self.foreground, WindowEvent::KeyUp { key: *key }, deliveries);
            }
            InputAction::Text { text } => {
                for ch in text.chars() {
                    self.deliver_to(self.foreground, WindowEvent::Char { ch }, deliveries);
                }
            }
        }
        Ok(())
    }
}

/// Shared handle to a simulated desktop
#[derive(Clone)]
pub struct SimDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl SimDesktop {
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            state: Arc::new(Mutex::new(DesktopState {
                screen,
                cursor: ScreenPoint::default(),
                reported_cursor: ScreenPoint::default(),
                stale_reads: 0,
                windows: Vec::new(),
                foreground: None,
                active: None,
                focus: None,
                capture: None,
                buttons_down: Vec::new(),
                next_handle: FIRST_WINDOW_HANDLE,
                knobs: FailureKnobs::default(),
                injected_total: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(deliveries: Vec<Delivery>) {
        for (sink, event) in deliveries {
            sink.deliver(event);
        }
    }

    /// Create a visible window at the front of the normal band, not activated.
    pub fn create_window(&self, bounds: Rect, sink: Arc<dyn InputSink>) -> WindowHandle {
        let mut state = self.lock();
        let handle = WindowHandle(state.next_handle);
        state.next_handle += 0x10;
        state.windows.push(SimWindow {
            handle,
            bounds,
            visible: true,
            topmost: false,
            sink,
        });
        let index = state.windows.len() - 1;
        state.raise(index);
        debug!(event = "core.sim.window_created", window = %handle, bounds = ?bounds);
        handle
    }

    /// Remove a window. The next visible window is activated if it was foreground.
    pub fn destroy_window(&self, window: WindowHandle) -> bool {
        let mut deliveries = Vec::new();
        let removed = self.lock().remove(window, &mut deliveries);
        Self::dispatch(deliveries);
        if removed {
            debug!(event = "core.sim.window_destroyed", window = %window);
        }
        removed
    }

    /// Activate a window as a user click on its title bar would
    pub fn activate_window(&self, window: WindowHandle) -> bool {
        let mut deliveries = Vec::new();
        let activated = self.lock().activate(window, &mut deliveries);
        Self::dispatch(deliveries);
        activated
    }

    pub fn set_window_visible(&self, window: WindowHandle, visible: bool) {
        let mut state = self.lock();
        if let Some(index) = state.index_of(window) {
            state.windows[index].visible = visible;
        }
    }

    pub fn window_bounds(&self, window: WindowHandle) -> Option<Rect> {
        self.lock().window(window).map(|w| w.bounds)
    }

    pub fn window_at(&self, point: ScreenPoint) -> Option<WindowHandle> {
        self.lock().window_at(point)
    }

    /// Windows from front to back
    pub fn z_order(&self) -> Vec<WindowHandle> {
        self.lock().windows.iter().map(|w| w.handle).collect()
    }

    pub fn is_topmost(&self, window: WindowHandle) -> bool {
        self.lock().window(window).is_some_and(|w| w.topmost)
    }

    pub fn active_window(&self) -> Option<WindowHandle> {
        self.lock().active
    }

    pub fn focus_window(&self) -> Option<WindowHandle> {
        self.lock().focus
    }

    /// Actual cursor position, ignoring any read-back lag
    pub fn cursor(&self) -> ScreenPoint {
        self.lock().cursor
    }

    pub fn set_cursor(&self, point: ScreenPoint) {
        let mut state = self.lock();
        let point = state.clamp_to_screen(point);
        state.cursor = point;
        state.reported_cursor = point;
        state.stale_reads = 0;
    }

    /// Total primitives injected since creation
    pub fn injected_count(&self) -> usize {
        self.lock().injected_total
    }

    /// Make `set_foreground_window` report failure
    pub fn set_refuse_foreground(&self, refuse: bool) {
        self.lock().knobs.refuse_foreground = refuse;
    }

    /// Report no foreground window for the next `reads` queries
    pub fn set_missing_foreground_reads(&self, reads: u32) {
        self.lock().knobs.missing_foreground_reads = reads;
    }

    /// After each injected move, report the pre-move cursor for `reads` queries
    pub fn set_cursor_report_lag(&self, reads: u32) {
        self.lock().knobs.cursor_report_lag = reads;
    }

    /// Block injection once `events` more primitives have been inserted
    pub fn fail_injection_after(&self, events: Option<usize>) {
        self.lock().knobs.events_before_failure = events;
    }
}

impl std::fmt::Debug for SimDesktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimDesktop")
            .field("screen", &state.screen)
            .field("cursor", &state.cursor)
            .field("windows", &state.windows.len())
            .field("foreground", &state.foreground)
            .finish()
    }
}

impl InputBackend for SimDesktop {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn screen_resolution(&self) -> Result<ScreenSize, PlatformError> {
        Ok(self.lock().screen)
    }

    fn send_input(&self, actions: &[InputAction]) -> Result<usize, PlatformError> {
        let mut deliveries = Vec::new();
        let result = {
            let mut state = self.lock();
            let before = state.cursor;
            let mut inserted = 0;
            let mut outcome = Ok(());

            for action in actions {
                if let Some(remaining) = state.knobs.events_before_failure {
                    if remaining == 0 {
                        outcome = Err(PlatformError::InputBlocked {
                            inserted,
                            requested: actions.len(),
                        });
                        break;
                    }
                    state.knobs.events_before_failure = Some(remaining - 1);
                }
                if let Err(e) = state.apply(action, &mut deliveries) {
                    outcome = Err(e);
                    break;
                }
                inserted += 1;
                state.injected_total += 1;
            }

            let moved = actions[..inserted].iter().any(|a| {
                matches!(a, InputAction::MoveTo { .. } | InputAction::MoveBy { .. })
            });
            if moved && state.knobs.cursor_report_lag > 0 {
                state.reported_cursor = before;
                state.stale_reads = state.knobs.cursor_report_lag;
            }

            outcome.map(|()| inserted)
        };

        Self::dispatch(deliveries);
        result
    }

    fn cursor_position(&self) -> Result<ScreenPoint, PlatformError> {
        let mut state = self.lock();
        if state.stale_reads > 0 {
            state.stale_reads -= 1;
            return Ok(state.reported_cursor);
        }
        Ok(state.cursor)
    }
}

impl WindowManager for SimDesktop {
    fn foreground_window(&self) -> Option<WindowHandle> {
        let mut state = self.lock();
        if state.knobs.missing_foreground_reads > 0 {
            state.knobs.missing_foreground_reads -= 1;
            return None;
        }
        state.foreground
    }

    fn set_foreground_window(&self, window: WindowHandle) -> bool {
        let mut deliveries = Vec::new();
        let activated = {
            let mut state = self.lock();
            !state.knobs.refuse_foreground && state.activate(window, &mut deliveries)
        };
        Self::dispatch(deliveries);
        activated
    }

    fn set_topmost(&self, window: WindowHandle, topmost: bool) -> Result<(), PlatformError> {
        let mut state = self.lock();
        let index = state.index_of(window).ok_or(PlatformError::NativeCall {
            call: "SetWindowPos",
            code: INVALID_WINDOW_HANDLE,
        })?;
        state.windows[index].topmost = topmost;
        state.raise(index);
        Ok(())
    }

    fn set_active_window(&self, window: WindowHandle) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if state.index_of(window).is_none() {
            return Err(PlatformError::NativeCall {
                call: "SetActiveWindow",
                code: INVALID_WINDOW_HANDLE,
            });
        }
        state.active = Some(window);
        Ok(())
    }

    fn set_focus(&self, window: WindowHandle) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if state.index_of(window).is_none() {
            return Err(PlatformError::NativeCall {
                call: "SetFocus",
                code: INVALID_WINDOW_HANDLE,
            });
        }
        state.focus = Some(window);
        Ok(())
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        self.lock().index_of(window).is_some()
    }

    fn is_window_visible(&self, window: WindowHandle) -> bool {
        self.lock().window(window).is_some_and(|w| w.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::normalize_point;

    fn desktop_with_window(bounds: Rect) -> (SimDesktop, WindowHandle, Arc<RecordingSink>) {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let sink = Arc::new(RecordingSink::default());
        let window = desktop.create_window(bounds, sink.clone());
        (desktop, window, sink)
    }

    fn move_to(desktop: &SimDesktop, point: ScreenPoint) -> InputAction {
        let screen = desktop.screen_resolution().unwrap();
        InputAction::MoveTo {
            point: normalize_point(point, screen, 1).unwrap(),
        }
    }

    #[test]
    fn test_absolute_move_lands_on_requested_pixel() {
        let (desktop, _, _) = desktop_with_window(Rect::new(0, 0, 100, 100));
        for point in [
            ScreenPoint::new(0, 0),
            ScreenPoint::new(399, 300),
            ScreenPoint::new(799, 599),
        ] {
            let action = move_to(&desktop, point);
            desktop.send_input(&[action]).unwrap();
            assert_eq!(desktop.cursor_position().unwrap(), point);
        }
    }

    #[test]
    fn test_button_down_activates_window_under_cursor() {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let back = desktop.create_window(Rect::new(0, 0, 400, 400), Arc::new(NullSink));
        let front = desktop.create_window(Rect::new(500, 0, 200, 200), Arc::new(NullSink));
        assert!(desktop.activate_window(front));

        let action = move_to(&desktop, ScreenPoint::new(10, 10));
        desktop
            .send_input(&[
                action,
                InputAction::ButtonDown {
                    button: MouseButton::Left,
                },
            ])
            .unwrap();
        assert_eq!(desktop.foreground_window(), Some(back));
        assert_eq!(desktop.z_order()[0], back);
    }

    #[test]
    fn test_keyboard_goes_to_foreground_window() {
        let (desktop, window, sink) = desktop_with_window(Rect::new(0, 0, 100, 100));
        desktop.activate_window(window);
        desktop
            .send_input(&[InputAction::Text {
                text: "hi".to_string(),
            }])
            .unwrap();
        let chars: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                WindowEvent::Char { ch } => Some(ch),
                _ => None,
            })
            .collect();
        assert_eq!(chars, vec!['h', 'i']);
    }

    #[test]
    fn test_mouse_capture_routes_button_up_to_pressed_window() {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let left_sink = Arc::new(RecordingSink::default());
        let left = desktop.create_window(Rect::new(0, 0, 100, 100), left_sink.clone());
        desktop.create_window(Rect::new(200, 0, 100, 100), Arc::new(NullSink));
        desktop.activate_window(left);

        let down = move_to(&desktop, ScreenPoint::new(50, 50));
        let off = move_to(&desktop, ScreenPoint::new(250, 50));
        desktop
            .send_input(&[
                down,
                InputAction::ButtonDown {
                    button: MouseButton::Left,
                },
                off,
                InputAction::ButtonUp {
                    button: MouseButton::Left,
                },
            ])
            .unwrap();

        assert!(left_sink.events().contains(&WindowEvent::MouseUp {
            button: MouseButton::Left,
            point: ScreenPoint::new(250, 50),
        }));
    }

    #[test]
    fn test_topmost_windows_stay_in_front() {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let pinned = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        desktop.set_topmost(pinned, true).unwrap();
        let later = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        assert_eq!(desktop.z_order(), vec![pinned, later]);
        assert!(desktop.is_topmost(pinned));

        desktop.set_topmost(pinned, false).unwrap();
        assert_eq!(desktop.z_order(), vec![pinned, later]);
        assert!(!desktop.is_topmost(pinned));
    }

    #[test]
    fn test_fail_injection_after_reports_partial_insert() {
        let (desktop, window, _) = desktop_with_window(Rect::new(0, 0, 100, 100));
        desktop.activate_window(window);
        desktop.fail_injection_after(Some(1));

        let result = desktop.send_input(&[
            InputAction::KeyDown {
                key: VirtualKey::Tab,
            },
            InputAction::KeyUp {
                key: VirtualKey::Tab,
            },
        ]);
        assert!(matches!(
            result,
            Err(PlatformError::InputBlocked {
                inserted: 1,
                requested: 2
            })
        ));
        assert_eq!(desktop.injected_count(), 1);
    }

    #[test]
    fn test_cursor_report_lag_returns_stale_position() {
        let (desktop, _, _) = desktop_with_window(Rect::new(0, 0, 100, 100));
        desktop.set_cursor_report_lag(1);
        let action = move_to(&desktop, ScreenPoint::new(30, 40));
        desktop.send_input(&[action]).unwrap();

        assert_eq!(desktop.cursor_position().unwrap(), ScreenPoint::new(0, 0));
        assert_eq!(desktop.cursor_position().unwrap(), ScreenPoint::new(30, 40));
    }

    #[test]
    fn test_relative_move_past_i32_range_clamps_to_screen_edge() {
        let (desktop, _, _) = desktop_with_window(Rect::new(0, 0, 100, 100));
        desktop.set_cursor(ScreenPoint::new(10, 10));
        desktop
            .send_input(&[InputAction::MoveBy {
                dx: i32::MAX,
                dy: i32::MIN,
            }])
            .unwrap();
        assert_eq!(desktop.cursor_position().unwrap(), ScreenPoint::new(799, 0));
    }

    #[test]
    fn test_destroying_foreground_activates_next_window() {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let first = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        let second = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        desktop.activate_window(second);

        assert!(desktop.destroy_window(second));
        assert_eq!(desktop.foreground_window(), Some(first));
        assert!(!desktop.is_window(second));
    }

    #[test]
    fn test_refused_foreground_keeps_previous() {
        let desktop = SimDesktop::new(ScreenSize::new(800, 600));
        let first = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        let second = desktop.create_window(Rect::new(0, 0, 10, 10), Arc::new(NullSink));
        desktop.activate_window(first);
        desktop.set_refuse_foreground(true);

        assert!(!desktop.set_foreground_window(second));
        assert_eq!(desktop.foreground_window(), Some(first));
    }
}
