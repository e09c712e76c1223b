//! Minimal forms toolkit hosted on the simulated UI thread.
//!
//! Forms hold buttons and text boxes and react to routed window events the
//! way desktop dialogs do: default and cancel buttons, keyboard focus,
//! click-on-release and dialog results.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::desktop::{InputSink, SimDesktop, WindowEvent};
use super::errors::SimError;
use super::message_loop::UiHandle;
use crate::context::UiHost;
use crate::geometry::{Rect, ScreenPoint};
use crate::input::{MouseButton, VirtualKey};
use crate::platform::{WindowHandle, WindowManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogResult {
    Ok,
    Cancel,
    Abort,
    Retry,
    Ignore,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub usize);

#[derive(Debug, Clone)]
enum ControlKind {
    Button {
        text: String,
        dialog_result: Option<DialogResult>,
        clicks: usize,
    },
    TextBox {
        text: String,
    },
}

#[derive(Debug, Clone)]
struct Control {
    // Client coordinates.
    bounds: Rect,
    kind: ControlKind,
}

#[derive(Debug)]
struct FormState {
    title: String,
    bounds: Rect,
    topmost: bool,
    controls: Vec<Control>,
    accept: Option<ControlId>,
    cancel: Option<ControlId>,
    focused: Option<ControlId>,
    pressed: Option<ControlId>,
    space_pressed: Option<ControlId>,
    result: Option<DialogResult>,
    window: Option<WindowHandle>,
    active: bool,
    closed: bool,
}

impl FormState {
    fn control(&self, id: ControlId) -> Result<&Control, SimError> {
        self.controls
            .get(id.0)
            .ok_or(SimError::UnknownControl { id: id.0 })
    }

    fn button(&self, id: ControlId) -> Result<(), SimError> {
        match self.control(id)?.kind {
            ControlKind::Button { .. } => Ok(()),
            ControlKind::TextBox { .. } => Err(SimError::WrongControlKind {
                id: id.0,
                expected: "button",
            }),
        }
    }

    fn is_button(&self, id: ControlId) -> bool {
        self.button(id).is_ok()
    }

    fn control_at(&self, point: ScreenPoint) -> Option<ControlId> {
        let origin = self.bounds.origin();
        let client = ScreenPoint::new(point.x - origin.x, point.y - origin.y);
        self.controls
            .iter()
            .position(|c| c.bounds.contains(client))
            .map(ControlId)
    }

    /// Click a control. Returns true when the click closes the form.
    fn click(&mut self, id: ControlId) -> bool {
        let Some(control) = self.controls.get_mut(id.0) else {
            return false;
        };
        let ControlKind::Button {
            text,
            dialog_result,
            clicks,
        } = &mut control.kind
        else {
            return false;
        };

        *clicks += 1;
        debug!(
            event = "core.sim.button_clicked",
            button = %text,
            clicks = *clicks
        );

        match dialog_result {
            Some(result) => {
                self.result = Some(*result);
                true
            }
            None => false,
        }
    }

    fn cycle_focus(&mut self) {
        if self.controls.is_empty() {
            return;
        }
        let next = match self.focused {
            Some(ControlId(current)) => (current + 1) % self.controls.len(),
            None => 0,
        };
        self.focused = Some(ControlId(next));
        self.space_pressed = None;
    }

    fn focused_text_box(&self) -> Option<ControlId> {
        let id = self.focused?;
        match self.controls.get(id.0)?.kind {
            ControlKind::TextBox { .. } => Some(id),
            ControlKind::Button { .. } => None,
        }
    }

    fn text_box_mut(&mut self, id: ControlId) -> Option<&mut String> {
        match &mut self.controls.get_mut(id.0)?.kind {
            ControlKind::TextBox { text } => Some(text),
            ControlKind::Button { .. } => None,
        }
    }

    /// Route one raw window event.
    ///
    /// Only routing state (pressed control, focus) changes here. Clicks and
    /// text edits come back as a command that the form posts to itself.
    fn handle(&mut self, event: WindowEvent) -> Option<FormCommand> {
        match event {
            WindowEvent::MouseDown {
                button: MouseButton::Left,
                point,
            } => {
                self.pressed = self.control_at(point);
                if let Some(id) = self.pressed {
                    self.focused = Some(id);
                }
                None
            }
            WindowEvent::MouseUp {
                button: MouseButton::Left,
                point,
            } => match self.pressed.take() {
                Some(id) if self.control_at(point) == Some(id) => Some(FormCommand::Click(id)),
                _ => None,
            },
            WindowEvent::KeyDown { key } => self.key_down(key),
            WindowEvent::KeyUp {
                key: VirtualKey::Space,
            } => match (self.space_pressed.take(), self.focused) {
                (Some(pressed), Some(focused)) if pressed == focused => {
                    Some(FormCommand::Click(pressed))
                }
                _ => None,
            },
            WindowEvent::Char { ch } if !ch.is_control() => self
                .focused_text_box()
                .map(|id| FormCommand::InsertChar { id, ch }),
            WindowEvent::Activated => {
                self.active = true;
                None
            }
            WindowEvent::Deactivated => {
                self.active = false;
                None
            }
            _ => None,
        }
    }

    fn key_down(&mut self, key: VirtualKey) -> Option<FormCommand> {
        match key {
            VirtualKey::Escape => self.cancel.map(FormCommand::Click),
            VirtualKey::Return => self
                .focused
                .filter(|&id| self.is_button(id))
                .or(self.accept)
                .map(FormCommand::Click),
            VirtualKey::Space => {
                self.space_pressed = self.focused.filter(|&id| self.is_button(id));
                None
            }
            VirtualKey::Tab => {
                self.cycle_focus();
                None
            }
            VirtualKey::Back => self.focused_text_box().map(FormCommand::DeleteChar),
            _ => None,
        }
    }

    /// Run a posted command. Returns true when the form should close.
    fn apply(&mut self, command: FormCommand) -> bool {
        match command {
            FormCommand::Click(id) => self.click(id),
            FormCommand::InsertChar { id, ch } => {
                if let Some(text) = self.text_box_mut(id) {
                    text.push(ch);
                }
                false
            }
            FormCommand::DeleteChar(id) => {
                if let Some(text) = self.text_box_mut(id) {
                    text.pop();
                }
                false
            }
        }
    }
}

/// Work a routed event posts back to its form, like a control notification
/// that follows the raw input message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormCommand {
    Click(ControlId),
    InsertChar { id: ControlId, ch: char },
    DeleteChar(ControlId),
}

struct FormShared {
    ui: UiHandle,
    desktop: SimDesktop,
    state: Mutex<FormState>,
}

/// Routes desktop events for a form's window onto the UI thread
struct FormSink {
    form: Weak<FormShared>,
    ui: UiHandle,
}

impl InputSink for FormSink {
    fn deliver(&self, event: WindowEvent) {
        let form = self.form.clone();
        let posted = self.ui.post(Box::new(move || {
            if let Some(shared) = form.upgrade() {
                FormHandle { shared }.handle_event(event);
            }
        }));
        if posted.is_err() {
            debug!(event = "core.sim.event_dropped", reason = "loop closed");
        }
    }
}

/// Handle to a form. Every method must be called on the UI thread.
#[derive(Clone)]
pub struct FormHandle {
    shared: Arc<FormShared>,
}

impl FormHandle {
    fn state(&self, operation: &'static str) -> Result<MutexGuard<'_, FormState>, SimError> {
        if !self.shared.ui.is_ui_thread() {
            return Err(SimError::CrossThreadAccess { operation });
        }
        Ok(self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn add_control(
        &self,
        operation: &'static str,
        bounds: Rect,
        kind: ControlKind,
    ) -> Result<ControlId, SimError> {
        let mut state = self.state(operation)?;
        state.controls.push(Control { bounds, kind });
        Ok(ControlId(state.controls.len() - 1))
    }

    /// Add a button; `bounds` are relative to the form
    pub fn add_button(
        &self,
        text: impl Into<String>,
        bounds: Rect,
        dialog_result: Option<DialogResult>,
    ) -> Result<ControlId, SimError> {
        self.add_control(
            "FormHandle::add_button",
            bounds,
            ControlKind::Button {
                text: text.into(),
                dialog_result,
                clicks: 0,
            },
        )
    }

    pub fn add_text_box(&self, bounds: Rect) -> Result<ControlId, SimError> {
        self.add_control(
            "FormHandle::add_text_box",
            bounds,
            ControlKind::TextBox {
                text: String::new(),
            },
        )
    }

    /// Button clicked by `Return` when no button has focus
    pub fn set_accept_button(&self, id: ControlId) -> Result<(), SimError> {
        let mut state = self.state("FormHandle::set_accept_button")?;
        state.button(id)?;
        state.accept = Some(id);
        Ok(())
    }

    /// Button clicked by `Escape`
    pub fn set_cancel_button(&self, id: ControlId) -> Result<(), SimError> {
        let mut state = self.state("FormHandle::set_cancel_button")?;
        state.button(id)?;
        state.cancel = Some(id);
        Ok(())
    }

    pub fn set_focus(&self, id: ControlId) -> Result<(), SimError> {
        let mut state = self.state("FormHandle::set_focus")?;
        state.control(id)?;
        state.focused = Some(id);
        Ok(())
    }

    /// Keep the form above normal windows once shown
    pub fn set_topmost(&self, topmost: bool) -> Result<(), SimError> {
        let mut state = self.state("FormHandle::set_topmost")?;
        state.topmost = topmost;
        if let Some(window) = state.window {
            if let Err(e) = self.shared.desktop.set_topmost(window, topmost) {
                debug!(
                    event = "core.sim.set_topmost_failed",
                    window = %window,
                    error = %e
                );
            }
        }
        Ok(())
    }

    pub fn title(&self) -> Result<String, SimError> {
        Ok(self.state("FormHandle::title")?.title.clone())
    }

    pub fn bounds(&self) -> Result<Rect, SimError> {
        Ok(self.state("FormHandle::bounds")?.bounds)
    }

    pub fn window(&self) -> Result<Option<WindowHandle>, SimError> {
        Ok(self.state("FormHandle::window")?.window)
    }

    pub fn is_open(&self) -> Result<bool, SimError> {
        let state = self.state("FormHandle::is_open")?;
        Ok(state.window.is_some() && !state.closed)
    }

    pub fn is_active(&self) -> Result<bool, SimError> {
        Ok(self.state("FormHandle::is_active")?.active)
    }

    pub fn dialog_result(&self) -> Result<Option<DialogResult>, SimError> {
        Ok(self.state("FormHandle::dialog_result")?.result)
    }

    pub fn focused_control(&self) -> Result<Option<ControlId>, SimError> {
        Ok(self.state("FormHandle::focused_control")?.focused)
    }

    pub fn click_count(&self, id: ControlId) -> Result<usize, SimError> {
        let state = self.state("FormHandle::click_count")?;
        match &state.control(id)?.kind {
            ControlKind::Button { clicks, .. } => Ok(*clicks),
            ControlKind::TextBox { .. } => Err(SimError::WrongControlKind {
                id: id.0,
                expected: "button",
            }),
        }
    }

    pub fn text(&self, id: ControlId) -> Result<String, SimError> {
        let state = self.state("FormHandle::text")?;
        match &state.control(id)?.kind {
            ControlKind::Button { text, .. } | ControlKind::TextBox { text } => Ok(text.clone()),
        }
    }

    /// Control bounds in screen coordinates
    pub fn control_screen_rect(&self, id: ControlId) -> Result<Rect, SimError> {
        let state = self.state("FormHandle::control_screen_rect")?;
        let control = state.control(id)?;
        Ok(control.bounds.translate(state.bounds.origin()))
    }

    /// Create the form's window and activate it. Idempotent while open.
    pub fn show(&self) -> Result<WindowHandle, SimError> {
        let mut state = self.state("FormHandle::show")?;
        if state.closed {
            return Err(SimError::FormClosed);
        }
        if let Some(window) = state.window {
            return Ok(window);
        }

        let sink = Arc::new(FormSink {
            form: Arc::downgrade(&self.shared),
            ui: self.shared.ui.clone(),
        });
        let desktop = &self.shared.desktop;
        let window = desktop.create_window(state.bounds, sink);
        state.window = Some(window);
        let topmost = state.topmost;
        drop(state);

        self.shared.ui.window_opened();
        if topmost {
            if let Err(e) = desktop.set_topmost(window, true) {
                debug!(
                    event = "core.sim.set_topmost_failed",
                    window = %window,
                    error = %e
                );
            }
        }
        desktop.activate_window(window);

        info!(event = "core.sim.form_shown", window = %window);
        Ok(window)
    }

    /// Show the form and pump a nested modal loop until it closes.
    pub fn show_dialog(&self) -> Result<Option<DialogResult>, SimError> {
        self.show()?;
        let form = self.clone();
        self.shared.ui.run_modal(&move || form.lock().closed)?;
        Ok(self.lock().result)
    }

    /// Close the form and destroy its window. Idempotent.
    pub fn close(&self) -> Result<(), SimError> {
        let mut state = self.state("FormHandle::close")?;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let window = state.window;
        drop(state);
        self.release_window(window);
        Ok(())
    }

    fn release_window(&self, window: Option<WindowHandle>) {
        let Some(window) = window else {
            return;
        };
        self.shared.desktop.destroy_window(window);
        self.shared.ui.window_closed();
        info!(event = "core.sim.form_closed", window = %window);
    }

    fn handle_event(&self, event: WindowEvent) {
        let command = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.handle(event)
        };
        let Some(command) = command else {
            return;
        };

        let form = Arc::downgrade(&self.shared);
        let posted = self.shared.ui.post(Box::new(move || {
            if let Some(shared) = form.upgrade() {
                FormHandle { shared }.apply_command(command);
            }
        }));
        if posted.is_err() {
            debug!(event = "core.sim.command_dropped", command = ?command);
        }
    }

    fn apply_command(&self, command: FormCommand) {
        let mut state = self.lock();
        if state.closed || !state.apply(command) {
            return;
        }
        state.closed = true;
        let window = state.window;
        drop(state);
        self.release_window(window);
    }
}

impl std::fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle").finish_non_exhaustive()
    }
}

/// Creates forms on the simulated desktop
#[derive(Clone)]
pub struct Toolkit {
    ui: UiHandle,
    desktop: SimDesktop,
}

impl Toolkit {
    pub fn new(ui: UiHandle, desktop: SimDesktop) -> Self {
        Self { ui, desktop }
    }

    pub fn ui(&self) -> &UiHandle {
        &self.ui
    }

    pub fn desktop(&self) -> &SimDesktop {
        &self.desktop
    }

    /// Create a hidden form at `bounds` (screen coordinates).
    pub fn create_form(
        &self,
        title: impl Into<String>,
        bounds: Rect,
    ) -> Result<FormHandle, SimError> {
        if !self.ui.is_ui_thread() {
            return Err(SimError::CrossThreadAccess {
                operation: "Toolkit::create_form",
            });
        }

        let title = title.into();
        debug!(event = "core.sim.form_created", title = %title);
        Ok(FormHandle {
            shared: Arc::new(FormShared {
                ui: self.ui.clone(),
                desktop: self.desktop.clone(),
                state: Mutex::new(FormState {
                    title,
                    bounds,
                    topmost: false,
                    controls: Vec::new(),
                    accept: None,
                    cancel: None,
                    focused: None,
                    pressed: None,
                    space_pressed: None,
                    result: None,
                    window: None,
                    active: false,
                    closed: false,
                }),
            }),
        })
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("desktop", &self.desktop)
            .finish()
    }
}
