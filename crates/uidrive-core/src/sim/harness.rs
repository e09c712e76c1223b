use std::future::Future;
use std::sync::Arc;

use futures::channel::oneshot;
use tracing::{info, warn};

use super::desktop::SimDesktop;
use super::errors::SimError;
use super::message_loop::UiThread;
use super::toolkit::{ControlId, DialogResult, FormHandle, Toolkit};
use crate::config::DriveConfig;
use crate::context::{BridgeError, TaskContext, UiHost};
use crate::dispatch::{DispatchReport, InputDispatcher};
use crate::geometry::{Rect, ScreenPoint, ScreenSize};
use crate::idle::IdleBarrier;
use crate::input::{Injector, KeyInput};
use crate::platform::WindowHandle;

pub const DEFAULT_SCREEN: ScreenSize = ScreenSize::new(1920, 1080);

const SINGLE_CONTROL_FORM: Rect = Rect::new(200, 200, 320, 180);
const SINGLE_CONTROL_BOUNDS: Rect = Rect::new(40, 40, 120, 32);

/// Control placed by `TestHarness::run_single_control_test`
#[derive(Debug, Clone)]
pub enum ControlSpec {
    Button {
        text: String,
        dialog_result: Option<DialogResult>,
    },
    TextBox,
}

/// What `run_form` hands back after the form closed
#[derive(Debug)]
pub struct FormRun<T> {
    pub output: T,
    pub dialog_result: Option<DialogResult>,
}

/// Everything a form driver needs. The driver runs on the UI thread.
#[derive(Clone)]
pub struct FormSession {
    form: FormHandle,
    desktop: SimDesktop,
    dispatcher: Arc<InputDispatcher>,
    idle: IdleBarrier,
    context: Arc<TaskContext>,
}

impl FormSession {
    pub fn form(&self) -> &FormHandle {
        &self.form
    }

    pub fn desktop(&self) -> &SimDesktop {
        &self.desktop
    }

    pub fn dispatcher(&self) -> &Arc<InputDispatcher> {
        &self.dispatcher
    }

    pub fn context(&self) -> &Arc<TaskContext> {
        &self.context
    }

    pub fn window(&self) -> Result<WindowHandle, SimError> {
        self.form.window()?.ok_or(SimError::FormClosed)
    }

    pub async fn wait_for_idle(&self) -> Result<(), SimError> {
        self.idle.wait().await?;
        Ok(())
    }

    pub async fn send<F>(&self, build: F) -> Result<DispatchReport, SimError>
    where
        F: FnOnce(&mut Injector),
    {
        let window = self.window()?;
        Ok(self.dispatcher.send(window, build).await?)
    }

    pub async fn send_keys(&self, keys: &[KeyInput]) -> Result<DispatchReport, SimError> {
        let window = self.window()?;
        Ok(self.dispatcher.send_keys(window, keys).await?)
    }

    pub async fn move_mouse_to(&self, point: ScreenPoint) -> Result<DispatchReport, SimError> {
        let window = self.window()?;
        Ok(self.dispatcher.move_mouse_to(window, point).await?)
    }

    pub async fn move_to_control(&self, id: ControlId) -> Result<DispatchReport, SimError> {
        let window = self.window()?;
        let rect = self.form.control_screen_rect(id)?;
        Ok(self
            .dispatcher
            .move_mouse_to_rect_center(window, rect)
            .await?)
    }

    /// Move to the control's centre and left-click it in one send
    pub async fn click_control(&self, id: ControlId) -> Result<DispatchReport, SimError> {
        let center = self.form.control_screen_rect(id)?.center();
        self.send(|injector| {
            injector.move_mouse_to(center).left_button_click();
        })
        .await
    }
}

/// Per-test fixture: simulated desktop, UI thread, task context,
/// dispatcher and idle barrier.
pub struct TestHarness {
    ui: UiThread,
    host: Arc<dyn UiHost>,
    desktop: SimDesktop,
    toolkit: Toolkit,
    context: Arc<TaskContext>,
    dispatcher: Arc<InputDispatcher>,
    idle: IdleBarrier,
}

impl TestHarness {
    pub fn new() -> Result<Self, SimError> {
        Self::with_config(DEFAULT_SCREEN, &DriveConfig::default())
    }

    pub fn with_config(screen: ScreenSize, config: &DriveConfig) -> Result<Self, SimError> {
        config.validate()?;

        let ui = UiThread::start()?;
        let host = ui.host();
        let desktop = SimDesktop::new(screen);
        let toolkit = Toolkit::new(ui.handle(), desktop.clone());
        let context = Arc::new(TaskContext::new(host.clone()));
        let idle = IdleBarrier::new(host.clone());
        let dispatcher = Arc::new(
            InputDispatcher::new(Arc::new(desktop.clone()), config)
                .with_idle_barrier(idle.clone()),
        );

        info!(event = "core.sim.harness_created", screen = %screen);
        Ok(Self {
            ui,
            host,
            desktop,
            toolkit,
            context,
            dispatcher,
            idle,
        })
    }

    pub fn host(&self) -> &Arc<dyn UiHost> {
        &self.host
    }

    pub fn desktop(&self) -> &SimDesktop {
        &self.desktop
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    pub fn context(&self) -> &Arc<TaskContext> {
        &self.context
    }

    pub fn dispatcher(&self) -> &Arc<InputDispatcher> {
        &self.dispatcher
    }

    pub fn idle(&self) -> &IdleBarrier {
        &self.idle
    }

    pub async fn wait_for_idle(&self) -> Result<(), SimError> {
        self.idle.wait().await?;
        Ok(())
    }

    pub async fn move_mouse_to(
        &self,
        window: WindowHandle,
        point: ScreenPoint,
    ) -> Result<DispatchReport, SimError> {
        Ok(self.dispatcher.move_mouse_to(window, point).await?)
    }

    fn session(&self, form: FormHandle) -> FormSession {
        FormSession {
            form,
            desktop: self.desktop.clone(),
            dispatcher: self.dispatcher.clone(),
            idle: self.idle.clone(),
            context: self.context.clone(),
        }
    }

    /// Show a form as a modal dialog and drive it.
    ///
    /// `create` builds the form on the UI thread. The form is shown with a
    /// nested modal loop; once it is active the driver runs as a UI-thread
    /// task after the loop goes idle. The form is closed afterwards if the
    /// driver left it open.
    pub async fn run_form<C, D, Fut, T>(&self, create: C, driver: D) -> Result<FormRun<T>, SimError>
    where
        C: FnOnce(&Toolkit) -> Result<FormHandle, SimError> + Send + 'static,
        D: FnOnce(FormSession) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SimError>> + Send + 'static,
        T: Send + 'static,
    {
        info!(event = "core.sim.run_form_started");

        let toolkit = self.toolkit.clone();
        let form = self.context.invoke(move || create(&toolkit)).await??;

        let (shown_tx, shown_rx) = oneshot::channel::<()>();
        let (dialog_tx, dialog_rx) = oneshot::channel();
        let dialog = form.clone();
        self.host.post(Box::new(move || {
            if let Err(e) = dialog.show() {
                let _ = dialog_tx.send(Err(e));
                return;
            }
            let _ = shown_tx.send(());
            let _ = dialog_tx.send(dialog.show_dialog());
        }))?;

        let session = self.session(form.clone());
        let context = self.context.clone();
        let driver_task = self.context.spawn(async move {
            shown_rx.await.map_err(|_| SimError::FormClosed)?;
            context.switch_to_ui_thread().await?;
            session.wait_for_idle().await?;
            driver(session).await
        });
        let output = driver_task.await;

        let closer = form.clone();
        if let Err(e) = self.context.invoke(move || closer.close()).await? {
            warn!(event = "core.sim.form_close_failed", error = %e);
        }

        let dialog_result = dialog_rx.await.map_err(|_| BridgeError::TaskDropped)??;
        let output = output??;

        info!(
            event = "core.sim.run_form_completed",
            dialog_result = ?dialog_result
        );
        Ok(FormRun {
            output,
            dialog_result,
        })
    }

    /// Run a driver against a topmost form holding a single control
    pub async fn run_single_control_test<D, Fut, T>(
        &self,
        control: ControlSpec,
        driver: D,
    ) -> Result<FormRun<T>, SimError>
    where
        D: FnOnce(FormSession, ControlId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SimError>> + Send + 'static,
        T: Send + 'static,
    {
        let (id_tx, id_rx) = oneshot::channel();
        let create = move |toolkit: &Toolkit| -> Result<FormHandle, SimError> {
            let form = toolkit.create_form("single control", SINGLE_CONTROL_FORM)?;
            form.set_topmost(true)?;
            let id = match control {
                ControlSpec::Button {
                    text,
                    dialog_result,
                } => form.add_button(text, SINGLE_CONTROL_BOUNDS, dialog_result)?,
                ControlSpec::TextBox => form.add_text_box(SINGLE_CONTROL_BOUNDS)?,
            };
            form.set_focus(id)?;
            let _ = id_tx.send(id);
            Ok(form)
        };

        self.run_form(create, move |session| async move {
            let id = id_rx.await.map_err(|_| BridgeError::TaskDropped)?;
            driver(session, id).await
        })
        .await
    }

    /// Wait for spawned tasks and report inline-resumption violations
    pub async fn close(&self) -> Result<(), SimError> {
        self.context.close().await?;
        Ok(())
    }

    /// Stop the UI thread
    pub fn shutdown(mut self) {
        self.ui.shutdown();
    }
}

impl std::fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("desktop", &self.desktop)
            .field("context", &self.context)
            .finish()
    }
}
