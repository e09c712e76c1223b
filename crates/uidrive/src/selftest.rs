//! Built-in dialog scenarios run against the simulated desktop.
//!
//! Each scenario starts its own harness, so a failure in one cannot leave
//! state behind for the next.

use std::error::Error;

use futures::executor::block_on;
use serde::Serialize;
use tracing::{error, info};

use uidrive_core::Rect;
use uidrive_core::input::{KeyInput, VirtualKey};
use uidrive_core::sim::{ControlId, DialogResult, FormHandle, SimError, TestHarness, Toolkit};

type Scenario = fn() -> Result<String, Box<dyn Error>>;

const SCENARIOS: &[(&str, Scenario)] = &[
    ("idle_without_windows", idle_without_windows),
    ("default_button_click", default_button_click),
    ("escape_cancels", escape_cancels),
    ("drag_off_cancels_click", drag_off_cancels_click),
];

const OK_BUTTON: ControlId = ControlId(0);
const LEFT_BUTTON: ControlId = ControlId(0);
const RIGHT_BUTTON: ControlId = ControlId(1);

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

pub fn run_all() -> Vec<ScenarioResult> {
    SCENARIOS
        .iter()
        .map(|&(name, scenario)| run_scenario(name, scenario))
        .collect()
}

fn run_scenario(name: &'static str, scenario: Scenario) -> ScenarioResult {
    info!(event = "cli.selftest.scenario_started", scenario = name);

    match scenario() {
        Ok(detail) => {
            info!(event = "cli.selftest.scenario_completed", scenario = name);
            ScenarioResult {
                name,
                passed: true,
                detail,
            }
        }
        Err(e) => {
            error!(
                event = "cli.selftest.scenario_failed",
                scenario = name,
                error = %e
            );
            ScenarioResult {
                name,
                passed: false,
                detail: e.to_string(),
            }
        }
    }
}

fn ok_cancel_dialog(toolkit: &Toolkit) -> Result<FormHandle, SimError> {
    let form = toolkit.create_form("selftest dialog", Rect::new(300, 300, 360, 160))?;
    let ok = form.add_button("OK", Rect::new(60, 100, 100, 32), Some(DialogResult::Ok))?;
    let cancel = form.add_button(
        "Cancel",
        Rect::new(200, 100, 100, 32),
        Some(DialogResult::Cancel),
    )?;
    form.set_accept_button(ok)?;
    form.set_cancel_button(cancel)?;
    form.set_focus(ok)?;
    Ok(form)
}

fn two_button_form(toolkit: &Toolkit) -> Result<FormHandle, SimError> {
    let form = toolkit.create_form("selftest buttons", Rect::new(100, 100, 400, 200))?;
    form.add_button("Left", Rect::new(20, 20, 100, 40), None)?;
    form.add_button("Right", Rect::new(200, 20, 100, 40), None)?;
    Ok(form)
}

fn expect_result(
    actual: Option<DialogResult>,
    expected: DialogResult,
) -> Result<String, Box<dyn Error>> {
    if actual == Some(expected) {
        Ok(format!("dialog result {:?}", expected))
    } else {
        Err(format!("expected dialog result {:?}, got {:?}", expected, actual).into())
    }
}

fn idle_without_windows() -> Result<String, Box<dyn Error>> {
    let harness = TestHarness::new()?;
    block_on(harness.wait_for_idle())?;
    Ok("resolved with no open windows".to_string())
}

fn default_button_click() -> Result<String, Box<dyn Error>> {
    let harness = TestHarness::new()?;
    let run = block_on(harness.run_form(ok_cancel_dialog, |session| async move {
        session.click_control(OK_BUTTON).await?;
        session.form().is_open()
    }))?;
    block_on(harness.close())?;

    if run.output {
        return Err("form still open after clicking OK".into());
    }
    expect_result(run.dialog_result, DialogResult::Ok)
}

fn escape_cancels() -> Result<String, Box<dyn Error>> {
    let harness = TestHarness::new()?;
    let run = block_on(harness.run_form(ok_cancel_dialog, |session| async move {
        session
            .send_keys(&[KeyInput::from(VirtualKey::Escape)])
            .await?;
        session.form().is_open()
    }))?;
    block_on(harness.close())?;

    if run.output {
        return Err("form still open after Escape".into());
    }
    expect_result(run.dialog_result, DialogResult::Cancel)
}

fn drag_off_cancels_click() -> Result<String, Box<dyn Error>> {
    let harness = TestHarness::new()?;
    let run = block_on(harness.run_form(two_button_form, |session| async move {
        let form = session.form().clone();
        let left = form.control_screen_rect(LEFT_BUTTON)?.center();
        let right = form.control_screen_rect(RIGHT_BUTTON)?.center();

        session
            .send(|injector| {
                injector
                    .move_mouse_to(left)
                    .left_button_down()
                    .move_mouse_to(right)
                    .left_button_up();
            })
            .await?;
        let dragged = (form.click_count(LEFT_BUTTON)?, form.click_count(RIGHT_BUTTON)?);

        session.click_control(LEFT_BUTTON).await?;
        let clicked = (form.click_count(LEFT_BUTTON)?, form.click_count(RIGHT_BUTTON)?);
        Ok((dragged, clicked))
    }))?;
    block_on(harness.close())?;

    match run.output {
        ((0, 0), (1, 0)) => Ok("drag-off ignored, direct click counted once".to_string()),
        (dragged, clicked) => Err(format!(
            "unexpected click counts: after drag {:?}, after click {:?}",
            dragged, clicked
        )
        .into()),
    }
}
