//! Integration tests for the task context and the idle barrier on a real
//! UI thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use uidrive_core::context::ContextMode;
use uidrive_core::sim::{TestHarness, UiThread};
use uidrive_core::{BridgeError, IdleError, TaskContext, UiHost, wait_for_idle};

#[tokio::test]
async fn test_context_created_off_ui_thread_denies_inline() {
    let harness = TestHarness::new().unwrap();
    assert_eq!(harness.context().mode(), ContextMode::DenyInline);
    assert!(!harness.context().is_ui_thread());
}

#[tokio::test]
async fn test_switch_inside_spawned_task_lands_on_ui_thread() {
    let harness = TestHarness::new().unwrap();
    let context = harness.context().clone();

    let on_ui = harness
        .context()
        .spawn(async move {
            context.switch_to_ui_thread().await?;
            Ok::<_, BridgeError>(context.is_ui_thread())
        })
        .await
        .unwrap()
        .unwrap();

    assert!(on_ui);
    harness.close().await.unwrap();
}

#[tokio::test]
async fn test_switch_from_foreign_executor_is_reported() {
    let harness = TestHarness::new().unwrap();

    let err = harness.context().switch_to_ui_thread().await.unwrap_err();
    assert_eq!(err, BridgeError::InlineResumption);
    assert_eq!(harness.context().violation_count(), 1);

    // The violation also fails the end-of-test check.
    assert_eq!(
        harness.close().await.unwrap_err().to_string(),
        BridgeError::InlineResumption.to_string()
    );
}

#[tokio::test]
async fn test_invoke_runs_on_ui_thread() {
    let harness = TestHarness::new().unwrap();
    let host = harness.host().clone();

    let on_ui = harness
        .context()
        .invoke(move || host.is_ui_thread())
        .await
        .unwrap();

    assert!(on_ui);
}

#[tokio::test]
async fn test_close_waits_for_spawned_tasks() {
    let harness = TestHarness::new().unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    for _ in 0..4 {
        let finished = finished.clone();
        let context = harness.context().clone();
        let _ = harness.context().spawn(async move {
            uidrive_core::context::delay(std::time::Duration::from_millis(10)).await;
            let _ = context.switch_to_ui_thread().await;
            finished.fetch_add(1, Ordering::SeqCst);
        });
    }

    harness.close().await.unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 4);
}

async fn failing_driver() {
    panic!("driver failed");
}

#[tokio::test]
async fn test_panicking_task_reports_task_dropped() {
    let harness = TestHarness::new().unwrap();

    let result = harness
        .context()
        .spawn(failing_driver())
        .await;

    assert_eq!(result, Err(BridgeError::TaskDropped));

    // The loop keeps running after the panic.
    let host = harness.host().clone();
    assert!(harness.context().invoke(move || host.is_ui_thread()).await.unwrap());
}

#[tokio::test]
async fn test_wait_for_idle_without_windows_resolves() {
    let harness = TestHarness::new().unwrap();
    harness.wait_for_idle().await.unwrap();
    wait_for_idle(harness.host()).await.unwrap();
}

#[tokio::test]
async fn test_wait_for_idle_after_loop_closed_fails() {
    let mut ui = UiThread::start().unwrap();
    let host = ui.host();
    ui.shutdown();

    let err = wait_for_idle(&host).await.unwrap_err();
    assert!(matches!(err, IdleError::LoopClosed));
}

#[tokio::test]
async fn test_context_on_closed_loop_reports_loop_closed() {
    let mut ui = UiThread::start().unwrap();
    let context = TaskContext::new(ui.host());
    ui.shutdown();

    let err = context.invoke(|| ()).await.unwrap_err();
    assert_eq!(err, BridgeError::LoopClosed);

    let spawned = context.spawn(async { 1 }).await;
    assert_eq!(spawned, Err(BridgeError::TaskDropped));
}
