//! Integration tests for the input dispatcher against the simulated desktop.
//!
//! These tests build a desktop with plain recording windows (no UI thread)
//! and drive it through `InputDispatcher` exactly as a test would drive a
//! real desktop.

use std::sync::Arc;
use std::time::Duration;

use uidrive_core::dispatch::DispatchSettings;
use uidrive_core::input::{KeyInput, MouseButton, VirtualKey};
use uidrive_core::platform::PlatformError;
use uidrive_core::sim::{RecordingSink, SimDesktop, WindowEvent};
use uidrive_core::{
    DispatchError, DriveConfig, InputDispatcher, Rect, ScreenPoint, ScreenSize, WindowHandle,
};

struct Fixture {
    desktop: SimDesktop,
    dispatcher: InputDispatcher,
    front: WindowHandle,
    front_events: Arc<RecordingSink>,
    back: WindowHandle,
    back_events: Arc<RecordingSink>,
}

/// Two side-by-side windows; `front` is the foreground window.
fn fixture_with(settings: DispatchSettings) -> Fixture {
    let desktop = SimDesktop::new(ScreenSize::new(1920, 1080));
    let front_events = Arc::new(RecordingSink::default());
    let back_events = Arc::new(RecordingSink::default());
    let back = desktop.create_window(Rect::new(900, 100, 300, 300), back_events.clone());
    let front = desktop.create_window(Rect::new(100, 100, 400, 300), front_events.clone());
    assert!(desktop.activate_window(front));

    let dispatcher = InputDispatcher::with_settings(Arc::new(desktop.clone()), settings);
    Fixture {
        desktop,
        dispatcher,
        front,
        front_events,
        back,
        back_events,
    }
}

fn fixture() -> Fixture {
    fixture_with(DispatchSettings::default())
}

fn mouse_events(sink: &RecordingSink) -> Vec<WindowEvent> {
    sink.events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                WindowEvent::MouseDown { .. } | WindowEvent::MouseUp { .. }
            )
        })
        .collect()
}

#[tokio::test]
async fn test_send_moves_cursor_and_clicks() {
    let f = fixture();
    let target = ScreenPoint::new(300, 250);

    let report = f
        .dispatcher
        .send(f.front, |injector| {
            injector.move_mouse_to(target).left_button_click();
        })
        .await
        .unwrap();

    assert_eq!(report.window, f.front);
    assert_eq!(report.actions, 3);
    assert_eq!(report.injected, 3);
    assert!(report.foreground_restored);
    assert!(!report.waited_for_idle);
    assert_eq!(f.desktop.cursor(), target);
    assert_eq!(
        mouse_events(&f.front_events),
        vec![
            WindowEvent::MouseDown {
                button: MouseButton::Left,
                point: target
            },
            WindowEvent::MouseUp {
                button: MouseButton::Left,
                point: target
            },
        ]
    );
}

#[tokio::test]
async fn test_window_is_demoted_after_activation() {
    let f = fixture();

    f.dispatcher
        .send(f.front, |injector| {
            injector.key_press(VirtualKey::Tab);
        })
        .await
        .unwrap();

    assert!(!f.desktop.is_topmost(f.front));
    assert_eq!(f.desktop.active_window(), Some(f.front));
    assert_eq!(f.desktop.focus_window(), Some(f.front));
}

#[tokio::test]
async fn test_foreground_restored_after_click_into_background_window() {
    let f = fixture();
    let inside_back = ScreenPoint::new(1000, 200);

    let report = f
        .dispatcher
        .send(f.front, |injector| {
            injector.move_mouse_to(inside_back).left_button_click();
        })
        .await
        .unwrap();

    // The click activated the back window; the dispatcher put the front one back.
    assert_eq!(mouse_events(&f.back_events).len(), 2);
    assert!(f.back_events.events().contains(&WindowEvent::Activated));
    assert!(report.foreground_restored);
    assert_eq!(f.desktop.active_window(), Some(f.front));
}

#[tokio::test]
async fn test_foreground_restored_when_injection_is_blocked() {
    let f = fixture();
    f.desktop.fail_injection_after(Some(2));

    let err = f
        .dispatcher
        .send(f.front, |injector| {
            injector
                .move_mouse_to(ScreenPoint::new(1000, 200))
                .left_button_click();
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Platform(PlatformError::InputBlocked {
            inserted: 2,
            requested: 3
        })
    ));
    assert_eq!(f.desktop.injected_count(), 2);
    assert_eq!(f.desktop.active_window(), Some(f.front));
}

#[tokio::test]
async fn test_background_target_is_unsupported() {
    let f = fixture();

    let err = f
        .dispatcher
        .send(f.back, |injector| {
            injector.key_press(VirtualKey::Return);
        })
        .await
        .unwrap_err();

    match err {
        DispatchError::Unsupported { window, foreground } => {
            assert_eq!(window, f.back);
            assert_eq!(foreground, f.front);
        }
        other => panic!("expected Unsupported, got {other:?}"),
    }
    assert_eq!(f.desktop.injected_count(), 0);
    assert_eq!(f.desktop.active_window(), Some(f.front));
}

#[tokio::test]
async fn test_refused_foreground_is_reported() {
    let f = fixture();
    f.desktop.set_refuse_foreground(true);

    let err = f
        .dispatcher
        .send(f.front, |injector| {
            injector.key_press(VirtualKey::Return);
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::FocusRejected { window } if window == f.front));
    assert!(!f.desktop.is_topmost(f.front));
    assert_eq!(f.desktop.injected_count(), 0);
}

#[tokio::test]
async fn test_closed_and_hidden_windows_are_rejected() {
    let f = fixture();

    f.desktop.set_window_visible(f.back, false);
    let hidden = f
        .dispatcher
        .send(f.back, |injector| {
            injector.key_press(VirtualKey::Tab);
        })
        .await
        .unwrap_err();
    assert!(matches!(hidden, DispatchError::InvalidArgument { .. }));

    assert!(f.desktop.destroy_window(f.back));
    let closed = f
        .dispatcher
        .send(f.back, |injector| {
            injector.key_press(VirtualKey::Tab);
        })
        .await
        .unwrap_err();
    assert!(matches!(closed, DispatchError::InvalidArgument { .. }));
}

#[tokio::test]
async fn test_empty_sequence_is_rejected_before_activation() {
    let f = fixture();

    let err = f.dispatcher.send(f.front, |_| {}).await.unwrap_err();

    assert!(matches!(err, DispatchError::InvalidArgument { .. }));
    assert_eq!(f.desktop.injected_count(), 0);
}

#[tokio::test]
async fn test_transient_missing_foreground_is_retried() {
    let settings = DispatchSettings {
        foreground_poll_attempts: 3,
        foreground_poll_interval: Duration::from_millis(1),
        ..DispatchSettings::default()
    };

    let f = fixture_with(settings);
    f.desktop.set_missing_foreground_reads(2);
    f.dispatcher
        .send(f.front, |injector| {
            injector.key_press(VirtualKey::Tab);
        })
        .await
        .unwrap();

    f.desktop.set_missing_foreground_reads(3);
    let err = f
        .dispatcher
        .send(f.front, |injector| {
            injector.key_press(VirtualKey::Tab);
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::NoForegroundWindow { attempts: 3 }
    ));
}

#[tokio::test]
async fn test_cursor_read_back_tolerates_one_stale_read() {
    let f = fixture();
    f.desktop.set_cursor(ScreenPoint::new(5, 5));
    f.desktop.set_cursor_report_lag(1);

    let target = ScreenPoint::new(250, 200);
    f.dispatcher.move_mouse_to(f.front, target).await.unwrap();

    assert_eq!(f.desktop.cursor(), target);
}

#[tokio::test]
async fn test_cursor_mismatch_after_retries() {
    let f = fixture();
    let start = ScreenPoint::new(5, 5);
    f.desktop.set_cursor(start);
    f.desktop.set_cursor_report_lag(2);

    let target = ScreenPoint::new(250, 200);
    let err = f
        .dispatcher
        .move_mouse_to(f.front, target)
        .await
        .unwrap_err();

    match err {
        DispatchError::CursorMismatch { expected, actual } => {
            assert_eq!(expected, target);
            assert_eq!(actual, start);
        }
        other => panic!("expected CursorMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_move_to_rect_center() {
    let f = fixture();

    f.dispatcher
        .move_mouse_to_rect_center(f.front, Rect::new(120, 140, 61, 41))
        .await
        .unwrap();

    assert_eq!(f.desktop.cursor(), ScreenPoint::new(150, 160));
}

#[tokio::test]
async fn test_send_keys_types_text_and_line_breaks() {
    let f = fixture();

    f.dispatcher
        .send_keys(
            f.front,
            &[KeyInput::from("ab\ncd"), KeyInput::from(VirtualKey::Tab)],
        )
        .await
        .unwrap();

    let typed: Vec<WindowEvent> = f
        .front_events
        .events()
        .into_iter()
        .filter(|e| !matches!(e, WindowEvent::Activated | WindowEvent::Deactivated))
        .collect();
    assert_eq!(
        typed,
        vec![
            WindowEvent::Char { ch: 'a' },
            WindowEvent::Char { ch: 'b' },
            WindowEvent::KeyDown {
                key: VirtualKey::Return
            },
            WindowEvent::KeyUp {
                key: VirtualKey::Return
            },
            WindowEvent::Char { ch: 'c' },
            WindowEvent::Char { ch: 'd' },
            WindowEvent::KeyDown {
                key: VirtualKey::Tab
            },
            WindowEvent::KeyUp {
                key: VirtualKey::Tab
            },
        ]
    );
    assert!(f.back_events.events().is_empty());
}

#[tokio::test]
async fn test_absolute_moves_land_on_exact_pixel_across_resolutions() {
    for (width, height) in [(1024, 768), (1366, 768), (1920, 1080), (2560, 1440), (3840, 2160)] {
        let desktop = SimDesktop::new(ScreenSize::new(width, height));
        let window =
            desktop.create_window(Rect::new(0, 0, width, height), Arc::new(RecordingSink::default()));
        assert!(desktop.activate_window(window));
        let dispatcher = InputDispatcher::new(Arc::new(desktop.clone()), &DriveConfig::default());

        let points = [
            ScreenPoint::new(0, 0),
            ScreenPoint::new(1, 1),
            ScreenPoint::new(width / 3, height / 7),
            ScreenPoint::new(width / 2, height / 2),
            ScreenPoint::new(width - 1, height - 1),
        ];
        for point in points {
            dispatcher.move_mouse_to(window, point).await.unwrap();
            assert_eq!(desktop.cursor(), point, "screen {width}x{height}");
        }
    }
}
