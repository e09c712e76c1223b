//! Integration tests for uidrive CLI output behavior
//!
//! The default behavior is quiet (no logs). Use -v/--verbose to enable logs.
//! Only commands that do not touch the real desktop are exercised here.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run uidrive with `dir` as both home and working directory so no real
/// config file is picked up
fn run_uidrive(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_uidrive"))
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute 'uidrive {}': {}", args.join(" "), e))
}

fn run_uidrive_ok(dir: &Path, args: &[&str]) -> Output {
    let output = run_uidrive(dir, args);
    assert!(
        output.status.success(),
        "uidrive {} failed with exit code {:?}. stderr: {}",
        args.join(" "),
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn write_project_config(dir: &Path, contents: &str) {
    let config_dir = dir.join(".uidrive");
    fs::create_dir_all(&config_dir).expect("Failed to create .uidrive dir");
    fs::write(config_dir.join("config.toml"), contents).expect("Failed to write config");
}

// =============================================================================
// Default Mode (Quiet) Behavioral Tests
// =============================================================================

/// Verify that default mode (no flags) suppresses INFO-level logs
#[test]
fn test_default_mode_suppresses_info_logs() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(temp_dir.path(), &["selftest"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains(r#""level":"INFO""#),
        "Default mode should suppress INFO logs, but stderr contains: {}",
        stderr
    );
    assert!(
        !stderr.contains(r#""level":"DEBUG""#),
        "Default mode should suppress DEBUG logs, but stderr contains: {}",
        stderr
    );
}

/// Verify that -v emits structured JSON logs on stderr
#[test]
fn test_verbose_mode_emits_json_logs() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(temp_dir.path(), &["-v", "selftest"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(r#""level":"INFO""#),
        "Verbose mode should emit INFO logs, got: {}",
        stderr
    );
    assert!(
        stderr.contains("core.app.startup_completed"),
        "Verbose mode should log the startup event, got: {}",
        stderr
    );

    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        assert!(
            serde_json::from_str::<serde_json::Value>(line).is_ok(),
            "Log line is not JSON: {}",
            line
        );
    }
}

// =============================================================================
// Command Output Tests
// =============================================================================

#[test]
fn test_selftest_json_reports_every_scenario() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(temp_dir.path(), &["selftest", "--json"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let results: serde_json::Value =
        serde_json::from_str(&stdout).expect("selftest --json should print JSON");
    let results = results.as_array().expect("selftest --json should print an array");

    let names: Vec<&str> = results
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "idle_without_windows",
            "default_button_click",
            "escape_cancels",
            "drag_off_cancels_click"
        ]
    );
    assert!(results.iter().all(|r| r["passed"] == serde_json::Value::Bool(true)));
}

#[test]
fn test_normalize_with_explicit_resolution() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(
        temp_dir.path(),
        &[
            "normalize", "--x", "100", "--y", "100", "--width", "1920", "--height", "1080",
            "--json",
        ],
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["bias"], 1);
    assert_eq!(value["normalized"]["x"], 3414);
    assert_eq!(value["normalized"]["y"], 6069);
}

#[test]
fn test_normalize_bias_override() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(
        temp_dir.path(),
        &[
            "normalize", "--x", "100", "--y", "100", "--width", "1920", "--height", "1080",
            "--bias", "0", "--json",
        ],
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["normalized"]["x"], 3413);
}

#[test]
fn test_config_prints_effective_defaults() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive_ok(temp_dir.path(), &["config"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[calibration]"), "stdout: {}", stdout);
    assert!(stdout.contains("normalized_bias = 1"), "stdout: {}", stdout);
    assert!(stdout.contains("cursor_retry_delay_ms = 15"), "stdout: {}", stdout);
    assert!(stdout.contains("[focus]"), "stdout: {}", stdout);
    assert!(stdout.contains("foreground_poll_attempts = 100"), "stdout: {}", stdout);
}

#[test]
fn test_config_applies_project_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_project_config(
        temp_dir.path(),
        r#"
[calibration]
cursor_retry_delay_ms = 40
"#,
    );

    let output = run_uidrive_ok(temp_dir.path(), &["config", "--json"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["calibration"]["cursor_retry_delay_ms"], 40);
    assert_eq!(value["calibration"]["normalized_bias"], 1);
}

#[test]
fn test_config_rejects_out_of_range_bias() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive(temp_dir.path(), &["config", "--bias", "99"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid configuration"),
        "Expected validation error, got: {}",
        stderr
    );
}

// =============================================================================
// Config Warning Tests
// =============================================================================

#[test]
fn test_config_warning_on_invalid_toml() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_project_config(temp_dir.path(), "invalid toml [[[");

    // normalize loads config with a fallback, so it still succeeds.
    let output = run_uidrive_ok(
        temp_dir.path(),
        &[
            "normalize", "--x", "1", "--y", "1", "--width", "800", "--height", "600",
        ],
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Warning: Could not load config"),
        "Expected warning in stderr, got: {}",
        stderr
    );
    assert!(
        stderr.contains("Tip: Check"),
        "Expected tip about config files in stderr, got: {}",
        stderr
    );
}

#[test]
fn test_config_command_fails_on_invalid_toml() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_project_config(temp_dir.path(), "invalid toml [[[");

    let output = run_uidrive(temp_dir.path(), &["config"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config load failed"),
        "Expected config load failure, got: {}",
        stderr
    );
}

#[test]
fn test_unknown_key_name_fails_before_injection() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_uidrive(temp_dir.path(), &["key", "tab", "notakey"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown key name: 'notakey'"),
        "Expected unknown key error, got: {}",
        stderr
    );
}
