use std::sync::Arc;

use clap::ArgMatches;
use futures::executor::block_on;
use tracing::{error, info, warn};

use uidrive_core::config::DriveConfig;
use uidrive_core::errors::DriveError;
use uidrive_core::events;
use uidrive_core::geometry::normalize_point;
use uidrive_core::input::{KeyInput, parse_button_name, parse_key_name};
use uidrive_core::{
    DispatchReport, InputDispatcher, Platform, ScreenPoint, ScreenSize, WindowHandle,
    default_platform,
};

use crate::selftest;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup(matches.subcommand_name().unwrap_or("none"));

    match matches.subcommand() {
        Some(("move", sub_matches)) => handle_move_command(matches, sub_matches),
        Some(("click", sub_matches)) => handle_click_command(matches, sub_matches),
        Some(("type", sub_matches)) => handle_type_command(matches, sub_matches),
        Some(("key", sub_matches)) => handle_key_command(matches, sub_matches),
        Some(("cursor", sub_matches)) => handle_cursor_command(sub_matches),
        Some(("normalize", sub_matches)) => handle_normalize_command(matches, sub_matches),
        Some(("config", sub_matches)) => handle_config_command(matches, sub_matches),
        Some(("selftest", sub_matches)) => handle_selftest_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

/// Load config, falling back to defaults with a warning when a file is broken.
///
/// `--bias` is applied on top either way.
fn load_config_with_warning(
    matches: &ArgMatches,
) -> Result<DriveConfig, Box<dyn std::error::Error>> {
    let config = match DriveConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.uidrive/config.toml and ./.uidrive/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                error_code = e.error_code(),
                "Config load failed, using defaults"
            );
            DriveConfig::default()
        }
    };
    apply_overrides(config, matches)
}

fn apply_overrides(
    mut config: DriveConfig,
    matches: &ArgMatches,
) -> Result<DriveConfig, Box<dyn std::error::Error>> {
    if let Some(bias) = matches.get_one::<i32>("bias") {
        config.calibration.normalized_bias = Some(*bias);
        if let Err(e) = config.validate() {
            return Err(report_failure("Config", "cli.config.override_rejected", e));
        }
    }
    Ok(config)
}

/// Dispatcher plus the window it targets
struct Target {
    dispatcher: InputDispatcher,
    window: WindowHandle,
}

fn open_target(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<Target, Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let platform = default_platform()?;

    let window = match sub_matches.get_one::<WindowHandle>("hwnd") {
        Some(window) => *window,
        None => platform
            .foreground_window()
            .ok_or("No foreground window to send input to")?,
    };

    info!(
        event = "cli.target_resolved",
        window = %window,
        backend = platform.name()
    );
    Ok(Target {
        dispatcher: InputDispatcher::new(platform, &config),
        window,
    })
}

fn print_report(
    report: &DispatchReport,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Injected {} of {} actions into window {}",
            report.injected, report.actions, report.window
        );
        if !report.foreground_restored {
            println!("  Previous foreground window was not restored");
        }
    }
    Ok(())
}

/// Print and log a failed command, then hand the error back
fn report_failure<E>(action: &str, event: &'static str, e: E) -> Box<dyn std::error::Error>
where
    E: DriveError,
{
    eprintln!("{} failed: {}", action, e);
    error!(event = event, error_code = e.error_code());
    events::log_app_error(&e);
    Box::new(e)
}

fn coordinates(matches: &ArgMatches) -> Result<ScreenPoint, Box<dyn std::error::Error>> {
    let x = matches.get_one::<i32>("x").ok_or("--x is required")?;
    let y = matches.get_one::<i32>("y").ok_or("--y is required")?;
    Ok(ScreenPoint::new(*x, *y))
}

fn handle_move_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let point = coordinates(sub_matches)?;
    let json_output = sub_matches.get_flag("json");

    info!(event = "cli.move_started", x = point.x, y = point.y);

    let target = open_target(matches, sub_matches)?;
    match block_on(target.dispatcher.move_mouse_to(target.window, point)) {
        Ok(report) => {
            print_report(&report, json_output)?;
            info!(event = "cli.move_completed", x = point.x, y = point.y);
            Ok(())
        }
        Err(e) => Err(report_failure("Move", "cli.move_failed", e)),
    }
}

fn handle_click_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let point = coordinates(sub_matches)?;
    let button_name = sub_matches
        .get_one::<String>("button")
        .map(String::as_str)
        .unwrap_or("left");
    let button = parse_button_name(button_name)
        .map_err(|e| report_failure("Click", "cli.click_failed", e))?;
    let double = sub_matches.get_flag("double");
    let json_output = sub_matches.get_flag("json");

    info!(
        event = "cli.click_started",
        x = point.x,
        y = point.y,
        button = %button,
        double = double
    );

    let target = open_target(matches, sub_matches)?;
    let result = block_on(target.dispatcher.send(target.window, |injector| {
        injector.move_mouse_to(point);
        if double {
            injector.double_click(button);
        } else {
            injector.click(button);
        }
    }));

    match result {
        Ok(report) => {
            print_report(&report, json_output)?;
            info!(event = "cli.click_completed", x = point.x, y = point.y);
            Ok(())
        }
        Err(e) => Err(report_failure("Click", "cli.click_failed", e)),
    }
}

fn handle_type_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = sub_matches
        .get_one::<String>("text")
        .ok_or("Text argument is required")?;
    let json_output = sub_matches.get_flag("json");

    info!(event = "cli.type_started", text_len = text.len());

    let target = open_target(matches, sub_matches)?;
    let keys = [KeyInput::from(text.as_str())];
    match block_on(target.dispatcher.send_keys(target.window, &keys)) {
        Ok(report) => {
            print_report(&report, json_output)?;
            info!(event = "cli.type_completed", text_len = text.len());
            Ok(())
        }
        Err(e) => Err(report_failure("Type", "cli.type_failed", e)),
    }
}

fn handle_key_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<&String> = sub_matches
        .get_many::<String>("keys")
        .ok_or("At least one key name is required")?
        .collect();
    let json_output = sub_matches.get_flag("json");

    // Reject unknown names before touching the desktop.
    let keys = names
        .iter()
        .map(|name| parse_key_name(name).map(KeyInput::Key))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| report_failure("Key", "cli.key_failed", e))?;

    info!(event = "cli.key_started", count = keys.len());

    let target = open_target(matches, sub_matches)?;
    match block_on(target.dispatcher.send_keys(target.window, &keys)) {
        Ok(report) => {
            print_report(&report, json_output)?;
            info!(event = "cli.key_completed", count = keys.len());
            Ok(())
        }
        Err(e) => Err(report_failure("Key", "cli.key_failed", e)),
    }
}

fn handle_cursor_command(sub_matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = sub_matches.get_flag("json");

    let platform = default_platform()?;
    match platform.cursor_position() {
        Ok(point) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&point)?);
            } else {
                println!("Cursor: {}", point);
            }
            info!(event = "cli.cursor_completed", x = point.x, y = point.y);
            Ok(())
        }
        Err(e) => Err(report_failure("Cursor query", "cli.cursor_failed", e)),
    }
}

fn handle_normalize_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let point = coordinates(sub_matches)?;
    let json_output = sub_matches.get_flag("json");
    let config = load_config_with_warning(matches)?;
    let bias = config.calibration.normalized_bias();

    let screen = match (
        sub_matches.get_one::<i32>("width"),
        sub_matches.get_one::<i32>("height"),
    ) {
        (Some(width), Some(height)) => ScreenSize::new(*width, *height),
        _ => {
            let platform: Arc<dyn Platform> = default_platform()?;
            platform.screen_resolution()?
        }
    };

    let normalized = match normalize_point(point, screen, bias) {
        Ok(normalized) => normalized,
        Err(e) => return Err(report_failure("Normalize", "cli.normalize_failed", e)),
    };

    if json_output {
        let output = serde_json::json!({
            "screen": screen,
            "point": point,
            "bias": bias,
            "normalized": normalized,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} on {} -> {} (bias {})", point, screen, normalized, bias);
    }

    info!(
        event = "cli.normalize_completed",
        x = normalized.x,
        y = normalized.y
    );
    Ok(())
}

fn handle_config_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = sub_matches.get_flag("json");

    let config = match DriveConfig::load_hierarchy() {
        Ok(config) => apply_overrides(config, matches)?,
        Err(e) => return Err(report_failure("Config load", "cli.config.load_failed", e)),
    };
    let effective = config.resolved();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&effective)?);
    } else {
        print!("{}", toml::to_string_pretty(&effective)?);
    }

    info!(event = "cli.config_completed");
    Ok(())
}

fn handle_selftest_command(sub_matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = sub_matches.get_flag("json");

    info!(event = "cli.selftest_started");

    let results = selftest::run_all();
    let failed = results.iter().filter(|r| !r.passed).count();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            let status = if result.passed { "ok" } else { "FAILED" };
            println!("{:<28} {:<6} {}", result.name, status, result.detail);
        }
        println!();
        println!("{} passed, {} failed", results.len() - failed, failed);
    }

    if failed > 0 {
        error!(event = "cli.selftest_failed", failed = failed);
        return Err(format!("{} selftest scenario(s) failed", failed).into());
    }

    info!(event = "cli.selftest_completed", scenarios = results.len());
    Ok(())
}
