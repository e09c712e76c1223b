use clap::{Arg, ArgAction, Command};
use uidrive_core::WindowHandle;

pub fn build_cli() -> Command {
    Command::new("uidrive")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drive desktop windows with injected mouse and keyboard input")
        .long_about(
            "uidrive forces a window into the foreground, injects synthesized mouse and \
             keyboard input into it and restores the previous foreground window. The \
             selftest command exercises the idle bridge against a simulated desktop.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("bias")
                .long("bias")
                .help("Override the normalized coordinate bias from config")
                .value_parser(clap::value_parser!(i32))
                .allow_negative_numbers(true)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        // Move subcommand
        .subcommand(
            Command::new("move")
                .about("Move the cursor to a screen position and verify it arrived")
                .arg(coordinate_arg("x"))
                .arg(coordinate_arg("y"))
                .arg(hwnd_arg())
                .arg(json_arg()),
        )
        // Click subcommand
        .subcommand(
            Command::new("click")
                .about("Move to a screen position and click")
                .arg(coordinate_arg("x"))
                .arg(coordinate_arg("y"))
                .arg(
                    Arg::new("button")
                        .long("button")
                        .short('b')
                        .help("Mouse button: left, right or middle")
                        .default_value("left"),
                )
                .arg(
                    Arg::new("double")
                        .long("double")
                        .help("Double-click instead of a single click")
                        .action(ArgAction::SetTrue),
                )
                .arg(hwnd_arg())
                .arg(json_arg()),
        )
        // Type subcommand
        .subcommand(
            Command::new("type")
                .about("Type text; line breaks become Return presses")
                .arg(
                    Arg::new("text")
                        .help("Text to type")
                        .required(true)
                        .index(1),
                )
                .arg(hwnd_arg())
                .arg(json_arg()),
        )
        // Key subcommand
        .subcommand(
            Command::new("key")
                .about("Press named keys in order (e.g. enter, esc, tab, f5)")
                .arg(
                    Arg::new("keys")
                        .help("Key names")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(hwnd_arg())
                .arg(json_arg()),
        )
        // Cursor subcommand
        .subcommand(
            Command::new("cursor")
                .about("Print the current cursor position")
                .arg(json_arg()),
        )
        // Normalize subcommand
        .subcommand(
            Command::new("normalize")
                .about("Convert a screen position into normalized injection coordinates")
                .arg(coordinate_arg("x"))
                .arg(coordinate_arg("y"))
                .arg(
                    Arg::new("width")
                        .long("width")
                        .help("Screen width in pixels (default: primary display)")
                        .value_parser(clap::value_parser!(i32))
                        .requires("height"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .help("Screen height in pixels (default: primary display)")
                        .value_parser(clap::value_parser!(i32))
                        .requires("width"),
                )
                .arg(json_arg()),
        )
        // Config subcommand
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(json_arg()),
        )
        // Selftest subcommand
        .subcommand(
            Command::new("selftest")
                .about("Run the built-in dialog scenarios against a simulated desktop")
                .arg(json_arg()),
        )
}

fn coordinate_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(format!("Screen {} coordinate in pixels", name))
        .required(true)
        .value_parser(clap::value_parser!(i32))
        .allow_negative_numbers(true)
}

fn hwnd_arg() -> Arg {
    Arg::new("hwnd")
        .long("hwnd")
        .help("Target window handle, decimal or 0x-prefixed hex (default: foreground window)")
        .value_parser(parse_window_handle)
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

fn parse_window_handle(value: &str) -> Result<WindowHandle, String> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };

    match parsed {
        Ok(0) => Err("window handle must not be 0".to_string()),
        Ok(raw) => Ok(WindowHandle(raw)),
        Err(e) => Err(format!("invalid window handle '{}': {}", value, e)),
    }
}
