use uidrive_core::init_logging;

mod app;
mod commands;
mod selftest;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = !verbose;
    init_logging(quiet);

    let result = commands::run_command(&matches);
    uidrive_core::events::log_app_shutdown(result.is_ok());
    result
}
