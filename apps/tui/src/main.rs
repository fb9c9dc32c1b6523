//! sitegen TUI: fill in the new-site form and watch it being provisioned.
//!
//! Built with `ratatui` + `crossterm`. Provisioning runs on a tokio runtime
//! in the background while the UI thread redraws.

mod app;
mod run;
mod screens;
mod widgets;

use color_eyre::eyre::Result;
use sitegen_shared::config_dir;

/// Log file under the config directory; the terminal belongs to the UI.
const LOG_FILE: &str = "sitegen-tui.log";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();
    app::run()
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let Ok(dir) = config_dir() else { return };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
    else {
        return;
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitegen=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
}
