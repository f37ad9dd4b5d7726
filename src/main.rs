//! tandem - a dual-pane terminal file commander.
//!
//! Usage:
//!   tandem                     Open both panels at the configured paths
//!   tandem LEFT [RIGHT]        Open the given directories
//!   tandem --theme solarized   Override the configured theme
//!   tandem --help              Show help

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Context, Result};
use tracing_subscriber::EnvFilter;

use tandem_core::config::Config;

#[derive(Parser)]
#[command(
    name = "tandem",
    version,
    about = "A dual-pane terminal file commander",
    long_about = "tandem shows two directory panels side by side and drives\n\
                  bulk file operations from the keyboard, in the lineage of\n\
                  the classic orthodox file managers."
)]
struct Cli {
    /// Start directory for the left panel
    left: Option<PathBuf>,

    /// Start directory for the right panel
    right: Option<PathBuf>,

    /// Theme id to use for this session (e.g. norton_commander)
    #[arg(short, long)]
    theme: Option<String>,

    /// Show hidden files regardless of the configured default
    #[arg(short = 'H', long)]
    hidden: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let data_dir = Config::data_dir().context("no usable data directory")?;
    let _log_guard = init_logging(&data_dir)?;

    let mut loaded = Config::load().context("configuration is unusable")?;

    if let Some(left) = cli.left {
        let left = left
            .canonicalize()
            .with_context(|| format!("invalid left path {}", left.display()))?;
        if !left.is_dir() {
            return Err(eyre!("{} is not a directory", left.display()));
        }
        loaded.config.panels.left.start_path = Some(left);
    }
    if let Some(right) = cli.right {
        let right = right
            .canonicalize()
            .with_context(|| format!("invalid right path {}", right.display()))?;
        if !right.is_dir() {
            return Err(eyre!("{} is not a directory", right.display()));
        }
        loaded.config.panels.right.start_path = Some(right);
    }
    if let Some(theme) = cli.theme {
        if !tandem_core::theme::is_valid_theme_id(&theme) {
            return Err(eyre!("'{theme}' is not a valid theme id"));
        }
        loaded.config.theme.current = theme;
    }
    if cli.hidden {
        loaded.config.general.show_hidden = true;
    }

    let themes_dir = Config::config_dir()
        .context("no usable config directory")?
        .join("themes");

    tandem_tui::run(loaded, themes_dir, data_dir).context("terminal session failed")
}

/// Log to a rotating file under the data directory; stderr belongs to the
/// terminal UI.
fn init_logging(data_dir: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create {}", data_dir.display()))?;

    let appender = tracing_appender::rolling::daily(data_dir.join("logs"), "tandem.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
