//! Terminal user interface for tandem.
//!
//! Two directory panels side by side, a keyboard-driven dispatcher, modal
//! dialogs for confirmations and progress, and an async shell that keeps
//! the screen responsive while bulk operations run.

pub mod action;
pub mod app;
mod dialog;
mod keymap;
mod menu;
mod panel;
mod theme;
mod ui;

pub use app::{App, AppResult};

use std::path::PathBuf;

use tandem_core::config::LoadedConfig;

/// Run the full-screen application until the user quits.
///
/// `themes_dir` and `data_dir` come from the binary's directory probing so
/// tests can substitute temp paths.
pub fn run(loaded: LoadedConfig, themes_dir: PathBuf, data_dir: PathBuf) -> AppResult<()> {
    let rt = tokio::runtime::Runtime::new()?;

    let terminal = ratatui::init();
    let result = rt.block_on(App::new(loaded, themes_dir, data_dir).run(terminal));
    ratatui::restore();

    // Cut background tasks loose once the UI is gone.
    rt.shutdown_timeout(std::time::Duration::from_millis(200));

    result
}
