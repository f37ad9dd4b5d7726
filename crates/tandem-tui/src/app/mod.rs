//! The application shell: construction, event loop, rendering.

mod actions;
mod input;
mod navigation;
mod operations;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tandem_core::cache::DirCache;
use tandem_core::config::{Config, LoadedConfig};
use tandem_core::theme::ThemeStore;
use tandem_fs::FindEvent;
use tandem_ops::{
    CommandHistory, CommandRecord, OperationEvent, Pipeline, PipelineConfig, StagingArea,
};

use crate::action::Dirty;
use crate::dialog::DialogStack;
use crate::keymap::Keymap;
use crate::panel::{PanelState, Side};
use crate::theme::UiTheme;
use crate::ui;

/// Application result type.
pub type AppResult<T> = color_eyre::Result<T>;

/// Event-loop tick interval.
const TICK_INTERVAL_MS: u64 = 250;

/// Result cap handed to the find dialog.
pub(crate) const FIND_MAX_RESULTS: usize = 1000;

/// Why the current operation was started, deciding what happens to the
/// history when it completes.
#[derive(Debug)]
pub(crate) enum OpOrigin {
    /// A fresh user command; a summary with undo data is recorded.
    Command,
    /// An undo run; on success the record parks on the redo stack.
    Undo(CommandRecord),
    /// A redo run; on success the record returns to the undo stack.
    Redo(CommandRecord),
}

/// The composed application.
pub struct App {
    pub(crate) config: Config,
    pub(crate) config_dirty: bool,
    pub(crate) theme_store: ThemeStore,
    pub(crate) theme: UiTheme,
    pub(crate) cache: DirCache,
    pub(crate) left: PanelState,
    pub(crate) right: PanelState,
    pub(crate) keymap: Keymap,
    pub(crate) history: CommandHistory,
    pub(crate) pipeline: Pipeline,
    pub(crate) dialogs: DialogStack,

    pub(crate) op_rx: Option<mpsc::Receiver<OperationEvent>>,
    pub(crate) op_cancel: Option<CancellationToken>,
    pub(crate) op_origin: OpOrigin,
    pub(crate) find_rx: Option<mpsc::Receiver<FindEvent>>,
    pub(crate) find_cancel: Option<CancellationToken>,

    /// Status-line message; `true` marks it as an error.
    pub(crate) status: Option<(bool, String)>,
    pub(crate) dirty: Dirty,
    pub(crate) running: bool,
    /// Visible rows in a panel, captured at render time for paging.
    pub(crate) panel_rows: usize,
}

impl App {
    /// Wire the application together from a loaded configuration.
    pub fn new(loaded: LoadedConfig, themes_dir: PathBuf, data_dir: PathBuf) -> Self {
        let LoadedConfig { config, warning } = loaded;

        let theme_store = ThemeStore::open(themes_dir);
        let active_theme = theme_store
            .get(&config.theme.current)
            .cloned()
            .unwrap_or_else(|| {
                warn!(id = %config.theme.current, "configured theme missing, using default");
                tandem_core::theme::Theme::norton_commander()
            });
        let theme = UiTheme::from_theme(&active_theme);

        let cache = DirCache::new(
            config.cache.max_entries,
            Duration::from_secs(config.cache.ttl_seconds),
        );

        let staging = StagingArea::new(&data_dir);
        staging.prune();
        let pipeline = Pipeline::new(PipelineConfig::default(), staging);

        let fallback = config
            .general
            .start_path
            .clone()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("/"));
        let left_start = config
            .panels
            .left
            .start_path
            .clone()
            .unwrap_or_else(|| fallback.clone());
        let right_start = config
            .panels
            .right
            .start_path
            .clone()
            .unwrap_or(fallback);

        let mut left = PanelState::new(
            left_start,
            config.panels.left.sort_spec(),
            config.panels.left.view_mode,
        );
        left.active = true;
        let right = PanelState::new(
            right_start,
            config.panels.right.sort_spec(),
            config.panels.right.view_mode,
        );

        let keymap = Keymap::with_overrides(&config.keybindings);
        let history = CommandHistory::new(config.history.max_entries);

        Self {
            status: warning.map(|w| (true, w)),
            config,
            config_dirty: false,
            theme_store,
            theme,
            cache,
            left,
            right,
            keymap,
            history,
            pipeline,
            dialogs: DialogStack::default(),
            op_rx: None,
            op_cancel: None,
            op_origin: OpOrigin::Command,
            find_rx: None,
            find_cancel: None,
            dirty: Dirty::ALL,
            running: true,
            panel_rows: 20,
        }
    }

    /// Run the event loop until quit.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.initial_load().await;

        let mut events = EventStream::new();
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));

        while self.running {
            if self.dirty.any() {
                terminal.draw(|frame| self.render(frame))?;
                self.dirty = Dirty::NONE;
            }

            tokio::select! {
                biased;

                Some(Ok(event)) = events.next() => {
                    self.handle_terminal_event(event).await;
                }

                event = Self::next_op_event(&mut self.op_rx) => {
                    self.handle_op_event(event).await;
                }

                event = Self::next_find_event(&mut self.find_rx) => {
                    self.handle_find_event(event);
                }

                _ = interval.tick() => {}
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key).await;
            }
            Event::Resize(..) => {
                self.dirty = Dirty::ALL;
            }
            _ => {}
        }
    }

    /// Await the next event of the running operation, or park forever.
    async fn next_op_event(rx: &mut Option<mpsc::Receiver<OperationEvent>>) -> OperationEvent {
        match rx {
            Some(rx) => match rx.recv().await {
                Some(event) => event,
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    async fn next_find_event(rx: &mut Option<mpsc::Receiver<FindEvent>>) -> FindEvent {
        match rx {
            Some(rx) => match rx.recv().await {
                Some(event) => event,
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    /// Load both panels for the first time.
    ///
    /// A vanished start directory falls back to the home directory, then
    /// to the filesystem root.
    async fn initial_load(&mut self) {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));

        for side in [Side::Left, Side::Right] {
            if self.reload_panel(side, false).await.is_ok() {
                continue;
            }
            warn!(panel = ?side, "start directory unavailable");
            for fallback in [home.clone(), PathBuf::from("/")] {
                self.panel_mut(side).cwd = fallback;
                if self.reload_panel(side, false).await.is_ok() {
                    break;
                }
            }
        }
        self.dirty = Dirty::ALL;
    }

    /// Persist last state and stop background work.
    async fn shutdown(&mut self) {
        if let Some(cancel) = &self.op_cancel {
            cancel.cancel();
        }
        if let Some(cancel) = &self.find_cancel {
            cancel.cancel();
        }
        // Brief grace so canceled subtasks can clean partial files.
        tokio::time::sleep(Duration::from_millis(100)).await;

        self.config.panels.left.start_path = Some(self.left.cwd.clone());
        self.config.panels.right.start_path = Some(self.right.cwd.clone());
        self.config.theme.current = self.theme.id.clone();

        if let Err(e) = self.config.save() {
            warn!(error = %e, "could not persist configuration");
        } else {
            info!("configuration persisted");
        }
    }

    pub(crate) fn panel(&self, side: Side) -> &PanelState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn panel_mut(&mut self, side: Side) -> &mut PanelState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub(crate) fn active_side(&self) -> Side {
        if self.left.active {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub(crate) fn active_panel(&self) -> &PanelState {
        self.panel(self.active_side())
    }

    pub(crate) fn active_panel_mut(&mut self) -> &mut PanelState {
        self.panel_mut(self.active_side())
    }

    pub(crate) fn set_status(&mut self, is_error: bool, message: impl Into<String>) {
        self.status = Some((is_error, message.into()));
        self.dirty = self.dirty.merge(Dirty::STATUS);
    }

    pub(crate) fn mark_panel_dirty(&mut self, side: Side) {
        let region = match side {
            Side::Left => Dirty {
                left_panel: true,
                ..Dirty::NONE
            },
            Side::Right => Dirty {
                right_panel: true,
                ..Dirty::NONE
            },
        };
        self.dirty = self.dirty.merge(region);
    }

    /// Draw the whole frame; `dirty` gates how often this runs.
    fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let [menu_row, panels_row, status_row, keys_row] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let [left_area, right_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(panels_row);

        self.panel_rows = panels_row
            .height
            .saturating_sub(ui::PANEL_CHROME_ROWS) as usize;
        self.left.ensure_visible(self.panel_rows.max(1));
        self.right.ensure_visible(self.panel_rows.max(1));

        frame.render_widget(ratatui::widgets::Block::new().style(self.theme.surface), area);
        ui::render_menu_bar(frame, menu_row, &self.theme, self.open_menu_category());
        ui::render_panel(frame, left_area, &self.left, &self.theme);
        ui::render_panel(frame, right_area, &self.right, &self.theme);
        ui::render_status(frame, status_row, &self.theme, self.status.as_ref());
        ui::render_key_bar(frame, keys_row, &self.theme);

        if self.dialogs.is_open() {
            let env = self.dialog_env();
            ui::render_dialogs(frame, area, &self.dialogs, &self.theme, &env);
        }
    }

    fn open_menu_category(&self) -> Option<usize> {
        self.dialogs.iter().find_map(|d| match d {
            crate::dialog::Dialog::Menu { category, .. } => Some(*category),
            _ => None,
        })
    }

    fn dialog_env(&self) -> ui::DialogEnv {
        ui::DialogEnv {
            theme_names: self
                .theme_store
                .all()
                .map(|t| t.display_name.clone())
                .collect(),
            config_summary: vec![
                format!("show hidden:        {}", self.config.general.show_hidden),
                format!("confirm delete:     {}", self.config.general.confirm_delete),
                format!(
                    "confirm overwrite:  {}",
                    self.config.general.confirm_overwrite
                ),
                format!("cache entries:      {}", self.config.cache.max_entries),
                format!("cache ttl:          {}s", self.config.cache.ttl_seconds),
                format!("history bound:      {}", self.config.history.max_entries),
                format!("theme:              {}", self.theme.id),
            ],
        }
    }
}
