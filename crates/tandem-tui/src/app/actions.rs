//! Action dispatch: every keymap action lands here.

use tracing::debug;

use tandem_core::selection;
use tandem_core::theme::Theme;

use crate::action::{Action, Dirty};
use crate::dialog::{Dialog, InputPurpose, LineEdit, PendingAction};
use crate::panel::PanelMode;
use crate::theme::UiTheme;

use super::App;

impl App {
    /// Apply one resolved action.
    pub(crate) async fn dispatch(&mut self, action: Action) {
        debug!(action = action.id(), "dispatch");
        let side = self.active_side();

        // Any action other than the quick-search keys leaves search mode,
        // keeping the cursor where the search left it.
        if self.active_panel().mode == PanelMode::QuickSearching {
            let panel = self.active_panel_mut();
            panel.quick_search.deactivate();
            panel.mode = PanelMode::Browsing;
            self.mark_panel_dirty(side);
        }

        match action {
            Action::Quit => {
                self.running = false;
            }
            Action::SwitchPanel => {
                self.left.active = !self.left.active;
                self.right.active = !self.left.active;
                self.dirty = Dirty::ALL;
            }
            Action::Help => {
                self.dialogs.push(Dialog::Help);
                self.dirty = Dirty::ALL;
            }
            Action::OpenMenu => {
                self.dialogs.push(Dialog::Menu {
                    category: 0,
                    item: 0,
                });
                self.dirty = Dirty::ALL;
            }
            Action::OpenConfig => {
                let theme_index = self
                    .theme_store
                    .all()
                    .position(|t| t.id == self.theme.id)
                    .unwrap_or(0);
                self.dialogs.push(Dialog::Config {
                    tab: 0,
                    theme_index,
                });
                self.dirty = Dirty::ALL;
            }

            Action::CursorUp => self.move_cursor(-1),
            Action::CursorDown => self.move_cursor(1),
            Action::PageUp => self.move_cursor(-(self.panel_rows as isize).max(1)),
            Action::PageDown => self.move_cursor((self.panel_rows as isize).max(1)),
            Action::Home => {
                self.active_panel_mut().cursor_home();
                self.mark_panel_dirty(side);
            }
            Action::End => {
                self.active_panel_mut().cursor_end();
                self.mark_panel_dirty(side);
            }

            Action::Activate => {
                let Some(entry) = self.active_panel().focused_entry().cloned() else {
                    return;
                };
                if entry.is_parent {
                    self.go_parent(side).await;
                } else if entry.is_dir {
                    self.enter_directory(side, entry.path).await;
                } else {
                    self.dialogs.push(Dialog::QuickView { entry });
                    self.dirty = Dirty::ALL;
                }
            }
            Action::Parent => self.go_parent(side).await,
            Action::HistoryBack => self.traverse_history(side, true).await,
            Action::HistoryForward => self.traverse_history(side, false).await,
            Action::Refresh => {
                if let Err(e) = self.reload_panel(side, true).await {
                    self.set_status(true, e.to_string());
                }
            }

            Action::ToggleMark => {
                let panel = self.active_panel_mut();
                let cursor = panel.cursor;
                let listing = panel.listing.clone();
                selection::toggle(&mut panel.marked, &listing, cursor);
                self.mark_panel_dirty(side);
            }
            Action::ToggleMarkDown => {
                let panel = self.active_panel_mut();
                let cursor = panel.cursor;
                let listing = panel.listing.clone();
                selection::toggle(&mut panel.marked, &listing, cursor);
                panel.move_cursor(1);
                self.mark_panel_dirty(side);
            }
            Action::GroupSelect => {
                self.open_input("Select group", InputPurpose::GroupSelect, "*");
            }
            Action::GroupDeselect => {
                self.open_input("Unselect group", InputPurpose::GroupDeselect, "*");
            }
            Action::InvertSelection => {
                let panel = self.active_panel_mut();
                let listing = panel.listing.clone();
                selection::invert(&mut panel.marked, &listing);
                self.mark_panel_dirty(side);
            }
            Action::SelectAllFiles => {
                let panel = self.active_panel_mut();
                let listing = panel.listing.clone();
                selection::select_all_files(&mut panel.marked, &listing);
                self.mark_panel_dirty(side);
            }
            Action::UnselectAll => {
                selection::unselect_all(&mut self.active_panel_mut().marked);
                self.mark_panel_dirty(side);
            }

            Action::View | Action::QuickView => {
                if let Some(entry) = self.active_panel().focused_entry().cloned() {
                    if !entry.is_parent {
                        self.dialogs.push(Dialog::QuickView { entry });
                        self.dirty = Dirty::ALL;
                    }
                }
            }
            Action::Edit => {
                self.set_status(false, "no editor is bundled; open the file externally");
            }

            Action::Copy => self.open_transfer(false),
            Action::Move => self.open_transfer(true),
            Action::Mkdir => {
                self.open_input("Create directory", InputPurpose::Mkdir, "");
            }
            Action::Delete => self.request_delete(false),
            Action::DeletePermanent => self.request_delete(true),
            Action::Rename => {
                let Some(entry) = self.active_panel().focused_entry() else {
                    return;
                };
                if entry.is_parent {
                    return;
                }
                let name = entry.name.to_string();
                self.open_input("Rename", InputPurpose::Rename, &name);
            }
            Action::Undo => self.undo().await,
            Action::Redo => self.redo().await,

            Action::Find => {
                self.dialogs.push(Dialog::Find {
                    pattern: LineEdit::default(),
                    flags: Default::default(),
                    results: Vec::new(),
                    selected: 0,
                    running: false,
                    truncated: false,
                });
                self.dirty = Dirty::ALL;
            }
            Action::ToggleHidden => {
                self.config.general.show_hidden = !self.config.general.show_hidden;
                self.config_dirty = true;
                self.reload_both(false).await;
                self.set_status(
                    false,
                    if self.config.general.show_hidden {
                        "hidden files shown"
                    } else {
                        "hidden files hidden"
                    },
                );
            }
            Action::CycleTheme => {
                let next = self.theme_store.next_after(&self.theme.id).clone();
                self.apply_theme(&next);
            }
            Action::CycleSort => {
                let panel = self.active_panel_mut();
                panel.sort.key = panel.sort.key.next();
                panel.resort();
                let key = panel.sort.key;
                self.mark_panel_dirty(side);
                self.set_status(false, format!("sorted by {key}"));
            }
            Action::CycleView => {
                let panel = self.active_panel_mut();
                panel.view_mode = panel.view_mode.next();
                self.mark_panel_dirty(side);
            }
            Action::SwapPanels => {
                let was_left_active = self.left.active;
                std::mem::swap(&mut self.left, &mut self.right);
                self.left.active = was_left_active;
                self.right.active = !was_left_active;
                self.dirty = Dirty::ALL;
            }
            Action::SameDir => {
                let target = self.active_panel().cwd.clone();
                self.jump_panel(side.other(), target, None).await;
            }

            // Dialog- and menu-scoped actions resolve only while their
            // context is active; the dialog handler consumes them there.
            Action::DialogConfirm
            | Action::DialogCancel
            | Action::DialogToggle
            | Action::DialogUp
            | Action::DialogDown
            | Action::DialogLeft
            | Action::DialogRight
            | Action::MenuActivate
            | Action::MenuClose
            | Action::MenuUp
            | Action::MenuDown
            | Action::MenuLeft
            | Action::MenuRight => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let side = self.active_side();
        self.active_panel_mut().move_cursor(delta);
        self.mark_panel_dirty(side);
    }

    fn open_input(&mut self, title: &str, purpose: InputPurpose, prefill: &str) {
        self.dialogs.push(Dialog::Input {
            title: title.to_string(),
            purpose,
            edit: LineEdit::with_value(prefill),
            error: None,
        });
        self.dirty = Dirty::ALL;
    }

    fn open_transfer(&mut self, is_move: bool) {
        let sources = self.active_panel().operands();
        if sources.is_empty() {
            self.set_status(false, "nothing selected");
            return;
        }
        let destination = self.panel(self.active_side().other()).cwd.clone();
        let title = if is_move { "Move" } else { "Copy" };
        // Confirm-overwrite policy decides the preselected conflict choice.
        let policy_index = if self.config.general.confirm_overwrite {
            0
        } else {
            1
        };
        self.dialogs.push(Dialog::Transfer {
            title: title.to_string(),
            sources,
            destination: LineEdit::with_value(destination.display().to_string()),
            policy_index,
            is_move,
        });
        self.dirty = Dirty::ALL;
    }

    fn request_delete(&mut self, permanent: bool) {
        let targets = self.active_panel().operands();
        if targets.is_empty() {
            self.set_status(false, "nothing selected");
            return;
        }

        let options = tandem_ops::DeleteOptions {
            recurse: true,
            into_trash: !permanent,
        };
        let request = tandem_ops::OperationRequest::delete(targets.clone(), options);

        if self.config.general.confirm_delete {
            let what = if targets.len() == 1 {
                targets[0].display().to_string()
            } else {
                format!("{} entries", targets.len())
            };
            let message = if permanent {
                format!("Permanently delete {what}? This cannot be undone.")
            } else {
                format!("Delete {what}?")
            };
            self.dialogs.push(Dialog::Confirm {
                title: "Delete".to_string(),
                message,
                pending: PendingAction::Run(request),
                yes_selected: false,
            });
            self.dirty = Dirty::ALL;
        } else {
            self.start_operation(request);
        }
    }

    /// Swap the active palette and remember the choice.
    pub(crate) fn apply_theme(&mut self, theme: &Theme) {
        self.theme = UiTheme::from_theme(theme);
        self.config.theme.current = theme.id.clone();
        self.config_dirty = true;
        self.dirty = Dirty::ALL;
        self.set_status(false, format!("theme: {}", theme.display_name));
    }
}
