//! Key routing: dialogs first, then quick-search, then the keymap.
//!
//! Every layer resolves through the same registry: the innermost context
//! (dialog, menu, quick-search or panel) is picked from the UI state and
//! `Keymap::resolve` walks its chain. Dialogs fall back to raw keys only
//! for text entry and surface-local toggles no action name covers.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use tandem_fs::validate_name;
use tandem_ops::{OperationRequest, TransferOptions};

use crate::action::{Action, Dirty};
use crate::dialog::{Dialog, InputPurpose, PendingAction, POLICY_CHOICES};
use crate::keymap::{Chord, KeyContext};
use crate::menu::MENU;
use crate::panel::PanelMode;

use super::App;

impl App {
    /// Entry point for every key press.
    pub(crate) async fn handle_key(&mut self, key: KeyEvent) {
        // A fresh keystroke clears the previous status notice.
        if self.status.is_some() && !self.dialogs.is_open() {
            self.status = None;
            self.dirty = self.dirty.merge(Dirty::STATUS);
        }

        if self.dialogs.is_open() {
            self.handle_dialog_key(key).await;
            return;
        }

        let chord = Chord::from_event(&key);
        let side = self.active_side();

        if self.panel(side).mode == PanelMode::QuickSearching {
            match key.code {
                KeyCode::Esc => {
                    let panel = self.panel_mut(side);
                    panel.quick_search.deactivate();
                    panel.mode = PanelMode::Browsing;
                    self.mark_panel_dirty(side);
                    return;
                }
                KeyCode::Backspace => {
                    let case = self.config.general.quick_search_case_sensitive;
                    let panel = self.panel_mut(side);
                    let listing = panel.listing.clone();
                    if let Some(index) = panel.quick_search.pop(&listing, case) {
                        panel.cursor = index;
                    }
                    self.mark_panel_dirty(side);
                    return;
                }
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    self.quick_search_push(c);
                    return;
                }
                _ => {
                    // Navigation and actions commit the search position.
                    if let Some(action) = self.keymap.resolve(KeyContext::QuickSearch, chord) {
                        self.dispatch(action).await;
                    }
                    return;
                }
            }
        }

        if let Some(action) = self.keymap.resolve(KeyContext::Panel, chord) {
            self.dispatch(action).await;
            return;
        }

        // Unbound printable keys start type-to-filter.
        if let KeyCode::Char(c) = key.code {
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            {
                let panel = self.active_panel_mut();
                panel.mode = PanelMode::QuickSearching;
                panel.quick_search.activate();
                self.quick_search_push(c);
            }
        }
    }

    fn quick_search_push(&mut self, c: char) {
        let side = self.active_side();
        let case = self.config.general.quick_search_case_sensitive;
        let panel = self.panel_mut(side);
        let listing = panel.listing.clone();
        if let Some(index) = panel.quick_search.push(c, &listing, case) {
            panel.cursor = index;
        }
        self.mark_panel_dirty(side);
    }

    /// A dialog is open: resolve against its context, then let the
    /// surface consume whatever the keymap leaves unbound.
    async fn handle_dialog_key(&mut self, key: KeyEvent) {
        self.dirty = Dirty::ALL;

        let context = match self.dialogs.top() {
            Some(Dialog::Menu { .. }) => KeyContext::Menu,
            Some(_) => KeyContext::Dialog,
            None => return,
        };

        let chord = Chord::from_event(&key);
        if let Some(action) = self.keymap.resolve(context, chord) {
            self.apply_dialog_action(action).await;
            return;
        }

        self.handle_dialog_fallback(key);
    }

    /// Execute an action resolved in a dialog or menu context. Anything
    /// that reached here through the menu's global fall-through goes back
    /// to the ordinary dispatcher.
    async fn apply_dialog_action(&mut self, action: Action) {
        match action {
            Action::DialogConfirm => self.dialog_confirm().await,
            Action::DialogCancel => self.dialog_cancel(),
            Action::DialogToggle => self.dialog_toggle(),
            Action::DialogUp => self.dialog_move(-1),
            Action::DialogDown => self.dialog_move(1),
            Action::DialogLeft => self.dialog_horizontal(-1),
            Action::DialogRight => self.dialog_horizontal(1),

            Action::MenuClose => {
                self.dialogs.pop();
            }
            Action::MenuUp => {
                if let Some(Dialog::Menu { item, .. }) = self.dialogs.top_mut() {
                    *item = item.saturating_sub(1);
                }
            }
            Action::MenuDown => {
                if let Some(Dialog::Menu { category, item }) = self.dialogs.top_mut() {
                    *item = (*item + 1).min(MENU[*category].items.len() - 1);
                }
            }
            Action::MenuLeft => {
                if let Some(Dialog::Menu { category, item }) = self.dialogs.top_mut() {
                    *category = (*category + MENU.len() - 1) % MENU.len();
                    *item = 0;
                }
            }
            Action::MenuRight => {
                if let Some(Dialog::Menu { category, item }) = self.dialogs.top_mut() {
                    *category = (*category + 1) % MENU.len();
                    *item = 0;
                }
            }
            Action::MenuActivate => {
                let selected = match self.dialogs.top() {
                    Some(Dialog::Menu { category, item }) => MENU[*category].items[*item].action,
                    _ => return,
                };
                self.dialogs.pop();
                self.dispatch(selected).await;
            }

            other => self.dispatch(other).await,
        }
    }

    /// Confirm the top dialog (Enter by default).
    async fn dialog_confirm(&mut self) {
        match self.dialogs.top() {
            Some(Dialog::Confirm { .. }) => {
                let Some(Dialog::Confirm {
                    pending,
                    yes_selected,
                    ..
                }) = self.dialogs.pop()
                else {
                    return;
                };
                if yes_selected {
                    match pending {
                        PendingAction::Run(request) => self.start_operation(request),
                        PendingAction::Quit => self.running = false,
                    }
                }
            }
            Some(Dialog::Transfer { .. }) => {
                let Some(Dialog::Transfer {
                    sources,
                    destination,
                    policy_index,
                    is_move,
                    ..
                }) = self.dialogs.pop()
                else {
                    return;
                };
                let dest = PathBuf::from(destination.value.trim());
                if dest.as_os_str().is_empty() {
                    self.set_status(true, "destination cannot be empty");
                    return;
                }
                let options = TransferOptions {
                    overwrite: POLICY_CHOICES[policy_index].0,
                    ..TransferOptions::default()
                };
                let request = if is_move {
                    OperationRequest::move_to(sources, dest, options)
                } else {
                    OperationRequest::copy(sources, dest, options)
                };
                self.start_operation(request);
            }
            Some(Dialog::Input { .. }) => self.submit_input().await,
            Some(Dialog::Find { .. }) => self.find_confirm().await,
            Some(Dialog::Config { .. }) => self.config_confirm(),
            Some(Dialog::Report { .. }) | Some(Dialog::QuickView { .. }) | Some(Dialog::Help) => {
                self.dialogs.pop();
            }
            // Progress ends on its own; the menu has its own actions.
            Some(Dialog::Progress { .. }) | Some(Dialog::Menu { .. }) | None => {}
        }
    }

    /// Cancel/close the top dialog (Esc by default).
    fn dialog_cancel(&mut self) {
        match self.dialogs.top() {
            Some(Dialog::Progress { .. }) => {
                // The dialog closes when the canceled operation reports.
                if let Some(cancel) = &self.op_cancel {
                    cancel.cancel();
                }
            }
            Some(Dialog::Find { .. }) => {
                // First cancel stops the search, the second closes.
                let searching =
                    matches!(self.dialogs.top(), Some(Dialog::Find { running: true, .. }));
                self.stop_find_stream();
                if searching {
                    if let Some(Dialog::Find { running, .. }) = self.dialogs.top_mut() {
                        *running = false;
                    }
                } else {
                    self.dialogs.pop();
                }
            }
            Some(_) => {
                self.dialogs.pop();
            }
            None => {}
        }
    }

    /// Cycle the top dialog's toggle (Tab by default).
    fn dialog_toggle(&mut self) {
        match self.dialogs.top_mut() {
            Some(Dialog::Confirm { yes_selected, .. }) => *yes_selected = !*yes_selected,
            Some(Dialog::Transfer { policy_index, .. }) => {
                *policy_index = (*policy_index + 1) % POLICY_CHOICES.len();
            }
            Some(Dialog::Report { show_all, .. }) => *show_all = true,
            Some(Dialog::Config { tab, .. }) => *tab = (*tab + 1) % 2,
            _ => {}
        }
    }

    /// Vertical movement inside the top dialog.
    fn dialog_move(&mut self, delta: isize) {
        match self.dialogs.top_mut() {
            Some(Dialog::Find {
                results, selected, ..
            }) => {
                if delta < 0 {
                    *selected = selected.saturating_sub(1);
                } else if !results.is_empty() {
                    *selected = (*selected + 1).min(results.len() - 1);
                }
            }
            Some(Dialog::Config { theme_index, .. }) => {
                if delta < 0 {
                    *theme_index = theme_index.saturating_sub(1);
                } else {
                    let count = self.theme_store.all().count();
                    *theme_index = (*theme_index + 1).min(count.saturating_sub(1));
                }
            }
            _ => {}
        }
    }

    /// Horizontal movement inside the top dialog.
    fn dialog_horizontal(&mut self, delta: isize) {
        match self.dialogs.top_mut() {
            Some(Dialog::Confirm { yes_selected, .. }) => *yes_selected = !*yes_selected,
            Some(Dialog::Transfer { destination, .. }) => destination.move_cursor(delta),
            Some(Dialog::Input { edit, .. }) => edit.move_cursor(delta),
            Some(Dialog::Config { tab, .. }) => *tab = (*tab + 1) % 2,
            _ => {}
        }
    }

    /// Keys the keymap leaves unbound: text entry, y/n shortcuts, the
    /// find dialog's flag keys.
    fn handle_dialog_fallback(&mut self, key: KeyEvent) {
        let Some(top) = self.dialogs.top_mut() else {
            return;
        };

        match top {
            Dialog::Confirm { yes_selected, .. } => match key.code {
                KeyCode::Char('y') => *yes_selected = true,
                KeyCode::Char('n') => {
                    self.dialogs.pop();
                }
                _ => {}
            },

            Dialog::Transfer { destination, .. } => match key.code {
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    destination.insert(c);
                }
                KeyCode::Backspace => destination.backspace(),
                _ => {}
            },

            Dialog::Input { edit, error, .. } => match key.code {
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    edit.insert(c);
                    *error = None;
                }
                KeyCode::Backspace => {
                    edit.backspace();
                    *error = None;
                }
                _ => {}
            },

            Dialog::Find {
                pattern,
                flags,
                results,
                selected,
                truncated,
                ..
            } => match key.code {
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    pattern.insert(c);
                    results.clear();
                    *selected = 0;
                    *truncated = false;
                }
                KeyCode::Backspace => {
                    pattern.backspace();
                    results.clear();
                    *selected = 0;
                    *truncated = false;
                }
                KeyCode::F(2) => flags.subdirs = !flags.subdirs,
                KeyCode::F(3) => flags.regex = !flags.regex,
                KeyCode::F(4) => flags.case_sensitive = !flags.case_sensitive,
                _ => {}
            },

            Dialog::QuickView { .. } | Dialog::Help => {
                if key.code == KeyCode::F(1) {
                    self.dialogs.pop();
                }
            }

            Dialog::Config { .. } => {
                if key.code == KeyCode::F(9) {
                    self.dialogs.pop();
                }
            }

            Dialog::Progress { .. } | Dialog::Report { .. } | Dialog::Menu { .. } => {}
        }
    }

    /// Enter in the find dialog: run the search, or jump to the selected
    /// result once one exists.
    async fn find_confirm(&mut self) {
        let target = match self.dialogs.top() {
            Some(Dialog::Find { running: true, .. }) => return,
            Some(Dialog::Find {
                results, selected, ..
            }) => {
                if results.is_empty() {
                    None
                } else {
                    Some(results[(*selected).min(results.len() - 1)].clone())
                }
            }
            _ => return,
        };

        match target {
            None => {
                let root = self.active_panel().cwd.clone();
                self.start_find_stream(&root);
            }
            Some(target) => {
                self.stop_find_stream();
                self.dialogs.pop();
                self.jump_to_find_result(target).await;
            }
        }
    }

    /// Enter in the config dialog: apply the highlighted theme.
    fn config_confirm(&mut self) {
        let index = match self.dialogs.top() {
            Some(Dialog::Config { tab: 1, theme_index }) => *theme_index,
            _ => return,
        };
        let theme = self.theme_store.all().nth(index).cloned();
        if let Some(theme) = theme {
            self.apply_theme(&theme);
        }
    }

    /// Resolve a submitted input dialog by purpose.
    async fn submit_input(&mut self) {
        let Some(Dialog::Input { purpose, edit, .. }) = self.dialogs.pop() else {
            return;
        };
        let value = edit.value.trim().to_string();
        let side = self.active_side();

        match purpose {
            InputPurpose::Mkdir => {
                if let Err(reason) = validate_name(&value) {
                    // Rejected before any I/O; reopen with the message.
                    self.dialogs.push(Dialog::Input {
                        title: "Create directory".to_string(),
                        purpose,
                        edit,
                        error: Some(reason),
                    });
                    return;
                }
                let path = self.panel(side).cwd.join(&value);
                self.start_operation(OperationRequest::mkdir(path, false));
            }
            InputPurpose::Rename => {
                if let Err(reason) = validate_name(&value) {
                    self.dialogs.push(Dialog::Input {
                        title: "Rename".to_string(),
                        purpose,
                        edit,
                        error: Some(reason),
                    });
                    return;
                }
                let Some(source) = self.panel(side).focused_path() else {
                    return;
                };
                self.start_operation(OperationRequest::rename(source, value));
            }
            InputPurpose::GroupSelect | InputPurpose::GroupDeselect => {
                if value.is_empty() {
                    return;
                }
                let case = self.config.general.group_select_case_sensitive;
                let panel = self.panel_mut(side);
                let listing = panel.listing.clone();
                if purpose == InputPurpose::GroupSelect {
                    tandem_core::selection::group_select(
                        &mut panel.marked,
                        &listing,
                        &value,
                        case,
                    );
                } else {
                    tandem_core::selection::group_deselect(
                        &mut panel.marked,
                        &listing,
                        &value,
                        case,
                    );
                }
                self.mark_panel_dirty(side);
            }
            InputPurpose::CopyDestination | InputPurpose::MoveDestination => {
                // Transfers use the dedicated dialog; nothing arrives here.
            }
        }
    }

    /// Focus a find result: jump the active panel to its directory.
    async fn jump_to_find_result(&mut self, target: PathBuf) {
        let side = self.active_side();
        let parent = target
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| target.clone());
        self.jump_panel(side, parent, Some(target)).await;
    }
}
