//! Modal dialog surfaces and their stack.
//!
//! Dialogs hold input state and emit decisions; they never touch the
//! filesystem themselves. Opening pushes a context, closing pops it.

use std::path::PathBuf;

use tandem_core::entry::DirEntry;
use tandem_core::error::FsError;
use tandem_fs::FindOptions;
use tandem_ops::{OperationProgress, OperationRequest, OverwritePolicy};

/// What a confirm dialog will trigger when accepted.
#[derive(Debug, Clone)]
pub enum PendingAction {
    /// Run this request through the pipeline.
    Run(OperationRequest),
    /// Quit the application.
    Quit,
}

/// Purpose of an input dialog, deciding what happens with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPurpose {
    Mkdir,
    Rename,
    GroupSelect,
    GroupDeselect,
    CopyDestination,
    MoveDestination,
}

/// Single-line text editor used by input dialogs.
#[derive(Debug, Clone, Default)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
}

impl LineEdit {
    /// Editor prefilled with `value`, cursor at the end.
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            cursor: value.chars().count(),
            value,
        }
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let byte = self.byte_index();
        self.value.insert(byte, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte = self.byte_index();
        self.value.remove(byte);
    }

    /// Move the cursor one position left or right.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count();
        self.cursor = self.cursor.saturating_add_signed(delta).min(len);
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

/// Checkable flags on the find dialog.
#[derive(Debug, Clone, Copy)]
pub struct FindFlags {
    pub subdirs: bool,
    pub regex: bool,
    pub case_sensitive: bool,
}

impl Default for FindFlags {
    fn default() -> Self {
        Self {
            subdirs: true,
            regex: false,
            case_sensitive: false,
        }
    }
}

impl FindFlags {
    /// Build adapter options for `pattern` under these flags.
    pub fn to_options(self, pattern: &str, max_results: usize) -> Result<FindOptions, String> {
        FindOptions::builder()
            .pattern(pattern)
            .subdirs(self.subdirs)
            .regex(self.regex)
            .case_sensitive(self.case_sensitive)
            .max_results(max_results)
            .build()
            .map_err(|e| e.to_string())
    }
}

/// Overwrite choice buttons on transfer confirms.
pub const POLICY_CHOICES: [(OverwritePolicy, &str); 4] = [
    (OverwritePolicy::Fail, "Fail"),
    (OverwritePolicy::Overwrite, "Overwrite"),
    (OverwritePolicy::Skip, "Skip"),
    (OverwritePolicy::RenameSuffix, "Rename"),
];

/// A modal surface.
#[derive(Debug)]
pub enum Dialog {
    /// Yes/no question.
    Confirm {
        title: String,
        message: String,
        pending: PendingAction,
        yes_selected: bool,
    },
    /// Transfer confirmation with destination line and overwrite policy.
    Transfer {
        title: String,
        sources: Vec<PathBuf>,
        destination: LineEdit,
        policy_index: usize,
        is_move: bool,
    },
    /// Free text input.
    Input {
        title: String,
        purpose: InputPurpose,
        edit: LineEdit,
        /// Validation failure shown under the field.
        error: Option<String>,
    },
    /// Live progress for a running operation, with cancel.
    Progress {
        progress: OperationProgress,
    },
    /// Recursive find: pattern, flags, streamed results.
    Find {
        pattern: LineEdit,
        flags: FindFlags,
        results: Vec<PathBuf>,
        selected: usize,
        running: bool,
        truncated: bool,
    },
    /// Post-operation error report.
    Report {
        title: String,
        errors: Vec<FsError>,
        show_all: bool,
    },
    /// Entry details (quick view).
    QuickView { entry: DirEntry },
    /// Key/action reference.
    Help,
    /// The menu tree.
    Menu {
        category: usize,
        item: usize,
    },
    /// Tabbed configuration screen (read-only summary plus theme picker).
    Config {
        tab: usize,
        theme_index: usize,
    },
}

impl Dialog {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Confirm { .. } => "confirm",
            Self::Transfer { .. } => "transfer",
            Self::Input { .. } => "input",
            Self::Progress { .. } => "progress",
            Self::Find { .. } => "find",
            Self::Report { .. } => "report",
            Self::QuickView { .. } => "quick_view",
            Self::Help => "help",
            Self::Menu { .. } => "menu",
            Self::Config { .. } => "config",
        }
    }
}

/// Single-instance dialog stack.
#[derive(Debug, Default)]
pub struct DialogStack {
    stack: Vec<Dialog>,
}

impl DialogStack {
    /// Push a dialog; refuses a second instance of the same kind.
    pub fn push(&mut self, dialog: Dialog) -> bool {
        if self.stack.iter().any(|d| d.kind() == dialog.kind()) {
            return false;
        }
        self.stack.push(dialog);
        true
    }

    /// Pop the top dialog.
    pub fn pop(&mut self) -> Option<Dialog> {
        self.stack.pop()
    }

    /// The top dialog, if any.
    pub fn top(&self) -> Option<&Dialog> {
        self.stack.last()
    }

    /// Mutable access to the top dialog.
    pub fn top_mut(&mut self) -> Option<&mut Dialog> {
        self.stack.last_mut()
    }

    /// Whether any dialog is open.
    pub fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Remove a dialog by kind wherever it sits in the stack.
    pub fn remove_kind(&mut self, kind: &str) -> bool {
        let before = self.stack.len();
        self.stack.retain(|d| d.kind() != kind);
        self.stack.len() != before
    }

    /// All dialogs bottom-to-top, for rendering the stack.
    pub fn iter(&self) -> impl Iterator<Item = &Dialog> {
        self.stack.iter()
    }
}
