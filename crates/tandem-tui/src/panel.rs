//! Per-pane state: directory, cursor, marks, history, quick-search.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tandem_core::entry::{DirEntry, DirListing};
use tandem_core::quick_search::QuickSearch;
use tandem_core::selection;
use tandem_core::sort::{sort_entries, SortSpec};
use tandem_core::view::ViewMode;

/// Which pane a state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The opposite pane.
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Interaction mode of a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode {
    #[default]
    Browsing,
    QuickSearching,
}

/// The full state of one pane.
#[derive(Debug)]
pub struct PanelState {
    /// Current directory (absolute).
    pub cwd: PathBuf,
    /// Current display listing (sorted, with the `..` row).
    pub listing: Arc<DirListing>,
    /// Cursor index into the listing; meaningless when it is empty.
    pub cursor: usize,
    /// Marked entry paths.
    pub marked: HashSet<PathBuf>,
    /// Active ordering.
    pub sort: SortSpec,
    /// Column projection.
    pub view_mode: ViewMode,
    /// Top visible row.
    pub scroll: usize,
    /// Exactly one pane is active at a time (kept by the shell).
    pub active: bool,
    /// Interaction mode.
    pub mode: PanelMode,
    /// Type-to-filter state.
    pub quick_search: QuickSearch,
    back: Vec<PathBuf>,
    forward: Vec<PathBuf>,
}

impl PanelState {
    /// A pane rooted at `cwd` with an empty listing until the first load.
    pub fn new(cwd: PathBuf, sort: SortSpec, view_mode: ViewMode) -> Self {
        let listing = Arc::new(DirListing::new(cwd.clone(), Vec::new(), sort, 0));
        Self {
            cwd,
            listing,
            cursor: 0,
            marked: HashSet::new(),
            sort,
            view_mode,
            scroll: 0,
            active: false,
            mode: PanelMode::default(),
            quick_search: QuickSearch::default(),
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    /// Install a freshly produced listing.
    ///
    /// The raw adapter listing is sorted with the pane's spec and prefixed
    /// with the `..` row. Marks are filtered to surviving paths; the
    /// cursor follows the previously focused path when it still exists,
    /// otherwise it clamps to its former index.
    pub fn apply_listing(&mut self, raw: &DirListing) {
        let focused = self.focused_path();

        let mut entries = raw.entries.clone();
        sort_entries(&mut entries, self.sort);
        if let Some(parent) = self.cwd.parent() {
            entries.insert(0, DirEntry::parent_link(parent));
        }

        let listing = Arc::new(DirListing::new(
            self.cwd.clone(),
            entries,
            self.sort,
            raw.version,
        ));

        selection::retain_existing(&mut self.marked, &listing);

        self.cursor = focused
            .and_then(|path| listing.position_of(&path))
            .unwrap_or_else(|| {
                if listing.is_empty() {
                    0
                } else {
                    self.cursor.min(listing.len() - 1)
                }
            });
        self.listing = listing;
    }

    /// Re-sort the current listing in place (after a sort-spec change).
    pub fn resort(&mut self) {
        let raw = DirListing::new(
            self.cwd.clone(),
            self.listing
                .entries
                .iter()
                .filter(|e| !e.is_parent)
                .cloned()
                .collect(),
            self.sort,
            self.listing.version,
        );
        self.apply_listing(&raw);
    }

    /// Path under the cursor, if the listing has one.
    pub fn focused_path(&self) -> Option<PathBuf> {
        self.listing.get(self.cursor).map(|e| e.path.clone())
    }

    /// Entry under the cursor.
    pub fn focused_entry(&self) -> Option<&DirEntry> {
        self.listing.get(self.cursor)
    }

    /// The operand set for bulk actions: marks, else the cursor entry.
    ///
    /// The `..` row is never an operand.
    pub fn operands(&self) -> Vec<PathBuf> {
        if !self.marked.is_empty() {
            let mut out: Vec<PathBuf> = self.marked.iter().cloned().collect();
            out.sort();
            return out;
        }
        self.focused_entry()
            .filter(|e| !e.is_parent)
            .map(|e| vec![e.path.clone()])
            .unwrap_or_default()
    }

    /// Move the cursor by a signed amount, clamping at the ends.
    pub fn move_cursor(&mut self, delta: isize) {
        if self.listing.is_empty() {
            return;
        }
        let max = self.listing.len() - 1;
        let next = self.cursor.saturating_add_signed(delta).min(max);
        self.cursor = next;
    }

    /// Jump to the first entry.
    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    /// Jump to the last entry.
    pub fn cursor_end(&mut self) {
        self.cursor = self.listing.len().saturating_sub(1);
    }

    /// Keep the cursor inside the visible window of `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }

    /// Enter `target`, pushing the current directory onto back-history.
    pub fn enter_dir(&mut self, target: PathBuf) {
        self.push_back(self.cwd.clone());
        self.forward.clear();
        self.set_cwd(target);
    }

    /// Go to the parent directory. Returns the directory just left so the
    /// caller can put the cursor on it.
    pub fn go_parent(&mut self) -> Option<PathBuf> {
        let parent = self.cwd.parent()?.to_path_buf();
        let left = self.cwd.clone();
        self.push_back(left.clone());
        self.forward.clear();
        self.set_cwd(parent);
        Some(left)
    }

    /// Traverse back-history without mutating it further.
    pub fn history_back(&mut self) -> bool {
        let Some(previous) = self.back.pop() else {
            return false;
        };
        self.forward.push(self.cwd.clone());
        self.set_cwd(previous);
        true
    }

    /// Traverse forward-history.
    pub fn history_forward(&mut self) -> bool {
        let Some(next) = self.forward.pop() else {
            return false;
        };
        self.push_back(self.cwd.clone());
        self.set_cwd(next);
        true
    }

    /// Jump to an arbitrary directory (find result, menu action).
    pub fn jump_to(&mut self, target: PathBuf) {
        if target != self.cwd {
            self.enter_dir(target);
        }
    }

    /// Count and total size of marked entries, for the status line.
    pub fn marked_stats(&self) -> (usize, u64) {
        let mut bytes = 0u64;
        for entry in &self.listing.entries {
            if self.marked.contains(&entry.path) {
                bytes += entry.size;
            }
        }
        (self.marked.len(), bytes)
    }

    fn set_cwd(&mut self, target: PathBuf) {
        self.cwd = target;
        self.marked.clear();
        self.cursor = 0;
        self.scroll = 0;
        self.quick_search.deactivate();
        self.mode = PanelMode::Browsing;
    }

    fn push_back(&mut self, dir: PathBuf) {
        // The stack never repeats the directory at its top.
        if self.back.last() != Some(&dir) {
            self.back.push(dir);
        }
    }
}
