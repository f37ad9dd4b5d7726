//! Reified commands and the bounded undo/redo history.

use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reverse data carried by a completed mutating command.
///
/// Each variant holds enough state to run the command backwards, and the
/// forward data needed to run it again for redo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoAction {
    /// Copies were made; the listed destinations did not pre-exist.
    CopyCreated {
        sources: Vec<PathBuf>,
        destination: PathBuf,
        created: Vec<PathBuf>,
    },
    /// Entries were moved; pairs are (original, new location).
    Moved { pairs: Vec<(PathBuf, PathBuf)> },
    /// Entries were staged for deletion; pairs are (original, staged).
    DeletedStaged { pairs: Vec<(PathBuf, PathBuf)> },
    /// A directory was created by this command.
    CreatedDirectory { path: PathBuf },
    /// An entry was renamed within `parent`.
    Renamed {
        parent: PathBuf,
        old_name: String,
        new_name: String,
    },
    /// Recorded for audit; undo is not possible.
    NotUndoable { reason: String },
}

impl UndoAction {
    /// Whether the command can be run backwards.
    pub fn can_undo(&self) -> bool {
        !matches!(self, Self::NotUndoable { .. })
    }

    /// Description of what undoing will do, for the notice line.
    pub fn undo_description(&self) -> String {
        match self {
            Self::CopyCreated { created, .. } => {
                format!("remove {} copied item(s)", created.len())
            }
            Self::Moved { pairs } => format!("move {} item(s) back", pairs.len()),
            Self::DeletedStaged { pairs } => format!("restore {} item(s)", pairs.len()),
            Self::CreatedDirectory { path } => {
                format!("remove directory '{}'", path.display())
            }
            Self::Renamed { old_name, .. } => format!("rename back to '{old_name}'"),
            Self::NotUndoable { reason } => format!("cannot undo: {reason}"),
        }
    }
}

/// A completed mutating command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Sequence id, unique within the session.
    pub id: u64,
    /// Short description, e.g. "Copied 3 items".
    pub description: String,
    /// Reverse/forward data.
    pub action: UndoAction,
}

/// Result of asking the history for the next undo.
#[derive(Debug)]
pub struct UndoPop {
    /// The record to reverse, if any remained.
    pub record: Option<CommandRecord>,
    /// Non-undoable records that were skipped over, for the notice.
    pub skipped: usize,
}

/// Bounded undo and redo stacks.
///
/// A new command clears redo. Undo pops, the caller executes the reverse,
/// then pushes the record onto redo (and vice versa for redo).
#[derive(Debug)]
pub struct CommandHistory {
    undo: VecDeque<CommandRecord>,
    redo: Vec<CommandRecord>,
    max_entries: usize,
    next_id: u64,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CommandHistory {
    /// History bounded to `max_entries` per stack.
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_entries: max_entries.max(1),
            next_id: 0,
        }
    }

    /// Record a newly executed command. Clears the redo stack.
    ///
    /// Returns the id assigned to the record.
    pub fn push(&mut self, description: impl Into<String>, action: UndoAction) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.undo.len() >= self.max_entries {
            self.undo.pop_front();
        }
        self.undo.push_back(CommandRecord {
            id,
            description: description.into(),
            action,
        });
        self.redo.clear();
        id
    }

    /// Pop the most recent undoable record, skipping audit-only entries.
    pub fn pop_undo(&mut self) -> UndoPop {
        let mut skipped = 0;
        while let Some(record) = self.undo.pop_back() {
            if record.action.can_undo() {
                return UndoPop {
                    record: Some(record),
                    skipped,
                };
            }
            skipped += 1;
        }
        UndoPop {
            record: None,
            skipped,
        }
    }

    /// Park a reversed record so redo can replay it.
    pub fn push_redo(&mut self, record: CommandRecord) {
        if self.redo.len() >= self.max_entries {
            self.redo.remove(0);
        }
        self.redo.push(record);
    }

    /// Pop the most recent redo candidate.
    pub fn pop_redo(&mut self) -> Option<CommandRecord> {
        self.redo.pop()
    }

    /// Re-enter a redone record into the undo stack without clearing redo.
    pub fn restore_undo(&mut self, record: CommandRecord) {
        if self.undo.len() >= self.max_entries {
            self.undo.pop_front();
        }
        self.undo.push_back(record);
    }

    /// Most recent record, if any.
    pub fn peek_undo(&self) -> Option<&CommandRecord> {
        self.undo.back()
    }

    /// Depths of (undo, redo).
    pub fn depths(&self) -> (usize, usize) {
        (self.undo.len(), self.redo.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename_action(n: u32) -> UndoAction {
        UndoAction::Renamed {
            parent: PathBuf::from("/a"),
            old_name: format!("old{n}"),
            new_name: format!("new{n}"),
        }
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = CommandHistory::new(10);
        history.push("first", rename_action(1));

        let popped = history.pop_undo().record.unwrap();
        history.push_redo(popped);
        assert_eq!(history.depths(), (0, 1));

        history.push("second", rename_action(2));
        assert_eq!(history.depths(), (1, 0));
    }

    #[test]
    fn test_bound_drops_oldest() {
        let mut history = CommandHistory::new(3);
        for n in 0..5 {
            history.push(format!("cmd {n}"), rename_action(n));
        }
        assert_eq!(history.depths().0, 3);
        assert_eq!(history.peek_undo().unwrap().description, "cmd 4");
    }

    #[test]
    fn test_pop_skips_non_undoable() {
        let mut history = CommandHistory::new(10);
        history.push("real", rename_action(1));
        history.push(
            "permanent delete",
            UndoAction::NotUndoable {
                reason: "not staged".into(),
            },
        );

        let pop = history.pop_undo();
        assert_eq!(pop.skipped, 1);
        assert_eq!(pop.record.unwrap().description, "real");
    }

    #[test]
    fn test_empty_pop() {
        let mut history = CommandHistory::new(10);
        let pop = history.pop_undo();
        assert!(pop.record.is_none());
        assert_eq!(pop.skipped, 0);
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = CommandHistory::new(10);
        history.push("rename", rename_action(1));

        let record = history.pop_undo().record.unwrap();
        history.push_redo(record);
        assert_eq!(history.depths(), (0, 1));

        let record = history.pop_redo().unwrap();
        history.restore_undo(record);
        assert_eq!(history.depths(), (1, 0));
    }
}
