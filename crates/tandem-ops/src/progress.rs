//! Progress events and operation summaries.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tandem_core::error::FsError;

use crate::history::UndoAction;

/// Live progress for a running operation.
///
/// Events for one operation are monotonic in `files_completed` and
/// `bytes_completed`.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// Verb for the dialog title ("Copy", "Move", ...).
    pub verb: &'static str,
    /// Files finished so far.
    pub files_completed: usize,
    /// Files in the whole operation.
    pub files_total: usize,
    /// Bytes finished so far.
    pub bytes_completed: u64,
    /// Total bytes, 0 when unknown.
    pub bytes_total: u64,
    /// Path currently being worked on.
    pub current_path: Option<PathBuf>,
}

impl OperationProgress {
    /// Fresh progress for an operation of known extent.
    pub fn new(verb: &'static str, files_total: usize, bytes_total: u64) -> Self {
        Self {
            verb,
            files_completed: 0,
            files_total,
            bytes_completed: 0,
            bytes_total,
            current_path: None,
        }
    }

    /// Completion ratio in [0, 1], preferring bytes when known.
    pub fn ratio(&self) -> f64 {
        if self.bytes_total > 0 {
            self.bytes_completed as f64 / self.bytes_total as f64
        } else if self.files_total > 0 {
            self.files_completed as f64 / self.files_total as f64
        } else {
            0.0
        }
    }
}

/// Overall outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing failed (skips allowed).
    Success,
    /// Some entries succeeded, some failed.
    Partial,
    /// Nothing succeeded.
    Failure,
    /// The cancellation token was tripped.
    Canceled,
}

/// Final report for an operation.
#[derive(Debug)]
pub struct OperationSummary {
    pub verb: &'static str,
    pub outcome: Outcome,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bytes_processed: u64,
    /// Per-entry failures, in completion order.
    pub errors: Vec<FsError>,
    /// Parent directories whose listings are now stale. The shell
    /// invalidates these before any panel refresh.
    pub affected_dirs: BTreeSet<PathBuf>,
    /// Reverse data for the history, when the operation is undoable.
    pub undo: Option<UndoAction>,
}

impl OperationSummary {
    /// Start an empty summary; the driver fills it in.
    pub fn new(verb: &'static str) -> Self {
        Self {
            verb,
            outcome: Outcome::Success,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            bytes_processed: 0,
            errors: Vec::new(),
            affected_dirs: BTreeSet::new(),
            undo: None,
        }
    }

    /// Derive the outcome from the counters.
    pub fn finish(mut self, canceled: bool) -> Self {
        self.outcome = if canceled {
            Outcome::Canceled
        } else if self.failed == 0 {
            Outcome::Success
        } else if self.succeeded > 0 {
            Outcome::Partial
        } else {
            Outcome::Failure
        };
        self
    }

    /// Record a per-entry failure.
    pub fn record_error(&mut self, error: FsError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Mark a directory's listing stale.
    pub fn touch_dir(&mut self, dir: Option<&std::path::Path>) {
        if let Some(dir) = dir {
            self.affected_dirs.insert(dir.to_path_buf());
        }
    }

    /// One-line result for the status bar.
    pub fn headline(&self) -> String {
        match self.outcome {
            Outcome::Success if self.skipped > 0 => format!(
                "{}: {} done, {} skipped",
                self.verb, self.succeeded, self.skipped
            ),
            Outcome::Success => format!("{}: {} done", self.verb, self.succeeded),
            Outcome::Partial => format!(
                "{}: {} done, {} failed",
                self.verb, self.succeeded, self.failed
            ),
            Outcome::Failure => format!("{} failed ({} errors)", self.verb, self.failed),
            Outcome::Canceled => format!("{} canceled", self.verb),
        }
    }
}

/// Events sent to the shell while an operation runs.
#[derive(Debug)]
pub enum OperationEvent {
    /// Rate-limited progress update.
    Progress(OperationProgress),
    /// Terminal event; nothing follows it.
    Done(OperationSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_derivation() {
        let mut s = OperationSummary::new("Copy");
        s.succeeded = 2;
        assert_eq!(s.finish(false).outcome, Outcome::Success);

        let mut s = OperationSummary::new("Copy");
        s.succeeded = 1;
        s.failed = 1;
        assert_eq!(s.finish(false).outcome, Outcome::Partial);

        let mut s = OperationSummary::new("Copy");
        s.failed = 2;
        assert_eq!(s.finish(false).outcome, Outcome::Failure);

        let s = OperationSummary::new("Copy");
        assert_eq!(s.finish(true).outcome, Outcome::Canceled);
    }

    #[test]
    fn test_skips_do_not_demote_success() {
        let mut s = OperationSummary::new("Copy");
        s.succeeded = 1;
        s.skipped = 1;
        let s = s.finish(false);
        assert_eq!(s.outcome, Outcome::Success);
        assert!(s.headline().contains("skipped"));
    }

    #[test]
    fn test_ratio_prefers_bytes() {
        let mut p = OperationProgress::new("Copy", 10, 100);
        p.files_completed = 9;
        p.bytes_completed = 50;
        assert!((p.ratio() - 0.5).abs() < f64::EPSILON);
    }
}
