//! Operation launch, progress plumbing, undo/redo, find streaming.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tandem_fs::FindEvent;
use tandem_ops::{
    Direction, OperationEvent, OperationProgress, OperationRequest, OperationSummary, Outcome,
};

use crate::action::Dirty;
use crate::dialog::Dialog;
use crate::panel::Side;

use super::{App, OpOrigin};

impl App {
    /// Launch a pipeline operation with a progress dialog.
    pub(crate) fn start_operation(&mut self, request: OperationRequest) {
        if self.op_rx.is_some() {
            self.set_status(true, "another operation is still running");
            return;
        }

        info!(verb = request.verb(), "starting operation");
        let cancel = CancellationToken::new();
        let progress = OperationProgress::new(request.verb(), 0, 0);

        self.op_rx = Some(self.pipeline.start(request, cancel.clone()));
        self.op_cancel = Some(cancel);
        self.op_origin = OpOrigin::Command;
        self.dialogs.push(Dialog::Progress { progress });
        self.dirty = Dirty::ALL;
    }

    /// Pop the next undoable record and run its reverse.
    pub(crate) async fn undo(&mut self) {
        if self.op_rx.is_some() {
            self.set_status(true, "another operation is still running");
            return;
        }

        let pop = self.history.pop_undo();
        if pop.skipped > 0 {
            self.set_status(
                false,
                format!("skipped {} non-undoable command(s)", pop.skipped),
            );
        }
        let Some(record) = pop.record else {
            if pop.skipped == 0 {
                self.set_status(false, "nothing to undo");
            }
            return;
        };

        info!(id = record.id, "undoing '{}'", record.description);
        let cancel = CancellationToken::new();
        let progress = OperationProgress::new("Undo", 0, 0);
        self.op_rx = Some(self.pipeline.start_reversal(
            record.action.clone(),
            Direction::Undo,
            cancel.clone(),
        ));
        self.op_cancel = Some(cancel);
        self.op_origin = OpOrigin::Undo(record);
        self.dialogs.push(Dialog::Progress { progress });
        self.dirty = Dirty::ALL;
    }

    /// Pop the redo stack and run the command forward again.
    pub(crate) async fn redo(&mut self) {
        if self.op_rx.is_some() {
            self.set_status(true, "another operation is still running");
            return;
        }

        let Some(record) = self.history.pop_redo() else {
            self.set_status(false, "nothing to redo");
            return;
        };

        info!(id = record.id, "redoing '{}'", record.description);
        let cancel = CancellationToken::new();
        let progress = OperationProgress::new("Redo", 0, 0);
        self.op_rx = Some(self.pipeline.start_reversal(
            record.action.clone(),
            Direction::Redo,
            cancel.clone(),
        ));
        self.op_cancel = Some(cancel);
        self.op_origin = OpOrigin::Redo(record);
        self.dialogs.push(Dialog::Progress { progress });
        self.dirty = Dirty::ALL;
    }

    /// Handle one event from the running operation.
    pub(crate) async fn handle_op_event(&mut self, event: OperationEvent) {
        match event {
            OperationEvent::Progress(progress) => {
                if let Some(Dialog::Progress { progress: shown }) = self.dialogs.top_mut() {
                    *shown = progress;
                    self.dirty = Dirty::ALL;
                }
            }
            OperationEvent::Done(summary) => {
                self.op_rx = None;
                self.op_cancel = None;
                self.finish_operation(summary).await;
            }
        }
    }

    /// Invalidate, record history, report, refresh. Invalidation runs
    /// before any panel refresh so no stale listing survives the op.
    async fn finish_operation(&mut self, summary: OperationSummary) {
        for dir in &summary.affected_dirs {
            self.cache.invalidate(dir);
        }

        self.dialogs.remove_kind("progress");

        let origin = std::mem::replace(&mut self.op_origin, OpOrigin::Command);
        match origin {
            OpOrigin::Command => {
                // Failed commands leave no undoable record; partial
                // successes are undoable over the succeeded subset.
                if summary.succeeded > 0 && summary.outcome != Outcome::Failure {
                    if let Some(action) = &summary.undo {
                        self.history.push(summary.headline(), action.clone());
                    }
                }
            }
            OpOrigin::Undo(record) => {
                if summary.succeeded > 0 {
                    self.history.push_redo(record);
                } else {
                    // The undo did nothing; keep the record available.
                    self.history.restore_undo(record);
                }
            }
            OpOrigin::Redo(record) => {
                if summary.succeeded > 0 {
                    self.history.restore_undo(record);
                } else {
                    self.history.push_redo(record);
                }
            }
        }

        let is_error = !matches!(summary.outcome, Outcome::Success);
        self.set_status(is_error, summary.headline());

        if !summary.errors.is_empty() {
            self.dialogs.push(Dialog::Report {
                title: format!("{} report", summary.verb),
                errors: summary.errors.clone(),
                show_all: false,
            });
        }

        // Coalesced refresh: panels whose directory was invalidated reload
        // once, after the whole operation.
        for side in [Side::Left, Side::Right] {
            let cwd = self.panel(side).cwd.clone();
            let affected = summary
                .affected_dirs
                .iter()
                .any(|dir| cwd == *dir || cwd.starts_with(dir));
            if affected {
                if let Err(e) = self.reload_panel(side, false).await {
                    warn!(error = %e, "panel refresh after operation failed");
                }
            }
        }

        self.dirty = Dirty::ALL;
    }

    /// Start (or restart) the streaming find from the dialog's state.
    pub(crate) fn start_find_stream(&mut self, root: &Path) {
        // A previous stream is replaced wholesale.
        if let Some(cancel) = self.find_cancel.take() {
            cancel.cancel();
        }
        self.find_rx = None;

        let Some((pattern_value, flags)) = self.reset_find_dialog() else {
            return;
        };

        let options = match flags.to_options(&pattern_value, super::FIND_MAX_RESULTS) {
            Ok(options) => options,
            Err(e) => {
                self.set_find_running(false);
                self.set_status(true, e);
                return;
            }
        };

        let cancel = CancellationToken::new();
        match tandem_fs::start_find(root.to_path_buf(), options, cancel.clone()) {
            Ok(rx) => {
                self.set_find_running(true);
                self.find_rx = Some(rx);
                self.find_cancel = Some(cancel);
                self.dirty = Dirty::ALL;
            }
            Err(e) => {
                self.set_find_running(false);
                self.set_status(true, format!("bad pattern: {e}"));
            }
        }
    }

    /// Clear the find dialog's results and return (pattern, flags), or
    /// `None` when the dialog is missing or the pattern is empty.
    fn reset_find_dialog(&mut self) -> Option<(String, crate::dialog::FindFlags)> {
        match self.dialogs.top_mut() {
            Some(Dialog::Find {
                pattern,
                flags,
                results,
                selected,
                truncated,
                ..
            }) => {
                if pattern.value.is_empty() {
                    return None;
                }
                results.clear();
                *selected = 0;
                *truncated = false;
                Some((pattern.value.clone(), *flags))
            }
            _ => None,
        }
    }

    fn set_find_running(&mut self, value: bool) {
        if let Some(Dialog::Find { running, .. }) = self.dialogs.top_mut() {
            *running = value;
        }
    }

    /// Stop the running find, if any.
    pub(crate) fn stop_find_stream(&mut self) {
        if let Some(cancel) = self.find_cancel.take() {
            cancel.cancel();
        }
        self.find_rx = None;
    }

    /// Handle one streamed find event.
    pub(crate) fn handle_find_event(&mut self, event: FindEvent) {
        if !matches!(self.dialogs.top(), Some(Dialog::Find { .. })) {
            // Dialog closed under the stream; drop it.
            self.stop_find_stream();
            return;
        }

        match event {
            FindEvent::Match(path) => {
                if let Some(Dialog::Find { results, .. }) = self.dialogs.top_mut() {
                    results.push(path);
                }
                self.dirty = Dirty::ALL;
            }
            FindEvent::Unreadable(_) => {}
            FindEvent::Done { complete, .. } => {
                if let Some(Dialog::Find {
                    running, truncated, ..
                }) = self.dialogs.top_mut()
                {
                    *running = false;
                    *truncated = !complete;
                }
                self.find_rx = None;
                self.find_cancel = None;
                self.dirty = Dirty::ALL;
            }
        }
    }
}
