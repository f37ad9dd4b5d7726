//! Running recorded commands backwards (undo) and forwards again (redo).

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tandem_core::error::{FsError, FsErrorKind};
use tandem_fs::adapter;

use crate::conflict::OverwritePolicy;
use crate::history::UndoAction;
use crate::pipeline::{move_tree, Pipeline};
use crate::progress::{OperationEvent, OperationProgress, OperationSummary};
use crate::request::TransferOptions;
use crate::OPERATION_CHANNEL_SIZE;

/// Direction a recorded command is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Run the reverse of the recorded command.
    Undo,
    /// Run the recorded command forward again.
    Redo,
}

impl Pipeline {
    /// Apply a recorded action in the given direction.
    ///
    /// Streams the same events as a regular operation; the summary's undo
    /// field is always `None` because the history stacks, not new records,
    /// track reversals.
    pub fn start_reversal(
        &self,
        action: UndoAction,
        direction: Direction,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<OperationEvent> {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let chunk_size = self.chunk_size();

        tokio::spawn(async move {
            let summary = apply(action, direction, chunk_size, &cancel, &tx).await;
            debug!(?direction, outcome = ?summary.outcome, "reversal finished");
            let _ = tx.send(OperationEvent::Done(summary)).await;
        });

        rx
    }
}

async fn apply(
    action: UndoAction,
    direction: Direction,
    chunk_size: usize,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<OperationEvent>,
) -> OperationSummary {
    let verb = match direction {
        Direction::Undo => "Undo",
        Direction::Redo => "Redo",
    };
    let mut summary = OperationSummary::new(verb);

    match (action, direction) {
        // Copy: undo removes the destinations that did not pre-exist.
        (UndoAction::CopyCreated { created, .. }, Direction::Undo) => {
            step_all(&mut summary, tx, created.len(), verb, |i| created[i].clone(), |path| async move {
                adapter::remove_path(&path, true).await
            })
            .await;
        }
        // Copy: redo re-copies the recorded sources.
        (
            UndoAction::CopyCreated {
                sources,
                destination,
                ..
            },
            Direction::Redo,
        ) => {
            let options = TransferOptions {
                overwrite: OverwritePolicy::Overwrite,
                preserve_timestamps: true,
                follow_symlinks: false,
            };
            let (ticks, _drain) = mpsc::unbounded_channel();
            for source in sources {
                if cancel.is_cancelled() {
                    return summary.finish(true);
                }
                let Some(name) = source.file_name() else {
                    summary.record_error(FsError::invalid_name(&source, "source has no name"));
                    continue;
                };
                let dest = destination.join(name);
                match crate::pipeline::copy_tree(
                    &source, &dest, options, chunk_size, cancel, &ticks, false,
                )
                .await
                {
                    Ok((_, bytes)) => {
                        summary.succeeded += 1;
                        summary.bytes_processed += bytes;
                        summary.touch_dir(dest.parent());
                    }
                    Err(e) if e.kind == FsErrorKind::Canceled => {
                        let _ = adapter::remove_path(&dest, true).await;
                        return summary.finish(true);
                    }
                    Err(e) => summary.record_error(e),
                }
            }
        }
        // Move: undo walks the pairs backwards, redo forwards.
        (UndoAction::Moved { pairs }, direction) => {
            transfer_pairs(&mut summary, tx, pairs, direction, chunk_size, cancel).await;
        }
        // Staged delete: undo restores, redo re-stages.
        (UndoAction::DeletedStaged { pairs }, direction) => {
            transfer_pairs(&mut summary, tx, pairs, direction, chunk_size, cancel).await;
        }
        // Mkdir: undo removes the directory only while it is still empty.
        (UndoAction::CreatedDirectory { path }, Direction::Undo) => {
            match dir_is_empty(&path).await {
                Ok(true) => match adapter::remove_path(&path, false).await {
                    Ok(()) => {
                        summary.succeeded = 1;
                        summary.touch_dir(path.parent());
                    }
                    Err(e) => summary.record_error(e),
                },
                Ok(false) => summary.record_error(FsError::new(
                    &path,
                    FsErrorKind::Unsupported,
                    "directory is no longer empty",
                )),
                Err(e) => summary.record_error(e),
            }
        }
        (UndoAction::CreatedDirectory { path }, Direction::Redo) => {
            match adapter::create_dir(&path, false).await {
                Ok(()) => {
                    summary.succeeded = 1;
                    summary.touch_dir(path.parent());
                }
                Err(e) => summary.record_error(e),
            }
        }
        // Rename: swap names according to direction.
        (
            UndoAction::Renamed {
                parent,
                old_name,
                new_name,
            },
            direction,
        ) => {
            let (from, to) = match direction {
                Direction::Undo => (parent.join(&new_name), parent.join(&old_name)),
                Direction::Redo => (parent.join(&old_name), parent.join(&new_name)),
            };
            match adapter::rename(&from, &to).await {
                Ok(()) => {
                    summary.succeeded = 1;
                    summary.touch_dir(Some(&parent));
                }
                Err(e) => summary.record_error(e),
            }
        }
        (UndoAction::NotUndoable { reason }, _) => {
            summary.record_error(FsError::new(
                PathBuf::new(),
                FsErrorKind::Unsupported,
                reason,
            ));
        }
    }

    summary.finish(cancel.is_cancelled())
}

/// Rename a list of (a, b) pairs in the direction's order.
async fn transfer_pairs(
    summary: &mut OperationSummary,
    tx: &mpsc::Sender<OperationEvent>,
    pairs: Vec<(PathBuf, PathBuf)>,
    direction: Direction,
    chunk_size: usize,
    cancel: &CancellationToken,
) {
    let mut progress = OperationProgress::new(summary.verb, pairs.len(), 0);
    let options = TransferOptions {
        overwrite: OverwritePolicy::Overwrite,
        preserve_timestamps: true,
        follow_symlinks: false,
    };
    let (ticks, _drain) = mpsc::unbounded_channel();

    for (a, b) in pairs {
        if cancel.is_cancelled() {
            return;
        }
        let (from, to) = match direction {
            Direction::Undo => (b, a),
            Direction::Redo => (a, b),
        };
        progress.current_path = Some(from.clone());
        let _ = tx
            .send(OperationEvent::Progress(progress.clone()))
            .await;

        match move_tree(&from, &to, options, chunk_size, cancel, &ticks).await {
            Ok((_, bytes)) => {
                summary.succeeded += 1;
                summary.bytes_processed += bytes;
                summary.touch_dir(from.parent());
                summary.touch_dir(to.parent());
                progress.files_completed += 1;
            }
            Err(e) if e.kind == FsErrorKind::Canceled => return,
            Err(e) => summary.record_error(e),
        }
    }
    let _ = tx.send(OperationEvent::Progress(progress.clone())).await;
}

/// Per-item sequential applier for simple path lists.
async fn step_all<F, Fut>(
    summary: &mut OperationSummary,
    tx: &mpsc::Sender<OperationEvent>,
    count: usize,
    verb: &'static str,
    item: impl Fn(usize) -> PathBuf,
    op: F,
) where
    F: Fn(PathBuf) -> Fut,
    Fut: std::future::Future<Output = Result<(), FsError>>,
{
    let mut progress = OperationProgress::new(verb, count, 0);
    for i in 0..count {
        let path = item(i);
        progress.current_path = Some(path.clone());
        let _ = tx.send(OperationEvent::Progress(progress.clone())).await;

        match op(path.clone()).await {
            Ok(()) => {
                summary.succeeded += 1;
                summary.touch_dir(path.parent());
                progress.files_completed += 1;
            }
            Err(e) => summary.record_error(e),
        }
    }
    let _ = tx.send(OperationEvent::Progress(progress)).await;
}

async fn dir_is_empty(path: &Path) -> Result<bool, FsError> {
    let mut read_dir = tokio::fs::read_dir(path)
        .await
        .map_err(|e| FsError::io(path, &e))?;
    let first = read_dir
        .next_entry()
        .await
        .map_err(|e| FsError::io(path, &e))?;
    Ok(first.is_none())
}
