//! Async execution of bulk file operations.
//!
//! Each operation runs as a driver task that fans per-entry subtasks out
//! through a semaphore, aggregates their ticks into monotonic progress,
//! and ends with a single summary event. Conflicts are resolved per entry
//! against the filesystem state at the moment the entry is processed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tandem_core::error::{FsError, FsErrorKind};
use tandem_fs::{adapter, platform};

use crate::conflict::{suffixed_path, OverwritePolicy};
use crate::history::UndoAction;
use crate::progress::{OperationEvent, OperationProgress, OperationSummary};
use crate::request::{DeleteOptions, OperationRequest, TransferOptions};
use crate::staging::StagingArea;
use crate::OPERATION_CHANNEL_SIZE;

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-entry subtasks allowed in flight at once.
    pub max_in_flight: usize,
    /// Chunk size for streamed file content.
    pub chunk_size: usize,
    /// Minimum interval between intra-file progress events.
    pub progress_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 10,
            chunk_size: adapter::DEFAULT_CHUNK_SIZE,
            progress_interval: Duration::from_millis(100),
        }
    }
}

/// Entry point for running operations.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    staging: StagingArea,
}

impl Pipeline {
    /// Pipeline with the given tuning and delete-staging area.
    pub fn new(config: PipelineConfig, staging: StagingArea) -> Self {
        Self { config, staging }
    }

    /// Configured chunk size, for reversal drivers.
    pub(crate) fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Launch an operation; events stream through the returned receiver.
    ///
    /// The caller owns `cancel`; tripping it stops the operation at the
    /// next chunk boundary.
    pub fn start(
        &self,
        request: OperationRequest,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<OperationEvent> {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let config = self.config.clone();
        let staging = self.staging.clone();

        tokio::spawn(async move {
            let summary = match request {
                OperationRequest::Copy {
                    sources,
                    destination,
                    options,
                } => run_transfer(&config, sources, destination, options, false, &cancel, &tx).await,
                OperationRequest::Move {
                    sources,
                    destination,
                    options,
                } => run_transfer(&config, sources, destination, options, true, &cancel, &tx).await,
                OperationRequest::Delete { targets, options } => {
                    run_delete(&config, &staging, targets, options, &cancel, &tx).await
                }
                OperationRequest::Mkdir {
                    path,
                    create_parents,
                } => run_mkdir(path, create_parents).await,
                OperationRequest::Rename { source, new_name } => {
                    run_rename(source, new_name).await
                }
            };

            debug!(verb = summary.verb, outcome = ?summary.outcome, "operation finished");
            let _ = tx.send(OperationEvent::Done(summary)).await;
        });

        rx
    }
}

/// Rate-limited progress sender.
struct Reporter {
    tx: mpsc::Sender<OperationEvent>,
    interval: Duration,
    last: Option<Instant>,
}

impl Reporter {
    fn new(tx: mpsc::Sender<OperationEvent>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            last: None,
        }
    }

    /// Send unless an event went out within the interval.
    async fn maybe(&mut self, progress: &OperationProgress) {
        let due = self
            .last
            .map(|t| t.elapsed() >= self.interval)
            .unwrap_or(true);
        if due {
            self.force(progress).await;
        }
    }

    /// Send unconditionally (subtask boundaries).
    async fn force(&mut self, progress: &OperationProgress) {
        self.last = Some(Instant::now());
        let _ = self
            .tx
            .send(OperationEvent::Progress(progress.clone()))
            .await;
    }
}

/// Byte/file ticks flowing from subtasks to the driver.
pub(crate) enum Tick {
    Bytes(u64),
    FileDone(PathBuf),
    Starting(PathBuf),
}

/// Per-entry result returned by a subtask.
enum EntryOutcome {
    Done {
        dest: PathBuf,
        created: bool,
        bytes: u64,
        /// Original path, for move-pair bookkeeping.
        source: PathBuf,
    },
    Skipped,
    /// Conflict under the Fail policy: the whole operation aborts.
    ConflictAbort(FsError),
    Failed(FsError),
    Canceled,
}

/// Copy or move `sources` into `destination`.
async fn run_transfer(
    config: &PipelineConfig,
    sources: Vec<PathBuf>,
    destination: PathBuf,
    options: TransferOptions,
    is_move: bool,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<OperationEvent>,
) -> OperationSummary {
    let verb = if is_move { "Move" } else { "Copy" };
    let mut summary = OperationSummary::new(verb);
    let source_list = sources.clone();

    if let Err(e) = tokio::fs::create_dir_all(&destination).await {
        summary.record_error(FsError::io(&destination, &e));
        return summary.finish(false);
    }

    // Byte totals are only worth a pre-pass for copies; moves are renames
    // in the common case.
    let (files_total, bytes_total) = if is_move {
        (sources.len(), 0)
    } else {
        adapter::measure(sources.clone()).await
    };
    let mut progress = OperationProgress::new(verb, files_total, bytes_total);
    let mut reporter = Reporter::new(tx.clone(), config.progress_interval);
    reporter.force(&progress).await;

    // Subtasks watch a child token so a Fail-policy conflict can stop the
    // operation without touching the caller's token.
    let abort = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<Tick>();
    let mut join_set = JoinSet::new();

    for source in sources {
        let destination = destination.clone();
        let semaphore = Arc::clone(&semaphore);
        let abort = abort.clone();
        let tick_tx = tick_tx.clone();
        let chunk_size = config.chunk_size;

        join_set.spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return EntryOutcome::Canceled;
            };
            if abort.is_cancelled() {
                return EntryOutcome::Canceled;
            }
            transfer_one(
                source,
                &destination,
                options,
                is_move,
                chunk_size,
                &abort,
                &tick_tx,
            )
            .await
        });
    }
    drop(tick_tx);

    let mut created: Vec<PathBuf> = Vec::new();
    let mut moved_pairs: Vec<(PathBuf, PathBuf)> = Vec::new();

    loop {
        tokio::select! {
            Some(tick) = tick_rx.recv() => {
                apply_tick(&mut progress, tick);
                reporter.maybe(&progress).await;
            }
            joined = join_set.join_next() => {
                let Some(joined) = joined else {
                    break;
                };
                match joined {
                    Ok(EntryOutcome::Done { dest, created: was_created, bytes, source }) => {
                        summary.succeeded += 1;
                        summary.bytes_processed += bytes;
                        summary.touch_dir(dest.parent());
                        if is_move {
                            summary.touch_dir(source.parent());
                            moved_pairs.push((source, dest));
                        } else if was_created {
                            created.push(dest);
                        }
                        reporter.force(&progress).await;
                    }
                    Ok(EntryOutcome::Skipped) => summary.skipped += 1,
                    Ok(EntryOutcome::ConflictAbort(error)) => {
                        summary.record_error(error);
                        abort.cancel();
                    }
                    Ok(EntryOutcome::Failed(error)) => summary.record_error(error),
                    Ok(EntryOutcome::Canceled) => {}
                    Err(join_error) => {
                        warn!(%join_error, "transfer subtask panicked");
                        summary.record_error(FsError::new(
                            PathBuf::new(),
                            FsErrorKind::Io,
                            join_error.to_string(),
                        ));
                    }
                }
            }
        }
    }
    // Late ticks from the final subtasks.
    while let Ok(tick) = tick_rx.try_recv() {
        apply_tick(&mut progress, tick);
    }
    reporter.force(&progress).await;

    let canceled = cancel.is_cancelled();
    summary.undo = if is_move {
        (!moved_pairs.is_empty()).then(|| UndoAction::Moved { pairs: moved_pairs })
    } else {
        (!created.is_empty()).then(|| UndoAction::CopyCreated {
            sources: source_list,
            destination,
            created,
        })
    };

    summary.finish(canceled)
}

fn apply_tick(progress: &mut OperationProgress, tick: Tick) {
    match tick {
        Tick::Bytes(n) => progress.bytes_completed += n,
        Tick::FileDone(path) => {
            progress.files_completed += 1;
            progress.current_path = Some(path);
        }
        Tick::Starting(path) => progress.current_path = Some(path),
    }
}

/// Transfer a single top-level entry, resolving conflicts just in time.
async fn transfer_one(
    source: PathBuf,
    destination: &Path,
    options: TransferOptions,
    is_move: bool,
    chunk_size: usize,
    cancel: &CancellationToken,
    ticks: &mpsc::UnboundedSender<Tick>,
) -> EntryOutcome {
    let Some(file_name) = source.file_name() else {
        return EntryOutcome::Failed(FsError::invalid_name(&source, "source has no name"));
    };
    let mut dest = destination.join(file_name);

    // Refuse to copy or move a directory into itself.
    if platform::is_same_or_below(&dest, &source) {
        return EntryOutcome::Failed(FsError::new(
            &source,
            FsErrorKind::InvalidName,
            "destination is inside the source",
        ));
    }

    let _ = ticks.send(Tick::Starting(source.clone()));

    // Just-in-time conflict resolution.
    let mut created = true;
    if dest.exists() {
        match options.overwrite {
            OverwritePolicy::Fail => {
                return EntryOutcome::ConflictAbort(FsError::new(
                    &dest,
                    FsErrorKind::AlreadyExists,
                    "destination exists",
                ));
            }
            OverwritePolicy::Skip => return EntryOutcome::Skipped,
            OverwritePolicy::Overwrite => {
                created = false;
                if let Err(e) = adapter::remove_path(&dest, true).await {
                    return EntryOutcome::Failed(e);
                }
            }
            OverwritePolicy::RenameSuffix => {
                dest = suffixed_path(&dest);
            }
        }
    }

    let result = if is_move {
        move_tree(&source, &dest, options, chunk_size, cancel, ticks).await
    } else {
        copy_tree(&source, &dest, options, chunk_size, cancel, ticks, true).await
    };

    match result {
        Ok((_, bytes)) => {
            // Move totals are per top-level entry; copy ticks come from the
            // tree walk itself.
            if is_move {
                let _ = ticks.send(Tick::FileDone(dest.clone()));
            }
            EntryOutcome::Done {
                dest,
                created,
                bytes,
                source,
            }
        }
        Err(e) if e.kind == FsErrorKind::Canceled => {
            // A canceled copy must not leave a half-written tree behind.
            if !is_move && created {
                let _ = adapter::remove_path(&dest, true).await;
            }
            EntryOutcome::Canceled
        }
        Err(e) => EntryOutcome::Failed(e),
    }
}

/// Copy a file, symlink or directory tree. Returns (files, bytes).
///
/// `tick_files` is off when the caller counts whole entries instead
/// (moves, staging), so per-file ticks do not overshoot the totals.
pub(crate) async fn copy_tree(
    source: &Path,
    dest: &Path,
    options: TransferOptions,
    chunk_size: usize,
    cancel: &CancellationToken,
    ticks: &mpsc::UnboundedSender<Tick>,
    tick_files: bool,
) -> Result<(usize, u64), FsError> {
    let metadata = tokio::fs::symlink_metadata(source)
        .await
        .map_err(|e| FsError::io(source, &e))?;

    if metadata.is_symlink() && !options.follow_symlinks {
        recreate_symlink(source, dest).await?;
        if tick_files {
            let _ = ticks.send(Tick::FileDone(source.to_path_buf()));
        }
        return Ok((1, 0));
    }

    let is_dir = if metadata.is_symlink() {
        tokio::fs::metadata(source)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    } else {
        metadata.is_dir()
    };

    if !is_dir {
        let ticks_for_file = ticks.clone();
        let bytes = adapter::copy_file(
            source,
            dest,
            chunk_size,
            options.preserve_timestamps,
            cancel,
            move |chunk| {
                let _ = ticks_for_file.send(Tick::Bytes(chunk));
            },
        )
        .await?;
        if tick_files {
            let _ = ticks.send(Tick::FileDone(source.to_path_buf()));
        }
        return Ok((1, bytes));
    }

    // Iterative walk; (source dir, dest dir) pairs still to process.
    let mut files = 0usize;
    let mut bytes = 0u64;
    let mut stack = vec![(source.to_path_buf(), dest.to_path_buf())];

    while let Some((src_dir, dst_dir)) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(FsError::canceled(&src_dir));
        }
        tokio::fs::create_dir_all(&dst_dir)
            .await
            .map_err(|e| FsError::io(&dst_dir, &e))?;

        let mut read_dir = tokio::fs::read_dir(&src_dir)
            .await
            .map_err(|e| FsError::io(&src_dir, &e))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| FsError::io(&src_dir, &e))?
        {
            if cancel.is_cancelled() {
                return Err(FsError::canceled(&src_dir));
            }
            let child_src = entry.path();
            let child_dst = dst_dir.join(entry.file_name());
            let child_meta = tokio::fs::symlink_metadata(&child_src)
                .await
                .map_err(|e| FsError::io(&child_src, &e))?;

            if child_meta.is_symlink() && !options.follow_symlinks {
                recreate_symlink(&child_src, &child_dst).await?;
                if tick_files {
                    let _ = ticks.send(Tick::FileDone(child_src));
                }
                files += 1;
            } else if child_meta.is_dir() {
                stack.push((child_src, child_dst));
            } else {
                let ticks_for_file = ticks.clone();
                let copied = adapter::copy_file(
                    &child_src,
                    &child_dst,
                    chunk_size,
                    options.preserve_timestamps,
                    cancel,
                    move |chunk| {
                        let _ = ticks_for_file.send(Tick::Bytes(chunk));
                    },
                )
                .await?;
                if tick_files {
                    let _ = ticks.send(Tick::FileDone(child_src));
                }
                files += 1;
                bytes += copied;
            }
        }
    }

    Ok((files, bytes))
}

/// Move a tree: rename when possible, copy + delete across devices.
pub(crate) async fn move_tree(
    source: &Path,
    dest: &Path,
    options: TransferOptions,
    chunk_size: usize,
    cancel: &CancellationToken,
    ticks: &mpsc::UnboundedSender<Tick>,
) -> Result<(usize, u64), FsError> {
    match adapter::rename(source, dest).await {
        Ok(()) => Ok((1, 0)),
        Err(e) if e.kind == FsErrorKind::CrossDevice => {
            debug!(source = %source.display(), "cross-device move, falling back to copy");
            let counts = copy_tree(source, dest, options, chunk_size, cancel, ticks, false).await?;
            adapter::remove_path(source, true).await?;
            Ok(counts)
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
async fn recreate_symlink(source: &Path, dest: &Path) -> Result<(), FsError> {
    let target = tokio::fs::read_link(source)
        .await
        .map_err(|e| FsError::io(source, &e))?;
    tokio::fs::symlink(&target, dest)
        .await
        .map_err(|e| FsError::io(dest, &e))
}

#[cfg(not(unix))]
async fn recreate_symlink(source: &Path, _dest: &Path) -> Result<(), FsError> {
    Err(FsError::new(
        source,
        FsErrorKind::Unsupported,
        "symlink copy is not supported on this platform",
    ))
}

/// Delete targets, staging them for undo when requested.
async fn run_delete(
    config: &PipelineConfig,
    staging: &StagingArea,
    targets: Vec<PathBuf>,
    options: DeleteOptions,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<OperationEvent>,
) -> OperationSummary {
    let mut summary = OperationSummary::new("Delete");
    let mut progress = OperationProgress::new("Delete", targets.len(), 0);
    let mut reporter = Reporter::new(tx.clone(), config.progress_interval);
    reporter.force(&progress).await;

    // Staging falls back to permanent deletion when the area is unusable.
    let stage_dir = if options.into_trash {
        match staging.allocate() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "staging unavailable, deleting permanently");
                None
            }
        }
    } else {
        None
    };

    let mut staged_pairs: Vec<(PathBuf, PathBuf)> = Vec::new();

    // Cancellation breaks out instead of returning: entries already staged
    // must still reach the undo record.
    for (index, target) in targets.into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        progress.current_path = Some(target.clone());
        reporter.maybe(&progress).await;

        let result = match &stage_dir {
            Some(stage_dir) => {
                let staged = StagingArea::staged_path(stage_dir, &target, index);
                stage_one(&target, &staged, config.chunk_size, cancel).await.map(|()| {
                    staged_pairs.push((target.clone(), staged));
                })
            }
            None => adapter::remove_path(&target, options.recurse).await,
        };

        match result {
            Ok(()) => {
                summary.succeeded += 1;
                summary.touch_dir(target.parent());
                progress.files_completed += 1;
                reporter.force(&progress).await;
            }
            Err(e) if e.kind == FsErrorKind::Canceled => break,
            Err(e) => summary.record_error(e),
        }
    }

    summary.undo = if summary.succeeded == 0 {
        None
    } else if staged_pairs.is_empty() {
        Some(UndoAction::NotUndoable {
            reason: "entries were deleted permanently".into(),
        })
    } else {
        Some(UndoAction::DeletedStaged {
            pairs: staged_pairs,
        })
    };

    summary.finish(cancel.is_cancelled())
}

/// Move one target into the staging area.
async fn stage_one(
    target: &Path,
    staged: &Path,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<(), FsError> {
    match adapter::rename(target, staged).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind == FsErrorKind::CrossDevice => {
            // Staging lives on another filesystem; copy it over, then drop
            // the original. Ticks go nowhere, deletes count per target.
            let (discard_tx, _discard_rx) = mpsc::unbounded_channel();
            copy_tree(
                target,
                staged,
                TransferOptions {
                    overwrite: OverwritePolicy::Overwrite,
                    preserve_timestamps: true,
                    follow_symlinks: false,
                },
                chunk_size,
                cancel,
                &discard_tx,
                false,
            )
            .await?;
            adapter::remove_path(target, true).await
        }
        Err(e) => Err(e),
    }
}

/// Create a directory.
async fn run_mkdir(path: PathBuf, create_parents: bool) -> OperationSummary {
    let mut summary = OperationSummary::new("Create directory");

    match adapter::create_dir(&path, create_parents).await {
        Ok(()) => {
            summary.succeeded = 1;
            summary.touch_dir(path.parent());
            summary.undo = Some(UndoAction::CreatedDirectory { path });
        }
        Err(e) => summary.record_error(e),
    }

    summary.finish(false)
}

/// Rename a single entry in place.
async fn run_rename(source: PathBuf, new_name: String) -> OperationSummary {
    let mut summary = OperationSummary::new("Rename");

    if let Err(reason) = platform::validate_name(&new_name) {
        summary.record_error(FsError::invalid_name(&source, reason));
        return summary.finish(false);
    }

    let Some(parent) = source.parent().map(Path::to_path_buf) else {
        summary.record_error(FsError::invalid_name(&source, "cannot rename the root"));
        return summary.finish(false);
    };
    let old_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let dest = parent.join(&new_name);

    if dest.exists() && dest != source {
        summary.record_error(FsError::new(
            &dest,
            FsErrorKind::AlreadyExists,
            "an entry with that name exists",
        ));
        return summary.finish(false);
    }

    match adapter::rename(&source, &dest).await {
        Ok(()) => {
            summary.succeeded = 1;
            summary.touch_dir(Some(&parent));
            summary.undo = Some(UndoAction::Renamed {
                parent,
                old_name,
                new_name,
            });
        }
        Err(e) => summary.record_error(e),
    }

    summary.finish(false)
}
