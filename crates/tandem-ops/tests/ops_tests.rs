use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tandem_ops::{
    DeleteOptions, Direction, OperationEvent, OperationRequest, OperationSummary, Outcome,
    OverwritePolicy, Pipeline, PipelineConfig, StagingArea, TransferOptions, UndoAction,
};

fn pipeline(staging_root: &Path) -> Pipeline {
    Pipeline::new(PipelineConfig::default(), StagingArea::new(staging_root))
}

fn fast_pipeline(staging_root: &Path, chunk_size: usize) -> Pipeline {
    Pipeline::new(
        PipelineConfig {
            chunk_size,
            // Every chunk reports, so tests observe progress deterministically.
            progress_interval: Duration::ZERO,
            ..PipelineConfig::default()
        },
        StagingArea::new(staging_root),
    )
}

/// Drain an operation's events, returning the summary and whether every
/// progress event was monotonic.
async fn drain(mut rx: mpsc::Receiver<OperationEvent>) -> (OperationSummary, bool) {
    let mut monotonic = true;
    let mut last = (0usize, 0u64);

    loop {
        match rx.recv().await {
            Some(OperationEvent::Progress(p)) => {
                if (p.files_completed, p.bytes_completed) < last {
                    monotonic = false;
                }
                last = (p.files_completed, p.bytes_completed);
            }
            Some(OperationEvent::Done(summary)) => return (summary, monotonic),
            None => panic!("operation ended without a summary"),
        }
    }
}

#[tokio::test]
async fn test_copy_two_files_with_skip_conflict() {
    // Two marked sources, one destination collision resolved as skip.
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    fs::write(a.join("x.txt"), b"0123456789").unwrap();
    fs::write(a.join("y.txt"), b"yyyyyyyyyyyyyyyyyyyy").unwrap();
    fs::write(b.join("y.txt"), b"keep!").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(
            vec![a.join("x.txt"), a.join("y.txt")],
            b.clone(),
            TransferOptions {
                overwrite: OverwritePolicy::Skip,
                ..TransferOptions::default()
            },
        ),
        CancellationToken::new(),
    );
    let (summary, monotonic) = drain(rx).await;

    assert!(monotonic);
    assert_eq!(summary.outcome, Outcome::Success);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(fs::read(b.join("x.txt")).unwrap(), b"0123456789");
    assert_eq!(fs::read(b.join("y.txt")).unwrap(), b"keep!");

    // Undo removes only the copy that did not pre-exist.
    let Some(action @ UndoAction::CopyCreated { .. }) = summary.undo else {
        panic!("copy should be undoable");
    };
    let rx = pipe.start_reversal(action, Direction::Undo, CancellationToken::new());
    let (undo_summary, _) = drain(rx).await;
    assert_eq!(undo_summary.outcome, Outcome::Success);
    assert!(!b.join("x.txt").exists());
    assert_eq!(fs::read(b.join("y.txt")).unwrap(), b"keep!");
}

#[tokio::test]
async fn test_copy_fail_policy_aborts_on_conflict() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    fs::write(src.join("f.txt"), b"new").unwrap();
    fs::write(dst.join("f.txt"), b"old").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(
            vec![src.join("f.txt")],
            dst.clone(),
            TransferOptions::default(), // policy Fail
        ),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Failure);
    assert_eq!(fs::read(dst.join("f.txt")).unwrap(), b"old");
}

#[tokio::test]
async fn test_copy_rename_suffix_policy() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    fs::write(src.join("f.txt"), b"new").unwrap();
    fs::write(dst.join("f.txt"), b"old").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(
            vec![src.join("f.txt")],
            dst.clone(),
            TransferOptions {
                overwrite: OverwritePolicy::RenameSuffix,
                ..TransferOptions::default()
            },
        ),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Success);
    assert_eq!(fs::read(dst.join("f.txt")).unwrap(), b"old");
    assert_eq!(fs::read(dst.join("f (1).txt")).unwrap(), b"new");
}

#[tokio::test]
async fn test_copy_directory_recursive() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("tree");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("top.txt"), b"t").unwrap();
    fs::write(src.join("nested/deep.txt"), b"d").unwrap();
    let dst = tmp.path().join("out");

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(vec![src.clone()], dst.clone(), TransferOptions::default()),
        CancellationToken::new(),
    );
    let (summary, monotonic) = drain(rx).await;

    assert!(monotonic);
    assert_eq!(summary.outcome, Outcome::Success);
    assert_eq!(fs::read(dst.join("tree/top.txt")).unwrap(), b"t");
    assert_eq!(fs::read(dst.join("tree/nested/deep.txt")).unwrap(), b"d");
}

#[tokio::test]
async fn test_cancel_mid_copy_cleans_partial_destination() {
    // A large source with a tiny chunk size gives the token plenty of
    // chunk boundaries to land on.
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    fs::write(src.join("big.bin"), vec![0xAB; 8 * 1024 * 1024]).unwrap();

    let pipe = fast_pipeline(tmp.path(), 4 * 1024);
    let cancel = CancellationToken::new();
    let mut rx = pipe.start(
        OperationRequest::copy(
            vec![src.join("big.bin")],
            dst.clone(),
            TransferOptions::default(),
        ),
        cancel.clone(),
    );

    // Cancel as soon as the first bytes are reported.
    let summary = loop {
        match rx.recv().await.expect("operation must end with a summary") {
            OperationEvent::Progress(p) => {
                if p.bytes_completed > 0 {
                    cancel.cancel();
                }
            }
            OperationEvent::Done(summary) => break summary,
        }
    };

    assert_eq!(summary.outcome, Outcome::Canceled);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 0);
    assert!(!dst.join("big.bin").exists());
}

#[tokio::test]
async fn test_move_records_pairs_and_undoes() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("m.txt"), b"m").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::move_to(vec![src.join("m.txt")], dst.clone(), TransferOptions::default()),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Success);
    assert!(!src.join("m.txt").exists());
    assert!(dst.join("m.txt").exists());
    assert!(summary.affected_dirs.contains(&src));
    assert!(summary.affected_dirs.contains(&dst));

    let action = summary.undo.expect("move should be undoable");
    let rx = pipe.start_reversal(action, Direction::Undo, CancellationToken::new());
    let (undo_summary, _) = drain(rx).await;
    assert_eq!(undo_summary.outcome, Outcome::Success);
    assert!(src.join("m.txt").exists());
    assert!(!dst.join("m.txt").exists());
}

#[tokio::test]
async fn test_move_into_itself_is_refused() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("dir");
    fs::create_dir_all(&dir).unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::move_to(vec![dir.clone()], dir.clone(), TransferOptions::default()),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Failure);
    assert!(dir.exists());
}

#[tokio::test]
async fn test_staged_delete_restores_on_undo() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("doomed.txt"), b"save me").unwrap();

    let staging_root = tmp.path().join("data");
    let pipe = pipeline(&staging_root);
    let rx = pipe.start(
        OperationRequest::delete(vec![work.join("doomed.txt")], DeleteOptions::default()),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Success);
    assert!(!work.join("doomed.txt").exists());

    let Some(action @ UndoAction::DeletedStaged { .. }) = summary.undo else {
        panic!("staged delete should be undoable");
    };
    let rx = pipe.start_reversal(action, Direction::Undo, CancellationToken::new());
    let (undo_summary, _) = drain(rx).await;
    assert_eq!(undo_summary.outcome, Outcome::Success);
    assert_eq!(fs::read(work.join("doomed.txt")).unwrap(), b"save me");
}

#[tokio::test]
async fn test_permanent_delete_is_not_undoable() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("gone.txt"), b"x").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::delete(
            vec![work.join("gone.txt")],
            DeleteOptions {
                recurse: true,
                into_trash: false,
            },
        ),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Success);
    assert!(!work.join("gone.txt").exists());
    assert!(matches!(summary.undo, Some(UndoAction::NotUndoable { .. })));
}

#[tokio::test]
async fn test_delete_partial_failure_accumulates() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("real.txt"), b"x").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::delete(
            vec![work.join("real.txt"), work.join("missing.txt")],
            DeleteOptions {
                recurse: true,
                into_trash: false,
            },
        ),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Partial);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
}

#[tokio::test]
async fn test_rename_undo_redo_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("a");
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("old.txt"), b"content").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::rename(work.join("old.txt"), "new.txt"),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;
    assert_eq!(summary.outcome, Outcome::Success);
    assert!(work.join("new.txt").exists());

    let action = summary.undo.expect("rename should be undoable");
    let rx = pipe.start_reversal(action.clone(), Direction::Undo, CancellationToken::new());
    let (undo_summary, _) = drain(rx).await;
    assert_eq!(undo_summary.outcome, Outcome::Success);
    assert!(work.join("old.txt").exists());
    assert!(!work.join("new.txt").exists());

    let rx = pipe.start_reversal(action, Direction::Redo, CancellationToken::new());
    let (redo_summary, _) = drain(rx).await;
    assert_eq!(redo_summary.outcome, Outcome::Success);
    assert!(work.join("new.txt").exists());
    assert!(!work.join("old.txt").exists());
}

#[tokio::test]
async fn test_rename_to_existing_name_fails_before_io() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("a");
    fs::create_dir_all(&work).unwrap();
    fs::write(work.join("one.txt"), b"1").unwrap();
    fs::write(work.join("two.txt"), b"2").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::rename(work.join("one.txt"), "two.txt"),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Failure);
    assert_eq!(fs::read(work.join("two.txt")).unwrap(), b"2");
    assert!(work.join("one.txt").exists());
}

#[tokio::test]
async fn test_rename_invalid_name_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("f.txt"), b"x").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::rename(tmp.path().join("f.txt"), "bad/name"),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;
    assert_eq!(summary.outcome, Outcome::Failure);
    assert!(tmp.path().join("f.txt").exists());
}

#[tokio::test]
async fn test_mkdir_undo_only_while_empty() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("made");

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::mkdir(dir.clone(), false),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;
    assert_eq!(summary.outcome, Outcome::Success);
    assert!(dir.is_dir());

    // Something lands inside before the undo.
    fs::write(dir.join("occupant.txt"), b"here").unwrap();
    let action = summary.undo.expect("mkdir should be undoable");
    let rx = pipe.start_reversal(action, Direction::Undo, CancellationToken::new());
    let (undo_summary, _) = drain(rx).await;

    assert_eq!(undo_summary.outcome, Outcome::Failure);
    assert!(dir.is_dir(), "occupied directory must survive undo");
}

#[tokio::test]
async fn test_affected_dirs_cover_parents() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("f.txt"), b"f").unwrap();

    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(vec![src.join("f.txt")], dst.clone(), TransferOptions::default()),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;

    assert_eq!(summary.outcome, Outcome::Success);
    assert!(summary.affected_dirs.contains(&dst));
}

#[tokio::test]
async fn test_empty_source_list_completes_immediately() {
    let tmp = TempDir::new().unwrap();
    let pipe = pipeline(tmp.path());
    let rx = pipe.start(
        OperationRequest::copy(
            Vec::new(),
            tmp.path().join("dst"),
            TransferOptions::default(),
        ),
        CancellationToken::new(),
    );
    let (summary, _) = drain(rx).await;
    assert_eq!(summary.outcome, Outcome::Success);
    assert_eq!(summary.succeeded, 0);
}

#[tokio::test]
async fn test_concurrent_sources_all_arrive() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    let sources: Vec<PathBuf> = (0..30)
        .map(|i| {
            let p = src.join(format!("f{i:02}.dat"));
            fs::write(&p, vec![i as u8; 1000]).unwrap();
            p
        })
        .collect();

    let pipe = fast_pipeline(tmp.path(), 128);
    let rx = pipe.start(
        OperationRequest::copy(sources, dst.clone(), TransferOptions::default()),
        CancellationToken::new(),
    );
    let (summary, monotonic) = drain(rx).await;

    assert!(monotonic);
    assert_eq!(summary.succeeded, 30);
    assert_eq!(summary.bytes_processed, 30_000);
    assert_eq!(fs::read_dir(&dst).unwrap().count(), 30);
}
