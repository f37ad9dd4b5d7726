//! Staging area for undoable deletes.
//!
//! Deleted entries are moved (not unlinked) into a per-command directory
//! under the application data dir, so undo can rename them back. The area
//! is pruned on startup once the history that references it is gone.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use tandem_core::error::FsError;

static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Allocator of staging directories for delete commands.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// A staging area rooted at `<data_dir>/trash`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("trash"),
        }
    }

    /// Root of the staging area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh directory for one delete command.
    ///
    /// The name mixes the process id and a counter so concurrent sessions
    /// do not collide.
    pub fn allocate(&self) -> Result<PathBuf, FsError> {
        let n = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = self
            .root
            .join(format!("session-{}-{n}", std::process::id()));
        std::fs::create_dir_all(&dir).map_err(|e| FsError::io(&dir, &e))?;
        debug!(dir = %dir.display(), "allocated staging directory");
        Ok(dir)
    }

    /// The staged location for `original` inside `stage_dir`.
    ///
    /// Flat layout with a counter prefix: restore only needs the recorded
    /// pair, and two deleted entries with equal names cannot collide.
    pub fn staged_path(stage_dir: &Path, original: &Path, index: usize) -> PathBuf {
        let name = original
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        stage_dir.join(format!("{index:04}-{name}"))
    }

    /// Remove staging directories left over from finished sessions.
    pub fn prune(&self) {
        let Ok(read_dir) = std::fs::read_dir(&self.root) else {
            return;
        };
        for entry in read_dir.flatten() {
            let path = entry.path();
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(path = %path.display(), error = %e, "could not prune staging dir");
            }
        }
    }
}
