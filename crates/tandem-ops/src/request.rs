//! Operation requests accepted by the pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::conflict::OverwritePolicy;

/// Options for copy and move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferOptions {
    /// What to do when the destination already exists.
    pub overwrite: OverwritePolicy,
    /// Carry source mtimes onto copies.
    pub preserve_timestamps: bool,
    /// Follow symlinks instead of copying the link itself.
    pub follow_symlinks: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Fail,
            preserve_timestamps: true,
            follow_symlinks: false,
        }
    }
}

/// Options for delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Delete non-empty directories recursively.
    pub recurse: bool,
    /// Stage into the trash area so the delete can be undone. Falls back
    /// to a plain unlink when staging is unavailable.
    pub into_trash: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            recurse: true,
            into_trash: true,
        }
    }
}

/// A bulk operation to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationRequest {
    /// Copy sources into a destination directory.
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
        options: TransferOptions,
    },
    /// Move sources into a destination directory.
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
        options: TransferOptions,
    },
    /// Delete targets.
    Delete {
        targets: Vec<PathBuf>,
        options: DeleteOptions,
    },
    /// Create a directory.
    Mkdir {
        path: PathBuf,
        create_parents: bool,
    },
    /// Rename a single entry in place.
    Rename { source: PathBuf, new_name: String },
}

impl OperationRequest {
    /// Create a copy request.
    pub fn copy(sources: Vec<PathBuf>, destination: PathBuf, options: TransferOptions) -> Self {
        Self::Copy {
            sources,
            destination,
            options,
        }
    }

    /// Create a move request.
    pub fn move_to(sources: Vec<PathBuf>, destination: PathBuf, options: TransferOptions) -> Self {
        Self::Move {
            sources,
            destination,
            options,
        }
    }

    /// Create a delete request.
    pub fn delete(targets: Vec<PathBuf>, options: DeleteOptions) -> Self {
        Self::Delete { targets, options }
    }

    /// Create a mkdir request.
    pub fn mkdir(path: PathBuf, create_parents: bool) -> Self {
        Self::Mkdir {
            path,
            create_parents,
        }
    }

    /// Create a rename request.
    pub fn rename(source: PathBuf, new_name: impl Into<String>) -> Self {
        Self::Rename {
            source,
            new_name: new_name.into(),
        }
    }

    /// Short verb for logs and the progress dialog title.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "Copy",
            Self::Move { .. } => "Move",
            Self::Delete { .. } => "Delete",
            Self::Mkdir { .. } => "Create directory",
            Self::Rename { .. } => "Rename",
        }
    }
}
