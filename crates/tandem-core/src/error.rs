//! Typed filesystem error kinds.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a filesystem failure.
///
/// Operations report these as values; nothing in the operation path panics
/// or raises through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsErrorKind {
    /// The path does not exist.
    NotFound,
    /// The destination already exists.
    AlreadyExists,
    /// Permission denied.
    PermissionDenied,
    /// Expected a directory, found something else.
    NotADirectory,
    /// Expected a file, found a directory.
    IsADirectory,
    /// Rename across filesystem boundaries (requires copy + delete).
    CrossDevice,
    /// The name is empty, reserved, or contains disallowed characters.
    InvalidName,
    /// Quota or disk space exhausted.
    QuotaExceeded,
    /// Other I/O failure.
    Io,
    /// The operation was canceled.
    Canceled,
    /// The operation is not supported on this platform.
    Unsupported,
}

impl std::fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::PermissionDenied => "permission denied",
            Self::NotADirectory => "not a directory",
            Self::IsADirectory => "is a directory",
            Self::CrossDevice => "cross-device link",
            Self::InvalidName => "invalid name",
            Self::QuotaExceeded => "quota exceeded",
            Self::Io => "I/O error",
            Self::Canceled => "canceled",
            Self::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// A filesystem failure tied to the path that produced it.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message} ({kind})", .path.display())]
pub struct FsError {
    /// The path that caused the failure.
    pub path: PathBuf,
    /// What went wrong.
    pub kind: FsErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl FsError {
    /// Create an error with an explicit kind.
    pub fn new(path: impl Into<PathBuf>, kind: FsErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Classify a `std::io::Error` for `path`.
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let kind = match source.kind() {
            ErrorKind::NotFound => FsErrorKind::NotFound,
            ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
            ErrorKind::PermissionDenied => FsErrorKind::PermissionDenied,
            ErrorKind::NotADirectory => FsErrorKind::NotADirectory,
            ErrorKind::IsADirectory => FsErrorKind::IsADirectory,
            ErrorKind::CrossesDevices => FsErrorKind::CrossDevice,
            ErrorKind::InvalidFilename | ErrorKind::InvalidInput => FsErrorKind::InvalidName,
            ErrorKind::QuotaExceeded | ErrorKind::StorageFull => FsErrorKind::QuotaExceeded,
            ErrorKind::Unsupported => FsErrorKind::Unsupported,
            ErrorKind::Interrupted => FsErrorKind::Canceled,
            _ => FsErrorKind::Io,
        };

        Self {
            path: path.into(),
            kind,
            message: source.to_string(),
        }
    }

    /// Shorthand for a cancellation error.
    pub fn canceled(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FsErrorKind::Canceled, "operation canceled")
    }

    /// Shorthand for an invalid-name rejection.
    pub fn invalid_name(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, FsErrorKind::InvalidName, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let err = FsError::io(
            "/x",
            &std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind, FsErrorKind::PermissionDenied);

        let err = FsError::io(
            "/x",
            &std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind, FsErrorKind::NotFound);
    }

    #[test]
    fn test_display_includes_path_and_kind() {
        let err = FsError::new("/a/b", FsErrorKind::AlreadyExists, "target exists");
        let text = err.to_string();
        assert!(text.contains("/a/b"));
        assert!(text.contains("already exists"));
    }
}
