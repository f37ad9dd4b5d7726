//! Async filesystem primitives.
//!
//! Listings and metadata run on the blocking pool; file content moves in
//! chunks through tokio I/O so long copies can observe cancellation and
//! report progress. Every failure comes back as a typed [`FsError`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use compact_str::CompactString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tandem_core::entry::{DirEntry, DirListing};
use tandem_core::error::{FsError, FsErrorKind};
use tandem_core::sort::SortSpec;

use crate::platform;

/// Default chunk size for streamed copies.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

// Monotonic version stamp for produced listings.
static LISTING_VERSION: AtomicU64 = AtomicU64::new(0);

/// Read one directory into an unsorted listing.
///
/// Hidden entries are skipped unless `show_hidden`; entries whose metadata
/// cannot be read are skipped rather than failing the listing.
pub async fn list_dir(path: &Path, show_hidden: bool) -> Result<DirListing, FsError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || list_dir_blocking(&path, show_hidden))
        .await
        .map_err(|e| FsError::new(PathBuf::new(), FsErrorKind::Io, e.to_string()))?
}

fn list_dir_blocking(path: &Path, show_hidden: bool) -> Result<DirListing, FsError> {
    let read_dir = fs::read_dir(path).map_err(|e| FsError::io(path, &e))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let Ok(dir_entry) = dir_entry else { continue };
        let entry_path = dir_entry.path();
        let Ok(metadata) = fs::symlink_metadata(&entry_path) else {
            continue;
        };

        let name: CompactString = dir_entry.file_name().to_string_lossy().into();
        let hidden = platform::is_hidden(&name, &metadata);
        if hidden && !show_hidden {
            continue;
        }

        let is_symlink = metadata.is_symlink();
        // For symlinks, classify by the target so directory links navigate.
        let is_dir = if is_symlink {
            fs::metadata(&entry_path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            metadata.is_dir()
        };

        let (owner, group) = platform::owner_group(&metadata);

        entries.push(DirEntry {
            path: entry_path,
            name,
            is_dir,
            is_symlink,
            is_hidden: hidden,
            is_parent: false,
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            owner,
            group,
            mode: platform::mode_bits(&metadata),
        });
    }

    let version = LISTING_VERSION.fetch_add(1, Ordering::Relaxed);
    debug!(path = %path.display(), count = entries.len(), version, "listed directory");

    Ok(DirListing::new(
        path.to_path_buf(),
        entries,
        SortSpec::default(),
        version,
    ))
}

/// Stat a single path into an entry.
pub async fn stat(path: &Path) -> Result<DirEntry, FsError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let metadata = fs::symlink_metadata(&path).map_err(|e| FsError::io(&path, &e))?;
        let name: CompactString = path
            .file_name()
            .map(|n| n.to_string_lossy().into())
            .unwrap_or_else(|| CompactString::const_new("/"));
        let is_symlink = metadata.is_symlink();
        let is_dir = if is_symlink {
            fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            metadata.is_dir()
        };
        let (owner, group) = platform::owner_group(&metadata);

        Ok(DirEntry {
            is_hidden: platform::is_hidden(&name, &metadata),
            is_parent: false,
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            owner,
            group,
            mode: platform::mode_bits(&metadata),
            path,
            name,
            is_dir,
            is_symlink,
        })
    })
    .await
    .map_err(|e| FsError::new(PathBuf::new(), FsErrorKind::Io, e.to_string()))?
}

/// Copy one file in chunks.
///
/// `on_chunk` receives the byte count of each written chunk. The token is
/// checked at every chunk boundary; on cancellation the partial destination
/// is removed and the call returns `Canceled`.
pub async fn copy_file(
    src: &Path,
    dst: &Path,
    chunk_size: usize,
    preserve_timestamps: bool,
    cancel: &CancellationToken,
    mut on_chunk: impl FnMut(u64),
) -> Result<u64, FsError> {
    let mut reader = tokio::fs::File::open(src)
        .await
        .map_err(|e| FsError::io(src, &e))?;
    let mut writer = tokio::fs::File::create(dst)
        .await
        .map_err(|e| FsError::io(dst, &e))?;

    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut copied: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            drop(writer);
            let _ = tokio::fs::remove_file(dst).await;
            return Err(FsError::canceled(src));
        }

        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| FsError::io(src, &e))?;
        if read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..read])
            .await
            .map_err(|e| FsError::io(dst, &e))?;
        copied += read as u64;
        on_chunk(read as u64);
    }

    writer.flush().await.map_err(|e| FsError::io(dst, &e))?;
    drop(writer);

    if preserve_timestamps {
        let src = src.to_path_buf();
        let dst = dst.to_path_buf();
        // Best effort; a copy that cannot carry its mtime is still a copy.
        let _ = tokio::task::spawn_blocking(move || {
            let modified = fs::metadata(&src)?.modified()?;
            fs::File::options()
                .write(true)
                .open(&dst)?
                .set_modified(modified)
        })
        .await;
    }

    Ok(copied)
}

/// Rename within a filesystem. `CrossDevice` signals the caller to fall
/// back to copy + delete.
pub async fn rename(src: &Path, dst: &Path) -> Result<(), FsError> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();

    tokio::task::spawn_blocking(move || {
        fs::rename(&src, &dst).map_err(|e| FsError::io(&src, &e))
    })
    .await
    .map_err(|e| FsError::new(PathBuf::new(), FsErrorKind::Io, e.to_string()))?
}

/// Delete a path.
///
/// Symlinks are removed as links, never followed. Non-empty directories
/// require `recurse`.
pub async fn remove_path(path: &Path, recurse: bool) -> Result<(), FsError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let metadata = fs::symlink_metadata(&path).map_err(|e| FsError::io(&path, &e))?;

        if metadata.is_symlink() || !metadata.is_dir() {
            fs::remove_file(&path).map_err(|e| FsError::io(&path, &e))
        } else if recurse {
            fs::remove_dir_all(&path).map_err(|e| FsError::io(&path, &e))
        } else {
            fs::remove_dir(&path).map_err(|e| FsError::io(&path, &e))
        }
    })
    .await
    .map_err(|e| FsError::new(PathBuf::new(), FsErrorKind::Io, e.to_string()))?
}

/// Create a directory, validating the leaf name first.
pub async fn create_dir(path: &Path, create_parents: bool) -> Result<(), FsError> {
    let leaf = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    platform::validate_name(&leaf).map_err(|reason| FsError::invalid_name(path, reason))?;

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let result = if create_parents {
            fs::create_dir_all(&path)
        } else {
            fs::create_dir(&path)
        };
        result.map_err(|e| FsError::io(&path, &e))
    })
    .await
    .map_err(|e| FsError::new(PathBuf::new(), FsErrorKind::Io, e.to_string()))?
}

/// Recursively compute (file count, byte total) under `sources`.
///
/// Directories contribute their contents; unreadable subtrees count what
/// was visible. Used for progress totals before a bulk operation.
pub async fn measure(sources: Vec<PathBuf>) -> (usize, u64) {
    tokio::task::spawn_blocking(move || {
        let mut files = 0usize;
        let mut bytes = 0u64;
        let mut stack = sources;

        while let Some(path) = stack.pop() {
            let Ok(metadata) = fs::symlink_metadata(&path) else {
                continue;
            };
            if metadata.is_dir() && !metadata.is_symlink() {
                if let Ok(read_dir) = fs::read_dir(&path) {
                    stack.extend(read_dir.flatten().map(|e| e.path()));
                }
            } else {
                files += 1;
                bytes += metadata.len();
            }
        }

        (files, bytes)
    })
    .await
    .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_dir_skips_hidden_by_default() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "visible.txt", b"v");
        write_file(tmp.path(), ".hidden", b"h");

        let listing = list_dir(tmp.path(), false).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.entries[0].name, "visible.txt");

        let listing = list_dir(tmp.path(), true).await.unwrap();
        assert_eq!(listing.len(), 2);
    }

    #[tokio::test]
    async fn test_list_dir_missing_path_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = list_dir(&tmp.path().join("nope"), false).await.unwrap_err();
        assert_eq!(err.kind, FsErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_stat_reports_size_and_kind() {
        let tmp = TempDir::new().unwrap();
        let file = write_file(tmp.path(), "f.bin", &[0u8; 123]);

        let entry = stat(&file).await.unwrap();
        assert!(!entry.is_dir);
        assert_eq!(entry.size, 123);
        assert_eq!(entry.name, "f.bin");
    }

    #[tokio::test]
    async fn test_copy_file_chunks_and_reports() {
        let tmp = TempDir::new().unwrap();
        let src = write_file(tmp.path(), "src.bin", &[7u8; 10_000]);
        let dst = tmp.path().join("dst.bin");

        let mut reported = 0u64;
        let copied = copy_file(
            &src,
            &dst,
            1024,
            false,
            &CancellationToken::new(),
            |chunk| reported += chunk,
        )
        .await
        .unwrap();

        assert_eq!(copied, 10_000);
        assert_eq!(reported, 10_000);
        assert_eq!(fs::read(&dst).unwrap(), vec![7u8; 10_000]);
    }

    #[tokio::test]
    async fn test_copy_file_cancel_removes_partial() {
        let tmp = TempDir::new().unwrap();
        let src = write_file(tmp.path(), "src.bin", &[1u8; 100_000]);
        let dst = tmp.path().join("dst.bin");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = copy_file(&src, &dst, 1024, false, &cancel, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind, FsErrorKind::Canceled);
        assert!(!dst.exists());
    }

    #[tokio::test]
    async fn test_remove_path_requires_recurse_for_nonempty() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("d");
        fs::create_dir(&dir).unwrap();
        write_file(&dir, "inner.txt", b"x");

        assert!(remove_path(&dir, false).await.is_err());
        remove_path(&dir, true).await.unwrap();
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_path_deletes_symlink_not_target() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let target = write_file(tmp.path(), "target.txt", b"t");
        let link = tmp.path().join("link");
        symlink(&target, &link).unwrap();

        remove_path(&link, false).await.unwrap();
        assert!(!link.exists());
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_create_dir_validates_leaf() {
        let tmp = TempDir::new().unwrap();
        let err = create_dir(&tmp.path().join("bad."), false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FsErrorKind::InvalidName);

        create_dir(&tmp.path().join("fine"), false).await.unwrap();
        assert!(tmp.path().join("fine").is_dir());
    }

    #[tokio::test]
    async fn test_measure_walks_directories() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a", &[0u8; 10]);
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write_file(&sub, "b", &[0u8; 20]);

        let (files, bytes) = measure(vec![tmp.path().to_path_buf()]).await;
        assert_eq!(files, 2);
        assert_eq!(bytes, 30);
    }
}
