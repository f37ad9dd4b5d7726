//! Directory entry and listing types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::sort::SortSpec;

/// A single file, directory or symlink in a listing.
///
/// Immutable once produced by the filesystem adapter. The synthetic `..`
/// row a panel prepends is marked with `is_parent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// Display name (final path component, or `..` for the parent row).
    pub name: CompactString,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Whether the entry is a symbolic link.
    pub is_symlink: bool,
    /// Whether the entry is hidden by platform convention.
    pub is_hidden: bool,
    /// Whether this is the synthetic parent (`..`) row.
    pub is_parent: bool,
    /// Size in bytes (0 for directories unless computed).
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Owning user name, where the platform exposes it.
    pub owner: Option<CompactString>,
    /// Owning group name, where the platform exposes it.
    pub group: Option<CompactString>,
    /// Unix permission bits, where the platform exposes them.
    pub mode: Option<u32>,
}

impl DirEntry {
    /// The synthetic `..` row pointing at `parent`.
    pub fn parent_link(parent: &Path) -> Self {
        Self {
            path: parent.to_path_buf(),
            name: CompactString::const_new(".."),
            is_dir: true,
            is_symlink: false,
            is_hidden: false,
            is_parent: true,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            owner: None,
            group: None,
            mode: None,
        }
    }

    /// Whether the entry is a regular file (not a directory, possibly a symlink to one).
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Lowercased extension, empty for directories and dotfiles without one.
    pub fn extension(&self) -> CompactString {
        if self.is_dir {
            return CompactString::const_new("");
        }
        Path::new(self.name.as_str())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase().into())
            .unwrap_or_else(|| CompactString::const_new(""))
    }
}

/// An ordered snapshot of one directory's contents.
#[derive(Debug, Clone)]
pub struct DirListing {
    /// The directory the entries belong to.
    pub path: PathBuf,
    /// Entries in the order produced by `sort`.
    pub entries: Vec<DirEntry>,
    /// The ordering that produced `entries`.
    pub sort: SortSpec,
    /// Monotonic version counter, bumped on every fresh production.
    pub version: u64,
}

impl DirListing {
    /// Create a listing snapshot.
    pub fn new(path: PathBuf, entries: Vec<DirEntry>, sort: SortSpec, version: u64) -> Self {
        Self {
            path,
            entries,
            sort,
            version,
        }
    }

    /// Number of entries, including the parent row if present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the listing has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry with the given path, if present.
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }

    /// Entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortSpec;

    fn file(name: &str) -> DirEntry {
        DirEntry {
            path: PathBuf::from("/tmp").join(name),
            name: name.into(),
            is_dir: false,
            is_symlink: false,
            is_hidden: name.starts_with('.'),
            is_parent: false,
            size: 1,
            modified: SystemTime::UNIX_EPOCH,
            owner: None,
            group: None,
            mode: None,
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("notes.TXT").extension(), "txt");
        assert_eq!(file("archive.tar.gz").extension(), "gz");
        assert_eq!(file("Makefile").extension(), "");
    }

    #[test]
    fn test_parent_link() {
        let parent = DirEntry::parent_link(Path::new("/home"));
        assert!(parent.is_parent);
        assert!(parent.is_dir);
        assert_eq!(parent.name, "..");
        assert_eq!(parent.path, PathBuf::from("/home"));
    }

    #[test]
    fn test_position_of() {
        let listing = DirListing::new(
            PathBuf::from("/tmp"),
            vec![file("a"), file("b")],
            SortSpec::default(),
            0,
        );
        assert_eq!(listing.position_of(Path::new("/tmp/b")), Some(1));
        assert_eq!(listing.position_of(Path::new("/tmp/c")), None);
    }
}
