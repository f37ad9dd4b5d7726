//! Ordering policies for directory listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoEnumIterator};

use crate::entry::DirEntry;

/// Primary sort key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, FromRepr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Extension,
    Type,
}

impl SortKey {
    /// Next key (cyclic), for the sort-cycle action.
    pub fn next(self) -> Self {
        let next = (self as usize + 1) % Self::iter().count();
        Self::from_repr(next).unwrap_or_default()
    }
}

/// A complete ordering description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Primary key.
    pub key: SortKey,
    /// Ascending or descending.
    pub ascending: bool,
    /// Group directories ahead of files regardless of the key.
    pub dirs_first: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            ascending: true,
            dirs_first: true,
        }
    }
}

impl SortSpec {
    /// Spec with the given key, ascending, directories first.
    pub fn by(key: SortKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// The same spec with direction flipped.
    pub fn reversed(self) -> Self {
        Self {
            ascending: !self.ascending,
            ..self
        }
    }
}

/// Sort `entries` in place according to `spec`.
///
/// The parent `..` row always sorts first and the direction flag never
/// moves it. With `dirs_first`, directories precede files and symlinks as
/// a group and the key orders within each group.
pub fn sort_entries(entries: &mut [DirEntry], spec: SortSpec) {
    entries.sort_by(|a, b| compare(a, b, spec));
}

/// Total order over entries for `spec`.
pub fn compare(a: &DirEntry, b: &DirEntry, spec: SortSpec) -> Ordering {
    // Parent row is pinned regardless of direction.
    match (a.is_parent, b.is_parent) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    if spec.dirs_first && spec.key != SortKey::Type {
        match (a.is_dir, b.is_dir) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }

    let ord = key_order(a, b, spec.key);
    if spec.ascending {
        ord
    } else {
        ord.reverse()
    }
}

fn key_order(a: &DirEntry, b: &DirEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => name_order(a, b),
        SortKey::Size => a.size.cmp(&b.size).then_with(|| name_order(a, b)),
        SortKey::Modified => a.modified.cmp(&b.modified).then_with(|| name_order(a, b)),
        SortKey::Extension => a
            .extension()
            .cmp(&b.extension())
            .then_with(|| name_order(a, b)),
        SortKey::Type => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| name_order(a, b)),
    }
}

/// Case-insensitive, locale-agnostic name comparison with a tiebreak on
/// the raw name so the order is total.
fn name_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    let fold = |s: &str| s.to_ascii_lowercase();
    fold(&a.name)
        .cmp(&fold(&b.name))
        .then_with(|| a.name.cmp(&b.name))
}

/// Directories, then files, then symlinks.
fn type_rank(e: &DirEntry) -> u8 {
    if e.is_dir {
        0
    } else if !e.is_symlink {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn entry(name: &str, is_dir: bool, size: u64, modified_s: u64) -> DirEntry {
        DirEntry {
            path: PathBuf::from("/t").join(name),
            name: name.into(),
            is_dir,
            is_symlink: false,
            is_hidden: false,
            is_parent: false,
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(modified_s),
            owner: None,
            group: None,
            mode: None,
        }
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_name_sort_dirs_first() {
        let mut entries = vec![
            entry("zeta.txt", false, 1, 0),
            entry("Alpha", true, 0, 0),
            entry("beta.txt", false, 1, 0),
            entry("Gamma", true, 0, 0),
        ];
        sort_entries(&mut entries, SortSpec::default());
        assert_eq!(names(&entries), ["Alpha", "Gamma", "beta.txt", "zeta.txt"]);
    }

    #[test]
    fn test_parent_row_always_first() {
        let parent = DirEntry::parent_link(std::path::Path::new("/"));
        let mut entries = vec![entry("a", false, 1, 0), parent, entry("b", true, 0, 0)];

        for spec in [
            SortSpec::default(),
            SortSpec::default().reversed(),
            SortSpec::by(SortKey::Size).reversed(),
        ] {
            sort_entries(&mut entries, spec);
            assert!(entries[0].is_parent, "parent must lead under {spec:?}");
        }
    }

    #[test]
    fn test_size_sort_descending() {
        let mut entries = vec![
            entry("small", false, 10, 0),
            entry("big", false, 1000, 0),
            entry("mid", false, 100, 0),
        ];
        sort_entries(&mut entries, SortSpec::by(SortKey::Size).reversed());
        assert_eq!(names(&entries), ["big", "mid", "small"]);
    }

    #[test]
    fn test_extension_then_name() {
        let mut entries = vec![
            entry("b.rs", false, 1, 0),
            entry("a.toml", false, 1, 0),
            entry("a.rs", false, 1, 0),
        ];
        sort_entries(&mut entries, SortSpec::by(SortKey::Extension));
        assert_eq!(names(&entries), ["a.rs", "b.rs", "a.toml"]);
    }

    #[test]
    fn test_type_sort_groups() {
        let mut link = entry("link", false, 0, 0);
        link.is_symlink = true;
        let mut entries = vec![entry("file", false, 1, 0), link, entry("dir", true, 0, 0)];
        sort_entries(&mut entries, SortSpec::by(SortKey::Type));
        assert_eq!(names(&entries), ["dir", "file", "link"]);
    }

    #[test]
    fn test_sort_idempotent() {
        let mut entries = vec![
            entry("c", false, 3, 5),
            entry("a", true, 0, 9),
            entry("b", false, 7, 1),
        ];
        let spec = SortSpec::by(SortKey::Modified);
        sort_entries(&mut entries, spec);
        let once = names(&entries).join(",");
        sort_entries(&mut entries, spec);
        assert_eq!(once, names(&entries).join(","));
    }

    #[test]
    fn test_key_cycle() {
        assert_eq!(SortKey::Name.next(), SortKey::Size);
        assert_eq!(SortKey::Type.next(), SortKey::Name);
    }
}
