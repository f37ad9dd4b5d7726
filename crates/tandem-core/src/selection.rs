//! Marked-set algebra for group selection.
//!
//! The marked set holds entry paths; every operation here is a pure
//! function of the set and the current listing. The parent `..` row never
//! participates, and the pattern operations follow the files-only rule.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::entry::DirListing;
use crate::glob::glob_match;

/// Toggle the entry at `index` in and out of the marked set.
pub fn toggle(marked: &mut HashSet<PathBuf>, listing: &DirListing, index: usize) {
    let Some(entry) = listing.get(index) else {
        return;
    };
    if entry.is_parent {
        return;
    }
    if !marked.remove(&entry.path) {
        marked.insert(entry.path.clone());
    }
}

/// Mark every file (directories excluded).
pub fn select_all_files(marked: &mut HashSet<PathBuf>, listing: &DirListing) {
    for entry in &listing.entries {
        if !entry.is_dir && !entry.is_parent {
            marked.insert(entry.path.clone());
        }
    }
}

/// Clear the marked set.
pub fn unselect_all(marked: &mut HashSet<PathBuf>) {
    marked.clear();
}

/// Add every file whose name matches `pattern`.
pub fn group_select(
    marked: &mut HashSet<PathBuf>,
    listing: &DirListing,
    pattern: &str,
    case_sensitive: bool,
) {
    for entry in &listing.entries {
        if entry.is_parent || entry.is_dir {
            continue;
        }
        if glob_match(&entry.name, pattern, case_sensitive) {
            marked.insert(entry.path.clone());
        }
    }
}

/// Remove every entry whose name matches `pattern`.
pub fn group_deselect(
    marked: &mut HashSet<PathBuf>,
    listing: &DirListing,
    pattern: &str,
    case_sensitive: bool,
) {
    for entry in &listing.entries {
        if entry.is_parent {
            continue;
        }
        if glob_match(&entry.name, pattern, case_sensitive) {
            marked.remove(&entry.path);
        }
    }
}

/// Invert the selection over files (directories and `..` excluded).
pub fn invert(marked: &mut HashSet<PathBuf>, listing: &DirListing) {
    let mut next = HashSet::with_capacity(listing.len());
    for entry in &listing.entries {
        if entry.is_parent || entry.is_dir {
            continue;
        }
        if !marked.contains(&entry.path) {
            next.insert(entry.path.clone());
        }
    }
    *marked = next;
}

/// Drop marks whose paths are no longer present in `listing`.
pub fn retain_existing(marked: &mut HashSet<PathBuf>, listing: &DirListing) {
    marked.retain(|path| listing.position_of(path).is_some());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DirEntry;
    use crate::sort::SortSpec;
    use std::path::Path;
    use std::time::SystemTime;

    fn entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            path: PathBuf::from("/t").join(name),
            name: name.into(),
            is_dir,
            is_symlink: false,
            is_hidden: false,
            is_parent: false,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            owner: None,
            group: None,
            mode: None,
        }
    }

    fn listing() -> DirListing {
        DirListing::new(
            PathBuf::from("/t"),
            vec![
                DirEntry::parent_link(Path::new("/")),
                entry("a.py", false),
                entry("b.py", false),
                entry("readme.md", false),
                entry("data", true),
            ],
            SortSpec::default(),
            0,
        )
    }

    fn paths(names: &[&str]) -> HashSet<PathBuf> {
        names.iter().map(|n| PathBuf::from("/t").join(n)).collect()
    }

    #[test]
    fn test_toggle_roundtrip() {
        let l = listing();
        let mut marked = HashSet::new();
        toggle(&mut marked, &l, 1);
        assert_eq!(marked, paths(&["a.py"]));
        toggle(&mut marked, &l, 1);
        assert!(marked.is_empty());
    }

    #[test]
    fn test_toggle_ignores_parent_row() {
        let l = listing();
        let mut marked = HashSet::new();
        toggle(&mut marked, &l, 0);
        assert!(marked.is_empty());
    }

    #[test]
    fn test_group_select_files_only() {
        let l = listing();
        let mut marked = HashSet::new();
        group_select(&mut marked, &l, "*", false);
        // `*` selects all files but no directories.
        assert_eq!(marked, paths(&["a.py", "b.py", "readme.md"]));
    }

    #[test]
    fn test_group_select_then_deselect_clears_matches() {
        let l = listing();
        let mut marked = paths(&["readme.md"]);
        group_select(&mut marked, &l, "*.py", false);
        assert_eq!(marked, paths(&["a.py", "b.py", "readme.md"]));
        group_deselect(&mut marked, &l, "*.py", false);
        assert_eq!(marked, paths(&["readme.md"]));
    }

    #[test]
    fn test_invert_twice_restores_file_marks() {
        let l = listing();
        let mut marked = paths(&["a.py"]);
        invert(&mut marked, &l);
        assert_eq!(marked, paths(&["b.py", "readme.md"]));
        invert(&mut marked, &l);
        assert_eq!(marked, paths(&["a.py"]));
    }

    #[test]
    fn test_select_all_files_excludes_dirs() {
        let l = listing();
        let mut marked = HashSet::new();
        select_all_files(&mut marked, &l);
        assert_eq!(marked, paths(&["a.py", "b.py", "readme.md"]));
    }

    #[test]
    fn test_retain_existing_drops_vanished() {
        let l = listing();
        let mut marked = paths(&["a.py", "gone.txt"]);
        retain_existing(&mut marked, &l);
        assert_eq!(marked, paths(&["a.py"]));
    }
}
