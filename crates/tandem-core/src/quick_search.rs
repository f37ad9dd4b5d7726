//! Incremental type-to-filter over a panel listing.

use crate::entry::DirListing;

/// Quick-search buffer and its match state.
///
/// Printable keys extend the buffer; each change re-resolves the cursor to
/// the first entry whose name contains the buffer. A buffer that matches
/// nothing leaves the cursor alone and flags `no_match` for the status line.
#[derive(Debug, Clone, Default)]
pub struct QuickSearch {
    buffer: String,
    active: bool,
    no_match: bool,
}

impl QuickSearch {
    /// Enter search mode with an empty buffer.
    pub fn activate(&mut self) {
        self.active = true;
        self.buffer.clear();
        self.no_match = false;
    }

    /// Leave search mode and clear the buffer.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.no_match = false;
    }

    /// Whether search mode is on.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The current buffer, for the status line.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the last edit found no matching entry.
    pub fn no_match(&self) -> bool {
        self.no_match
    }

    /// Append a character and re-resolve.
    ///
    /// Returns the new cursor position, or `None` to keep the current one.
    pub fn push(
        &mut self,
        c: char,
        listing: &DirListing,
        case_sensitive: bool,
    ) -> Option<usize> {
        self.buffer.push(c);
        self.resolve(listing, case_sensitive)
    }

    /// Drop the last character and re-resolve.
    ///
    /// An empty buffer after backspace stays in search mode with no cursor
    /// movement.
    pub fn pop(&mut self, listing: &DirListing, case_sensitive: bool) -> Option<usize> {
        self.buffer.pop();
        if self.buffer.is_empty() {
            self.no_match = false;
            return None;
        }
        self.resolve(listing, case_sensitive)
    }

    /// First entry (from the top) whose name contains the buffer.
    fn resolve(&mut self, listing: &DirListing, case_sensitive: bool) -> Option<usize> {
        let found = find_match(&self.buffer, listing, case_sensitive);
        self.no_match = found.is_none();
        found
    }
}

/// Index of the first non-parent entry whose name contains `needle`.
pub fn find_match(needle: &str, listing: &DirListing, case_sensitive: bool) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let folded_needle;
    let needle = if case_sensitive {
        needle
    } else {
        folded_needle = needle.to_lowercase();
        &folded_needle
    };

    listing.entries.iter().position(|entry| {
        if entry.is_parent {
            return false;
        }
        if case_sensitive {
            entry.name.contains(needle)
        } else {
            entry.name.to_lowercase().contains(needle)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DirEntry;
    use crate::sort::SortSpec;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn listing(names: &[&str]) -> DirListing {
        let entries = names
            .iter()
            .map(|name| DirEntry {
                path: PathBuf::from("/t").join(name),
                name: (*name).into(),
                is_dir: false,
                is_symlink: false,
                is_hidden: false,
                is_parent: false,
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
                owner: None,
                group: None,
                mode: None,
            })
            .collect();
        DirListing::new(PathBuf::from("/t"), entries, SortSpec::default(), 0)
    }

    #[test]
    fn test_incremental_narrowing() {
        let l = listing(&["alpha", "beta", "gamma", "gimel"]);
        let mut qs = QuickSearch::default();
        qs.activate();

        assert_eq!(qs.push('g', &l, false), Some(2)); // gamma
        assert_eq!(qs.push('i', &l, false), Some(3)); // gimel
        assert_eq!(qs.pop(&l, false), Some(2)); // back to gamma
        assert_eq!(qs.buffer(), "g");

        qs.deactivate();
        assert!(qs.buffer().is_empty());
        assert!(!qs.is_active());
    }

    #[test]
    fn test_contains_match_not_prefix() {
        let l = listing(&["report", "export", "note"]);
        // "port" is an infix of the first two; the first from the top wins.
        assert_eq!(find_match("port", &l, false), Some(0));
        assert_eq!(find_match("xport", &l, false), Some(1));
    }

    #[test]
    fn test_no_match_keeps_flag() {
        let l = listing(&["alpha", "beta"]);
        let mut qs = QuickSearch::default();
        qs.activate();
        assert_eq!(qs.push('z', &l, false), None);
        assert!(qs.no_match());
        // Recovering by backspace clears the flag.
        assert_eq!(qs.pop(&l, false), None);
        assert!(!qs.no_match());
    }

    #[test]
    fn test_case_policy() {
        let l = listing(&["README"]);
        assert_eq!(find_match("read", &l, false), Some(0));
        assert_eq!(find_match("read", &l, true), None);
    }
}
