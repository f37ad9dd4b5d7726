//! Destination conflict policy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What to do when a destination entry already exists.
///
/// Resolved per entry, just in time, against the filesystem state at the
/// moment the entry is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Abort the whole operation on the first conflict.
    #[default]
    Fail,
    /// Replace the existing entry.
    Overwrite,
    /// Leave the existing entry and skip the source.
    Skip,
    /// Write under a numeric-suffix name that does not exist yet.
    RenameSuffix,
}

/// First ` (n)`-suffixed sibling of `path` that does not exist.
///
/// `report.txt` becomes `report (1).txt`, then `report (2).txt`, and so on.
pub fn suffixed_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let extension = path.extension().and_then(|e| e.to_str());

    for n in 1u32.. {
        let name = match extension {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("suffix search is unbounded")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_suffix_with_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.txt");
        File::create(&path).unwrap();

        let renamed = suffixed_path(&path);
        assert_eq!(renamed, tmp.path().join("report (1).txt"));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.txt");
        File::create(&path).unwrap();
        File::create(tmp.path().join("report (1).txt")).unwrap();
        File::create(tmp.path().join("report (2).txt")).unwrap();

        assert_eq!(suffixed_path(&path), tmp.path().join("report (3).txt"));
    }

    #[test]
    fn test_suffix_without_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("archive");
        File::create(&path).unwrap();

        assert_eq!(suffixed_path(&path), tmp.path().join("archive (1)"));
    }
}
