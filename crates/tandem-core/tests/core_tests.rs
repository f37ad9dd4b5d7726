use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use tandem_core::entry::{DirEntry, DirListing};
use tandem_core::quick_search::find_match;
use tandem_core::selection;
use tandem_core::sort::{sort_entries, SortKey, SortSpec};
use tandem_core::{DirCache, Theme};

fn entry(name: &str, is_dir: bool, size: u64) -> DirEntry {
    DirEntry {
        path: PathBuf::from("/base").join(name),
        name: name.into(),
        is_dir,
        is_symlink: false,
        is_hidden: name.starts_with('.'),
        is_parent: false,
        size,
        modified: SystemTime::UNIX_EPOCH,
        owner: None,
        group: None,
        mode: None,
    }
}

fn listing(entries: Vec<DirEntry>) -> DirListing {
    DirListing::new(PathBuf::from("/base"), entries, SortSpec::default(), 1)
}

#[test]
fn test_selection_laws_compose() {
    // group_select(p) then group_deselect(p) leaves nothing matching p,
    // and invert twice restores the file subset of the marks.
    let l = listing(vec![
        entry("a.py", false, 1),
        entry("b.py", false, 1),
        entry("readme.md", false, 1),
        entry("src", true, 0),
    ]);

    let mut marked: HashSet<PathBuf> = [PathBuf::from("/base/readme.md")].into();
    selection::group_select(&mut marked, &l, "*.py", false);
    selection::group_deselect(&mut marked, &l, "*.py", false);
    assert!(marked.iter().all(|p| !p.to_string_lossy().ends_with(".py")));

    let before = marked.clone();
    selection::invert(&mut marked, &l);
    selection::invert(&mut marked, &l);
    assert_eq!(marked, before);
}

#[test]
fn test_quick_search_walkthrough() {
    // Typing narrows, backspace widens, the listing never moves.
    let mut entries = vec![
        entry("alpha", false, 1),
        entry("beta", false, 1),
        entry("gamma", false, 1),
        entry("gimel", false, 1),
    ];
    sort_entries(&mut entries, SortSpec::default());
    let l = listing(entries);

    assert_eq!(find_match("g", &l, false), Some(2));
    assert_eq!(find_match("gi", &l, false), Some(3));
    assert_eq!(find_match("g", &l, false), Some(2));
    assert_eq!(find_match("gx", &l, false), None);
}

#[test]
fn test_sorted_listing_survives_cache_roundtrip() {
    let mut entries = vec![
        entry("zz", false, 10),
        entry("aa", false, 5),
        entry("mid", true, 0),
    ];
    let spec = SortSpec::by(SortKey::Name);
    sort_entries(&mut entries, spec);
    let names: Vec<String> = entries.iter().map(|e| e.name.to_string()).collect();

    let mut cache = DirCache::new(4, Duration::from_secs(60));
    let now = Instant::now();
    let key = (PathBuf::from("/base"), false);
    cache.put(key.clone(), listing(entries).into(), now);

    let cached = cache.get(&key, now).unwrap();
    let cached_names: Vec<String> = cached.entries.iter().map(|e| e.name.to_string()).collect();
    assert_eq!(names, cached_names);

    // Invalidation below the cached path is a miss afterwards.
    cache.invalidate(std::path::Path::new("/base"));
    assert!(cache.get(&key, now).is_none());
}

#[test]
fn test_builtin_theme_palette_is_complete() {
    for theme in Theme::builtins() {
        for (field, value) in theme.palette.fields() {
            assert!(
                tandem_core::theme::parse_hex_color(value).is_some(),
                "{} has bad {field}",
                theme.id
            );
        }
    }
}
