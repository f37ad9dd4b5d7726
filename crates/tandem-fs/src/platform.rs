//! Platform policy: hidden files, ownership, filename rules.
//!
//! Everything platform-specific stays behind this module; callers see
//! `Option` fields and plain booleans.

use std::fs::Metadata;
use std::path::Path;

use compact_str::CompactString;

/// Hidden-file detection.
///
/// The leading-dot convention applies everywhere; on Windows the hidden
/// attribute flag is honored as well.
pub fn is_hidden(name: &str, metadata: &Metadata) -> bool {
    if name.starts_with('.') {
        return true;
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
        if metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0 {
            return true;
        }
    }

    #[cfg(not(windows))]
    let _ = metadata;

    false
}

/// Unix permission bits, where exposed.
#[cfg(unix)]
pub fn mode_bits(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.mode())
}

#[cfg(not(unix))]
pub fn mode_bits(_metadata: &Metadata) -> Option<u32> {
    None
}

/// Owner and group, where exposed. Numeric ids are rendered as text; name
/// resolution would drag in a libc lookup per entry.
#[cfg(unix)]
pub fn owner_group(metadata: &Metadata) -> (Option<CompactString>, Option<CompactString>) {
    use std::os::unix::fs::MetadataExt;
    (
        Some(CompactString::from(metadata.uid().to_string())),
        Some(CompactString::from(metadata.gid().to_string())),
    )
}

#[cfg(not(unix))]
pub fn owner_group(_metadata: &Metadata) -> (Option<CompactString>, Option<CompactString>) {
    (None, None)
}

/// Render mode bits as the familiar `rwxr-xr-x` string.
pub fn format_mode(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Validate a single filename component before any I/O.
///
/// Rejects empty names, separators, NUL, `.`/`..`, names that only differ
/// from a Windows reserved device name by extension, and the
/// leading/trailing whitespace and trailing dots that break portability.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name.len() > 255 {
        return Err("name is too long (max 255 bytes)".into());
    }
    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved".into());
    }
    for c in ['/', '\\', '\0'] {
        if name.contains(c) {
            return Err(format!("name cannot contain '{}'", c.escape_default()));
        }
    }
    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("name cannot start or end with a space".into());
    }
    if name.ends_with('.') {
        return Err("name cannot end with a dot".into());
    }

    let reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let base = name.split('.').next().unwrap_or("").to_ascii_uppercase();
    if reserved.contains(&base.as_str()) {
        return Err(format!("'{base}' is a reserved device name"));
    }

    Ok(())
}

/// Whether `candidate` equals `ancestor` or lies below it.
pub fn is_same_or_below(candidate: &Path, ancestor: &Path) -> bool {
    candidate == ancestor || candidate.starts_with(ancestor)
}
