//! Filesystem adapter for tandem.
//!
//! Uniform async access to directory listings, metadata and file content,
//! with platform policy (hidden files, ownership, filename rules) kept
//! behind this crate, plus the streaming recursive find.

pub mod adapter;
pub mod find;
pub mod platform;

pub use adapter::{
    copy_file, create_dir, list_dir, measure, remove_path, rename, stat, DEFAULT_CHUNK_SIZE,
};
pub use find::{start_find, FindEvent, FindOptions, FindOptionsBuilder};
pub use platform::{format_mode, validate_name};
