//! Core types for tandem.
//!
//! This crate provides the value types and pure logic shared across the
//! tandem workspace: directory entries and listings, typed error kinds,
//! sorting and view projections, the selection algebra, quick-search, the
//! directory cache, and the configuration and theme stores.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod glob;
pub mod quick_search;
pub mod selection;
pub mod sort;
pub mod theme;
pub mod view;

pub use cache::{CacheKey, DirCache};
pub use config::{Config, ConfigError, LoadedConfig};
pub use entry::{DirEntry, DirListing};
pub use error::{FsError, FsErrorKind};
pub use glob::glob_match;
pub use quick_search::QuickSearch;
pub use sort::{sort_entries, SortKey, SortSpec};
pub use theme::{Palette, Theme, ThemeError, ThemeStore};
pub use view::{Column, ViewMode};
