//! Application configuration: load, validate, persist.
//!
//! The config lives as TOML under the platform config directory. A missing
//! file yields defaults (written on first save); an unreadable or invalid
//! file degrades to defaults and surfaces a one-time warning instead of
//! failing startup. Saves go through a temp file and an atomic rename.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::sort::{SortKey, SortSpec};
use crate::view::ViewMode;

/// Errors from the config store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// General behavior switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Fallback start path when a panel has none configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_path: Option<PathBuf>,
    /// Show dotfiles and platform-hidden entries.
    pub show_hidden: bool,
    /// Ask before deleting.
    pub confirm_delete: bool,
    /// Ask before overwriting at a copy/move destination.
    pub confirm_overwrite: bool,
    /// Case-sensitive quick-search matching.
    pub quick_search_case_sensitive: bool,
    /// Case-sensitive group-select pattern matching.
    pub group_select_case_sensitive: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_path: None,
            show_hidden: false,
            confirm_delete: true,
            confirm_overwrite: true,
            quick_search_case_sensitive: false,
            group_select_case_sensitive: false,
        }
    }
}

/// Per-panel startup state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_path: Option<PathBuf>,
    pub sort_key: SortKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_ascending: Option<bool>,
    pub view_mode: ViewMode,
}

impl PanelConfig {
    /// The sort spec this panel starts with.
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec {
            key: self.sort_key,
            ascending: self.sort_ascending.unwrap_or(true),
            dirs_first: true,
        }
    }
}

/// Both panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelsConfig {
    pub left: PanelConfig,
    pub right: PanelConfig,
}

/// Directory cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100,
            ttl_seconds: 60,
        }
    }
}

/// Undo/redo history bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

/// Theme selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub current: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            current: "norton_commander".to_string(),
        }
    }
}

/// The persisted configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub panels: PanelsConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
    pub theme: ThemeConfig,
    /// Action-name → chord overrides, e.g. `"panel.copy" = "f5"`.
    pub keybindings: BTreeMap<String, String>,
}

/// Result of loading: the config plus a warning when defaults were forced.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// Set when the file existed but could not be used.
    pub warning: Option<String>,
}

impl Config {
    /// Platform config directory for the application.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("io", "tandem-fm", "tandem")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Platform data directory (logs, delete staging).
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("io", "tandem-fm", "tandem")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// The config file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, degrading to defaults on bad input.
    pub fn load() -> Result<LoadedConfig, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<LoadedConfig, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(LoadedConfig {
                config: Self::default(),
                warning: None,
            });
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match toml::from_str::<Config>(&text) {
            Ok(config) => match config.validate() {
                Ok(()) => Ok(LoadedConfig {
                    config,
                    warning: None,
                }),
                Err(reason) => {
                    warn!(%reason, "config rejected, using defaults");
                    Ok(LoadedConfig {
                        config: Self::default(),
                        warning: Some(format!("config invalid ({reason}); defaults loaded")),
                    })
                }
            },
            Err(e) => {
                warn!(error = %e, "config unparsable, using defaults");
                Ok(LoadedConfig {
                    config: Self::default(),
                    warning: Some(format!("config unreadable ({e}); defaults loaded")),
                })
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Persist atomically: write a temp sibling, then rename over the target.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let tmp = path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(write_err)?;
            file.write_all(text.as_bytes()).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp, path).map_err(write_err)?;

        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Reject values outside their allowed domains.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache.max_entries < 1 {
            return Err("cache.max_entries must be at least 1".into());
        }
        if self.history.max_entries < 1 {
            return Err("history.max_entries must be at least 1".into());
        }
        if self.theme.current.is_empty() {
            return Err("theme.current must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults_without_warning() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(loaded.warning.is_none());
        assert!(loaded.config.general.confirm_delete);
        assert_eq!(loaded.config.cache.max_entries, 100);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.general.show_hidden = true;
        config.panels.left.start_path = Some(PathBuf::from("/srv"));
        config.panels.right.sort_key = SortKey::Size;
        config.theme.current = "solarized".to_string();
        config
            .keybindings
            .insert("panel.copy".into(), "f5".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.warning.is_none());
        assert!(loaded.config.general.show_hidden);
        assert_eq!(
            loaded.config.panels.left.start_path,
            Some(PathBuf::from("/srv"))
        );
        assert_eq!(loaded.config.panels.right.sort_key, SortKey::Size);
        assert_eq!(loaded.config.theme.current, "solarized");
        assert_eq!(
            loaded.config.keybindings.get("panel.copy").map(String::as_str),
            Some("f5")
        );
    }

    #[test]
    fn test_garbage_degrades_to_defaults_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is { not toml").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.warning.is_some());
        assert_eq!(loaded.config.cache.ttl_seconds, 60);
    }

    #[test]
    fn test_out_of_domain_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nmax_entries = 0\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.warning.is_some());
        assert_eq!(loaded.config.cache.max_entries, 100);
    }

    #[test]
    fn test_save_replaces_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        let mut config = Config::default();
        config.general.show_hidden = true;
        config.save_to(&path).unwrap();

        // No temp file left behind.
        assert!(!path.with_extension("toml.tmp").exists());
        assert!(Config::load_from(&path).unwrap().config.general.show_hidden);
    }
}
