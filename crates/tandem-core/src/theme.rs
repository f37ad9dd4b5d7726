//! Color themes: built-in palettes, custom slots, persistence.
//!
//! Built-in themes ship embedded and are read-only. Two custom slots are
//! stored as JSON files in the config directory's `themes/` folder. The UI
//! reads colors by palette name, never by literal.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Ids of the writable custom slots.
pub const CUSTOM_SLOTS: [&str; 2] = ["custom_1", "custom_2"];

/// Errors from the theme store.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid theme id '{0}'")]
    InvalidId(String),

    #[error("theme '{0}' not found")]
    NotFound(String),

    #[error("theme '{0}' is read-only")]
    ReadOnly(String),

    #[error("invalid color '{value}' for '{field}'")]
    InvalidColor { field: String, value: String },

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

    #[error("malformed theme file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The named colors a theme provides, as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub accent: String,
    pub surface: String,
    pub panel: String,
    pub text: String,
    pub text_muted: String,
    pub warning: String,
    pub error: String,
    pub success: String,
    pub selection: String,
    pub selection_text: String,
}

impl Palette {
    /// All (name, value) pairs, for validation and the config screen.
    pub fn fields(&self) -> [(&'static str, &str); 11] {
        [
            ("primary", &self.primary),
            ("accent", &self.accent),
            ("surface", &self.surface),
            ("panel", &self.panel),
            ("text", &self.text),
            ("text_muted", &self.text_muted),
            ("warning", &self.warning),
            ("error", &self.error),
            ("success", &self.success),
            ("selection", &self.selection),
            ("selection_text", &self.selection_text),
        ]
    }
}

/// A complete theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub display_name: String,
    pub palette: Palette,
}

impl Theme {
    /// Classic blue-and-yellow commander palette.
    pub fn norton_commander() -> Self {
        Self {
            id: "norton_commander".into(),
            display_name: "Norton Commander".into(),
            palette: Palette {
                primary: "#0000AA".into(),
                accent: "#00FFFF".into(),
                surface: "#000055".into(),
                panel: "#0000AA".into(),
                text: "#FFFF77".into(),
                text_muted: "#8888AA".into(),
                warning: "#FFFF00".into(),
                error: "#FF5555".into(),
                success: "#55FF55".into(),
                selection: "#FFFF00".into(),
                selection_text: "#000000".into(),
            },
        }
    }

    /// Neutral dark palette with blue accents.
    pub fn modern_dark() -> Self {
        Self {
            id: "modern_dark".into(),
            display_name: "Modern Dark".into(),
            palette: Palette {
                primary: "#1E90FF".into(),
                accent: "#00CED1".into(),
                surface: "#1A1A1A".into(),
                panel: "#2A2A2A".into(),
                text: "#E0E0E0".into(),
                text_muted: "#888888".into(),
                warning: "#FFA500".into(),
                error: "#FF4444".into(),
                success: "#44FF44".into(),
                selection: "#1E90FF".into(),
                selection_text: "#FFFFFF".into(),
            },
        }
    }

    /// Solarized Dark.
    pub fn solarized() -> Self {
        Self {
            id: "solarized".into(),
            display_name: "Solarized Dark".into(),
            palette: Palette {
                primary: "#268BD2".into(),
                accent: "#2AA198".into(),
                surface: "#002B36".into(),
                panel: "#073642".into(),
                text: "#839496".into(),
                text_muted: "#586E75".into(),
                warning: "#B58900".into(),
                error: "#DC322F".into(),
                success: "#859900".into(),
                selection: "#268BD2".into(),
                selection_text: "#FDF6E3".into(),
            },
        }
    }

    /// Deep blue palette with royal blue accents.
    pub fn midnight_blue() -> Self {
        Self {
            id: "midnight_blue".into(),
            display_name: "Midnight Blue".into(),
            palette: Palette {
                primary: "#4169E1".into(),
                accent: "#6495ED".into(),
                surface: "#191970".into(),
                panel: "#000080".into(),
                text: "#F0F8FF".into(),
                text_muted: "#B0C4DE".into(),
                warning: "#FFD700".into(),
                error: "#FF6347".into(),
                success: "#98FB98".into(),
                selection: "#4169E1".into(),
                selection_text: "#FFFFFF".into(),
            },
        }
    }

    /// Every embedded theme, in cycle order.
    pub fn builtins() -> Vec<Theme> {
        vec![
            Self::norton_commander(),
            Self::modern_dark(),
            Self::solarized(),
            Self::midnight_blue(),
        ]
    }

    /// Reject palettes with malformed colors.
    pub fn validate(&self) -> Result<(), ThemeError> {
        for (field, value) in self.palette.fields() {
            if parse_hex_color(value).is_none() {
                return Err(ThemeError::InvalidColor {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` into (r, g, b).
///
/// The alpha byte is accepted and ignored; terminals have no use for it.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let component = |i: usize| {
                let d = u8::from_str_radix(&hex[i..=i], 16).ok()?;
                Some(d * 17)
            };
            Some((component(0)?, component(1)?, component(2)?))
        }
        6 | 8 => {
            let component = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some((component(0)?, component(2)?, component(4)?))
        }
        _ => None,
    }
}

/// Validate a theme id: conservative charset, bounded length, no traversal.
pub fn is_valid_theme_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Store of built-in themes plus custom slots on disk.
pub struct ThemeStore {
    themes_dir: PathBuf,
    builtins: Vec<Theme>,
    customs: Vec<Theme>,
}

impl ThemeStore {
    /// Open a store rooted at `themes_dir`, loading any valid custom slots.
    pub fn open(themes_dir: PathBuf) -> Self {
        let mut store = Self {
            themes_dir,
            builtins: Theme::builtins(),
            customs: Vec::new(),
        };
        store.reload_customs();
        store
    }

    fn reload_customs(&mut self) {
        self.customs.clear();
        for slot in CUSTOM_SLOTS {
            let path = self.themes_dir.join(format!("{slot}.json"));
            if !path.exists() {
                continue;
            }
            match Self::read_theme(&path) {
                Ok(theme) if theme.id == slot => self.customs.push(theme),
                Ok(theme) => {
                    warn!(slot, found = %theme.id, "custom theme id does not match its slot, skipping")
                }
                Err(e) => warn!(slot, error = %e, "skipping unreadable custom theme"),
            }
        }
    }

    fn read_theme(path: &Path) -> Result<Theme, ThemeError> {
        let text = fs::read_to_string(path).map_err(|source| ThemeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let theme: Theme = serde_json::from_str(&text).map_err(|source| ThemeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        theme.validate()?;
        Ok(theme)
    }

    /// Look up a theme by id.
    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.builtins
            .iter()
            .chain(self.customs.iter())
            .find(|t| t.id == id)
    }

    /// Every available theme: built-ins first, then occupied custom slots.
    pub fn all(&self) -> impl Iterator<Item = &Theme> {
        self.builtins.iter().chain(self.customs.iter())
    }

    /// The theme following `id` in cycle order (wrapping).
    pub fn next_after(&self, id: &str) -> &Theme {
        let themes: Vec<&Theme> = self.all().collect();
        let position = themes.iter().position(|t| t.id == id);
        match position {
            Some(i) => themes[(i + 1) % themes.len()],
            None => themes[0],
        }
    }

    /// Write a theme into a custom slot.
    ///
    /// The id must be one of [`CUSTOM_SLOTS`]; built-ins are read-only.
    pub fn save_custom(&mut self, theme: &Theme) -> Result<(), ThemeError> {
        if !is_valid_theme_id(&theme.id) {
            return Err(ThemeError::InvalidId(theme.id.clone()));
        }
        if self.builtins.iter().any(|t| t.id == theme.id) {
            return Err(ThemeError::ReadOnly(theme.id.clone()));
        }
        if !CUSTOM_SLOTS.contains(&theme.id.as_str()) {
            return Err(ThemeError::InvalidId(theme.id.clone()));
        }
        theme.validate()?;

        let path = self.themes_dir.join(format!("{}.json", theme.id));
        let write_err = |source| ThemeError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.themes_dir).map_err(write_err)?;
        let text = serde_json::to_string_pretty(theme).map_err(|source| ThemeError::Parse {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(write_err)?;
            file.write_all(text.as_bytes()).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp, &path).map_err(write_err)?;

        info!(id = %theme.id, "custom theme saved");
        self.reload_customs();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(parse_hex_color("#FFF"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#000000"), Some((0, 0, 0)));
        assert_eq!(parse_hex_color("#1E90FF"), Some((0x1E, 0x90, 0xFF)));
        assert_eq!(parse_hex_color("#1E90FF80"), Some((0x1E, 0x90, 0xFF)));
        assert_eq!(parse_hex_color("1E90FF"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_builtins_are_valid() {
        for theme in Theme::builtins() {
            theme.validate().unwrap();
            assert!(is_valid_theme_id(&theme.id));
        }
    }

    #[test]
    fn test_theme_id_validation() {
        assert!(is_valid_theme_id("norton_commander"));
        assert!(is_valid_theme_id("custom_1"));
        assert!(!is_valid_theme_id(""));
        assert!(!is_valid_theme_id("../evil"));
        assert!(!is_valid_theme_id("With Spaces"));
        assert!(!is_valid_theme_id("UPPER"));
        assert!(!is_valid_theme_id(&"x".repeat(65)));
    }

    #[test]
    fn test_cycle_order_wraps() {
        let dir = TempDir::new().unwrap();
        let store = ThemeStore::open(dir.path().to_path_buf());

        assert_eq!(store.next_after("norton_commander").id, "modern_dark");
        assert_eq!(store.next_after("midnight_blue").id, "norton_commander");
        // Unknown id restarts the cycle.
        assert_eq!(store.next_after("nope").id, "norton_commander");
    }

    #[test]
    fn test_custom_slot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = ThemeStore::open(dir.path().to_path_buf());

        let mut theme = Theme::modern_dark();
        theme.id = "custom_1".into();
        theme.display_name = "Mine".into();
        theme.palette.primary = "#ABCDEF".into();
        store.save_custom(&theme).unwrap();

        let loaded = store.get("custom_1").unwrap();
        assert_eq!(loaded.display_name, "Mine");
        assert_eq!(loaded.palette.primary, "#ABCDEF");
        // Custom slots come after built-ins in the cycle.
        assert_eq!(store.next_after("midnight_blue").id, "custom_1");
        assert_eq!(store.next_after("custom_1").id, "norton_commander");
    }

    #[test]
    fn test_builtin_slots_are_read_only() {
        let dir = TempDir::new().unwrap();
        let mut store = ThemeStore::open(dir.path().to_path_buf());
        let theme = Theme::solarized();
        assert!(matches!(
            store.save_custom(&theme),
            Err(ThemeError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_traversal_id_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = ThemeStore::open(dir.path().to_path_buf());
        let mut theme = Theme::modern_dark();
        theme.id = "../../etc/passwd".into();
        assert!(matches!(
            store.save_custom(&theme),
            Err(ThemeError::InvalidId(_))
        ));
    }

    #[test]
    fn test_bad_color_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = ThemeStore::open(dir.path().to_path_buf());
        let mut theme = Theme::modern_dark();
        theme.id = "custom_2".into();
        theme.palette.error = "red".into();
        assert!(matches!(
            store.save_custom(&theme),
            Err(ThemeError::InvalidColor { .. })
        ));
    }
}
