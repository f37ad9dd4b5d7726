//! Panel view modes and their column projections.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoEnumIterator};

/// How a panel projects a listing into columns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, FromRepr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Name, size, date and time columns.
    #[default]
    Full,
    /// Name only, flowed into multiple columns.
    Brief,
    /// Full plus permissions and owner, where the platform exposes them.
    Info,
}

impl ViewMode {
    /// Next mode (cyclic).
    pub fn next(self) -> Self {
        let next = (self as usize + 1) % Self::iter().count();
        Self::from_repr(next).unwrap_or_default()
    }

    /// Columns shown in this mode, in order.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Full => &[Column::Name, Column::Size, Column::Date, Column::Time],
            Self::Brief => &[Column::Name],
            Self::Info => &[
                Column::Name,
                Column::Size,
                Column::Date,
                Column::Time,
                Column::Mode,
                Column::Owner,
            ],
        }
    }
}

/// A panel column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Size,
    Date,
    Time,
    Mode,
    Owner,
}

impl Column {
    /// Minimum width in cells.
    pub fn min_width(self) -> u16 {
        match self {
            Self::Name => 12,
            Self::Size => 8,
            Self::Date => 10,
            Self::Time => 5,
            Self::Mode => 10,
            Self::Owner => 8,
        }
    }

    /// Whether the column depends on platform-only metadata.
    pub fn platform_dependent(self) -> bool {
        matches!(self, Self::Mode | Self::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_cycle() {
        assert_eq!(ViewMode::Full.next(), ViewMode::Brief);
        assert_eq!(ViewMode::Brief.next(), ViewMode::Info);
        assert_eq!(ViewMode::Info.next(), ViewMode::Full);
    }

    #[test]
    fn test_brief_is_name_only() {
        assert_eq!(ViewMode::Brief.columns(), &[Column::Name]);
    }

    #[test]
    fn test_info_extends_full() {
        let full = ViewMode::Full.columns();
        let info = ViewMode::Info.columns();
        assert_eq!(&info[..full.len()], full);
        assert!(info[full.len()..].iter().all(|c| c.platform_dependent()));
    }
}
