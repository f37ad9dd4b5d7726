//! Rendering: layout, panels, chrome, dialogs.

mod chrome;
mod dialogs;
mod panel_view;

pub use chrome::{render_key_bar, render_menu_bar, render_status};
pub use dialogs::{render_dialogs, DialogEnv};
pub use panel_view::{render_panel, PANEL_CHROME_ROWS};

use std::time::SystemTime;

use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Layout, Rect};

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// `date` and `time` columns for an entry timestamp.
pub fn format_timestamp(time: SystemTime) -> (String, String) {
    let local: DateTime<Local> = time.into();
    (
        local.format("%b %e %Y").to_string(),
        local.format("%H:%M").to_string(),
    )
}

/// A centered box of at most (`width`, `height`) inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let [_, mid_v, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, mid, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(mid_v);
    mid
}

/// Truncate a name to `max` cells with a trailing ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_name", 8), "a_very_…");
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let dialog = centered(area, 40, 10);
        assert!(dialog.width == 40 && dialog.height == 10);
        assert!(dialog.x >= area.x && dialog.right() <= area.right());

        // Oversized requests clamp to the area.
        let huge = centered(area, 200, 50);
        assert!(huge.width <= 80 && huge.height <= 24);
    }
}
