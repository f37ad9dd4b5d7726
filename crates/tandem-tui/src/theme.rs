//! Palette-to-style mapping for the UI.
//!
//! Render code reads styles from here by name; hex literals never appear
//! in widgets, so applying a theme is a single struct swap.

use ratatui::style::{Color, Modifier, Style};

use tandem_core::theme::{parse_hex_color, Theme};

/// Resolved styles for the active theme.
#[derive(Debug, Clone)]
pub struct UiTheme {
    /// Id of the theme this was built from.
    pub id: String,

    pub surface: Style,
    pub panel: Style,
    pub panel_border_active: Style,
    pub panel_border_inactive: Style,
    pub text: Style,
    pub text_muted: Style,
    pub directory: Style,
    pub symlink: Style,
    pub cursor: Style,
    pub marked: Style,
    pub marked_cursor: Style,
    pub title: Style,
    pub status: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
    pub menu_bar: Style,
    pub key_hint: Style,
    pub key_label: Style,
    pub dialog: Style,
    pub dialog_title: Style,
    pub input: Style,
    pub progress_bar: Style,
}

fn color(hex: &str, fallback: Color) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(fallback)
}

impl UiTheme {
    /// Build the style set from a validated theme.
    pub fn from_theme(theme: &Theme) -> Self {
        let p = &theme.palette;
        let primary = color(&p.primary, Color::Blue);
        let accent = color(&p.accent, Color::Cyan);
        let surface = color(&p.surface, Color::Black);
        let panel = color(&p.panel, Color::Black);
        let text = color(&p.text, Color::White);
        let text_muted = color(&p.text_muted, Color::DarkGray);
        let warning = color(&p.warning, Color::Yellow);
        let error = color(&p.error, Color::Red);
        let success = color(&p.success, Color::Green);
        let selection = color(&p.selection, Color::Yellow);
        let selection_text = color(&p.selection_text, Color::Black);

        Self {
            id: theme.id.clone(),

            surface: Style::new().bg(surface).fg(text),
            panel: Style::new().bg(panel).fg(text),
            panel_border_active: Style::new().fg(accent).add_modifier(Modifier::BOLD),
            panel_border_inactive: Style::new().fg(text_muted),
            text: Style::new().fg(text),
            text_muted: Style::new().fg(text_muted),
            directory: Style::new().fg(text).add_modifier(Modifier::BOLD),
            symlink: Style::new().fg(accent),
            cursor: Style::new().bg(selection).fg(selection_text),
            marked: Style::new().fg(warning).add_modifier(Modifier::BOLD),
            marked_cursor: Style::new()
                .bg(selection)
                .fg(selection_text)
                .add_modifier(Modifier::BOLD),
            title: Style::new().fg(accent).add_modifier(Modifier::BOLD),
            status: Style::new().bg(panel).fg(text),
            warning: Style::new().fg(warning),
            error: Style::new().fg(error).add_modifier(Modifier::BOLD),
            success: Style::new().fg(success),
            menu_bar: Style::new().bg(primary).fg(text),
            key_hint: Style::new().bg(accent).fg(selection_text),
            key_label: Style::new().fg(text_muted),
            dialog: Style::new().bg(panel).fg(text),
            dialog_title: Style::new().fg(accent).add_modifier(Modifier::BOLD),
            input: Style::new().bg(surface).fg(text),
            progress_bar: Style::new().fg(accent).bg(surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve_without_fallback() {
        for theme in Theme::builtins() {
            let ui = UiTheme::from_theme(&theme);
            assert_eq!(ui.id, theme.id);
            // The cursor style must carry the selection colors.
            let selection = parse_hex_color(&theme.palette.selection).unwrap();
            assert_eq!(
                ui.cursor.bg,
                Some(Color::Rgb(selection.0, selection.1, selection.2))
            );
        }
    }
}
