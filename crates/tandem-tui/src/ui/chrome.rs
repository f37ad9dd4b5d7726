//! Top menu bar, bottom key bar, status line.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::Frame;

use crate::menu::MENU;
use crate::theme::UiTheme;

/// The menu-bar line with category titles.
pub fn render_menu_bar(frame: &mut Frame<'_>, area: Rect, theme: &UiTheme, open: Option<usize>) {
    let mut spans = vec![Span::styled(" ", theme.menu_bar)];
    for (i, category) in MENU.iter().enumerate() {
        let style = if open == Some(i) {
            theme.cursor
        } else {
            theme.menu_bar
        };
        spans.push(Span::styled(format!(" {} ", category.title), style));
    }
    let line = Line::from(spans);
    Paragraph::new(line).style(theme.menu_bar).render(area, frame.buffer_mut());
}

/// The function-key hint bar.
pub fn render_key_bar(frame: &mut Frame<'_>, area: Rect, theme: &UiTheme) {
    const HINTS: [(&str, &str); 10] = [
        ("1", "Help"),
        ("2", "Menu"),
        ("3", "View"),
        ("4", "Edit"),
        ("5", "Copy"),
        ("6", "Move"),
        ("7", "MkDir"),
        ("8", "Delete"),
        ("9", "Config"),
        ("10", "Quit"),
    ];

    let mut spans = Vec::with_capacity(HINTS.len() * 2);
    for (key, label) in HINTS {
        spans.push(Span::styled(format!("{key:>2}"), theme.key_label));
        spans.push(Span::styled(format!("{label:<6}"), theme.key_hint));
    }
    Paragraph::new(Line::from(spans)).render(area, frame.buffer_mut());
}

/// The status line: notice, warning or error text.
pub fn render_status(
    frame: &mut Frame<'_>,
    area: Rect,
    theme: &UiTheme,
    message: Option<&(bool, String)>,
) {
    let line = match message {
        Some((true, text)) => Line::styled(text.clone(), theme.error),
        Some((false, text)) => Line::styled(text.clone(), theme.text),
        None => Line::raw(""),
    };
    Paragraph::new(line).style(theme.status).render(area, frame.buffer_mut());
}
