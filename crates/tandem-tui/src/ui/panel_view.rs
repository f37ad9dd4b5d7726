//! One pane: border, column header, entry rows, footer.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use ratatui::Frame;

use tandem_core::entry::DirEntry;
use tandem_core::view::ViewMode;
use tandem_fs::format_mode;

use crate::panel::{PanelMode, PanelState};
use crate::theme::UiTheme;
use crate::ui::{format_size, format_timestamp, truncate};

/// Rows consumed by the border, header and footer.
pub const PANEL_CHROME_ROWS: u16 = 4;

/// Render one pane into `area`.
pub fn render_panel(frame: &mut Frame<'_>, area: Rect, panel: &PanelState, theme: &UiTheme) {
    let border_style = if panel.active {
        theme.panel_border_active
    } else {
        theme.panel_border_inactive
    };

    let title = truncate(
        &panel.cwd.display().to_string(),
        (area.width as usize).saturating_sub(4),
    );
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {title} "), theme.title));
    let inner = block.inner(area);
    Clear.render(area, frame.buffer_mut());
    frame.render_widget(block, area);

    if inner.height < 3 {
        return;
    }

    // Header, rows, footer.
    let header = Rect { height: 1, ..inner };
    let rows = Rect {
        y: inner.y + 1,
        height: inner.height - 2,
        ..inner
    };
    let footer = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };

    frame.render_widget(
        Paragraph::new(header_line(panel, rows.width)).style(theme.panel),
        header,
    );

    let visible = rows.height as usize;
    let top = panel.scroll.min(panel.listing.len().saturating_sub(1));
    let mut lines: Vec<Line<'_>> = Vec::with_capacity(visible);
    for (offset, entry) in panel
        .listing
        .entries
        .iter()
        .skip(top)
        .take(visible)
        .enumerate()
    {
        let index = top + offset;
        lines.push(entry_line(panel, entry, index, rows.width, theme));
    }
    frame.render_widget(Paragraph::new(lines).style(theme.panel), rows);

    frame.render_widget(
        Paragraph::new(footer_line(panel)).style(theme.panel),
        footer,
    );
}

fn header_line(panel: &PanelState, width: u16) -> Line<'static> {
    let text = match panel.view_mode {
        ViewMode::Brief => format!("{:<width$}", "Name", width = width as usize),
        ViewMode::Full => format!(
            "{:<name$} {:>9} {:>11} {:>5}",
            "Name",
            "Size",
            "Date",
            "Time",
            name = name_width(width, ViewMode::Full),
        ),
        ViewMode::Info => format!(
            "{:<name$} {:>9} {:>11} {:>5} {:>10} {:>8}",
            "Name",
            "Size",
            "Date",
            "Time",
            "Mode",
            "Owner",
            name = name_width(width, ViewMode::Info),
        ),
    };
    Line::raw(text)
}

fn name_width(total: u16, mode: ViewMode) -> usize {
    let fixed = match mode {
        ViewMode::Brief => 0,
        // size + date + time columns with separators
        ViewMode::Full => 9 + 11 + 5 + 3,
        ViewMode::Info => 9 + 11 + 5 + 10 + 8 + 5,
    };
    (total as usize).saturating_sub(fixed).max(8)
}

fn entry_line<'a>(
    panel: &PanelState,
    entry: &'a DirEntry,
    index: usize,
    width: u16,
    theme: &UiTheme,
) -> Line<'a> {
    let is_cursor = panel.active && index == panel.cursor;
    let is_marked = panel.marked.contains(&entry.path);

    let style = match (is_cursor, is_marked) {
        (true, true) => theme.marked_cursor,
        (true, false) => theme.cursor,
        (false, true) => theme.marked,
        (false, false) => entry_style(entry, theme),
    };

    let name_col = name_width(width, panel.view_mode);
    let display_name = decorated_name(entry, name_col);

    let text = match panel.view_mode {
        ViewMode::Brief => format!("{display_name:<name_col$}"),
        ViewMode::Full => {
            let (date, time) = format_timestamp(entry.modified);
            format!(
                "{display_name:<name_col$} {:>9} {:>11} {:>5}",
                size_column(entry),
                date,
                time,
            )
        }
        ViewMode::Info => {
            let (date, time) = format_timestamp(entry.modified);
            let mode = entry
                .mode
                .map(|m| format_mode(m))
                .unwrap_or_default();
            let owner = entry.owner.as_deref().unwrap_or("");
            format!(
                "{display_name:<name_col$} {:>9} {:>11} {:>5} {:>10} {:>8}",
                size_column(entry),
                date,
                time,
                mode,
                owner,
            )
        }
    };

    Line::styled(text, style)
}

fn entry_style(entry: &DirEntry, theme: &UiTheme) -> Style {
    if entry.is_symlink {
        theme.symlink
    } else if entry.is_dir {
        theme.directory
    } else {
        theme.text
    }
}

fn decorated_name(entry: &DirEntry, max: usize) -> String {
    let prefix = if entry.is_parent {
        ""
    } else if entry.is_dir {
        "/"
    } else if entry.is_symlink {
        "~"
    } else {
        " "
    };
    truncate(&format!("{prefix}{}", entry.name), max)
}

fn size_column(entry: &DirEntry) -> String {
    if entry.is_parent {
        "UP--DIR".to_string()
    } else if entry.is_dir {
        "<DIR>".to_string()
    } else {
        format_size(entry.size)
    }
}

fn footer_line(panel: &PanelState) -> Line<'static> {
    if panel.mode == PanelMode::QuickSearching {
        let marker = if panel.quick_search.no_match() {
            " (no match)"
        } else {
            ""
        };
        return Line::raw(format!(
            "Search: {}{marker}",
            panel.quick_search.buffer()
        ));
    }

    let (marked, bytes) = panel.marked_stats();
    let entries = panel
        .listing
        .entries
        .iter()
        .filter(|e| !e.is_parent)
        .count();
    if marked > 0 {
        Line::raw(format!(
            "{marked} marked, {} in {entries} entries",
            format_size(bytes)
        ))
    } else {
        Line::raw(format!("{entries} entries"))
    }
}
