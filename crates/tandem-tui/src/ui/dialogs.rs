//! Modal dialog rendering.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap};
use ratatui::Frame;

use crate::dialog::{Dialog, DialogStack, FindFlags, LineEdit, POLICY_CHOICES};
use crate::menu::MENU;
use crate::theme::UiTheme;
use crate::ui::{centered, format_size, format_timestamp, truncate};

/// Errors listed in a report before "show all".
pub const REPORT_PREVIEW: usize = 8;

/// Context the app hands to dialog rendering.
pub struct DialogEnv {
    /// Display names of all available themes, cycle order.
    pub theme_names: Vec<String>,
    /// Read-only config summary lines for the config screen.
    pub config_summary: Vec<String>,
}

/// Render the dialog stack bottom-to-top so the newest is on top.
pub fn render_dialogs(
    frame: &mut Frame<'_>,
    area: Rect,
    stack: &DialogStack,
    theme: &UiTheme,
    env: &DialogEnv,
) {
    for dialog in stack.iter() {
        render_one(frame, area, dialog, theme, env);
    }
}

fn dialog_block<'a>(title: &'a str, theme: &UiTheme) -> Block<'a> {
    Block::new()
        .borders(Borders::ALL)
        .border_style(theme.dialog_title)
        .title(Span::styled(format!(" {title} "), theme.dialog_title))
        .style(theme.dialog)
}

fn render_frame(frame: &mut Frame<'_>, rect: Rect) {
    Clear.render(rect, frame.buffer_mut());
}

fn input_line<'a>(edit: &'a LineEdit, focused: bool, theme: &UiTheme) -> Line<'a> {
    let style = if focused { theme.cursor } else { theme.input };
    Line::from(vec![
        Span::styled(edit.value.as_str(), theme.input),
        Span::styled(" ", style),
    ])
}

fn flags_line(flags: &FindFlags, theme: &UiTheme) -> Line<'static> {
    let mark = |on: bool| if on { "x" } else { " " };
    Line::styled(
        format!(
            "[{}] subdirs (F2)   [{}] regex (F3)   [{}] case (F4)",
            mark(flags.subdirs),
            mark(flags.regex),
            mark(flags.case_sensitive),
        ),
        theme.text_muted,
    )
}

fn render_one(
    frame: &mut Frame<'_>,
    area: Rect,
    dialog: &Dialog,
    theme: &UiTheme,
    env: &DialogEnv,
) {
    match dialog {
        Dialog::Confirm {
            title,
            message,
            yes_selected,
            ..
        } => {
            let rect = centered(area, 52, 7);
            render_frame(frame, rect);
            let yes = if *yes_selected { "[ Yes ]" } else { "  Yes  " };
            let no = if *yes_selected { "  No  " } else { "[ No ]" };
            let body = vec![
                Line::raw(""),
                Line::raw(message.clone()),
                Line::raw(""),
                Line::styled(format!("   {yes}      {no}"), theme.text),
            ];
            frame.render_widget(
                Paragraph::new(body)
                    .wrap(Wrap { trim: true })
                    .block(dialog_block(title, theme)),
                rect,
            );
        }

        Dialog::Transfer {
            title,
            sources,
            destination,
            policy_index,
            ..
        } => {
            let rect = centered(area, 64, 10);
            render_frame(frame, rect);

            let what = if sources.len() == 1 {
                sources[0].display().to_string()
            } else {
                format!("{} entries", sources.len())
            };
            let mut policies = Vec::new();
            for (i, (_, label)) in POLICY_CHOICES.iter().enumerate() {
                let style = if i == *policy_index {
                    theme.cursor
                } else {
                    theme.text_muted
                };
                policies.push(Span::styled(format!(" {label} "), style));
                policies.push(Span::raw(" "));
            }

            let body = vec![
                Line::raw(format!("{what} to:")),
                input_line(destination, true, theme),
                Line::raw(""),
                Line::styled("On existing files (Tab):", theme.text_muted),
                Line::from(policies),
                Line::raw(""),
                Line::styled("Enter to start, Esc to cancel", theme.text_muted),
            ];
            frame.render_widget(
                Paragraph::new(body).block(dialog_block(title, theme)),
                rect,
            );
        }

        Dialog::Input {
            title,
            edit,
            error,
            ..
        } => {
            let rect = centered(area, 52, 7);
            render_frame(frame, rect);
            let mut body = vec![Line::raw(""), input_line(edit, true, theme)];
            if let Some(error) = error {
                body.push(Line::styled(error.clone(), theme.error));
            }
            frame.render_widget(
                Paragraph::new(body).block(dialog_block(title, theme)),
                rect,
            );
        }

        Dialog::Progress { progress } => {
            let rect = centered(area, 60, 8);
            render_frame(frame, rect);
            let block = dialog_block(progress.verb, theme);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let current = progress
                .current_path
                .as_ref()
                .map(|p| truncate(&p.display().to_string(), inner.width as usize))
                .unwrap_or_default();
            let counts = if progress.bytes_total > 0 {
                format!(
                    "{} / {} files   {} / {}",
                    progress.files_completed,
                    progress.files_total,
                    format_size(progress.bytes_completed),
                    format_size(progress.bytes_total),
                )
            } else {
                format!(
                    "{} / {} files   {}",
                    progress.files_completed,
                    progress.files_total,
                    format_size(progress.bytes_completed),
                )
            };

            let text_area = Rect {
                height: inner.height.saturating_sub(2),
                ..inner
            };
            frame.render_widget(
                Paragraph::new(vec![
                    Line::raw(current),
                    Line::raw(counts),
                    Line::raw(""),
                    Line::styled("Esc to cancel", theme.text_muted),
                ]),
                text_area,
            );

            let gauge_area = Rect {
                y: inner.y + inner.height.saturating_sub(1),
                height: 1,
                ..inner
            };
            frame.render_widget(
                Gauge::default()
                    .gauge_style(theme.progress_bar)
                    .ratio(progress.ratio().clamp(0.0, 1.0)),
                gauge_area,
            );
        }

        Dialog::Find {
            pattern,
            flags,
            results,
            selected,
            running,
            truncated,
        } => {
            let rect = centered(area, 70, 20);
            render_frame(frame, rect);
            let block = dialog_block("Find file", theme);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Pattern: ", theme.text_muted),
                    Span::styled(pattern.value.as_str(), theme.input),
                    Span::styled(" ", theme.cursor),
                ]),
                flags_line(flags, theme),
                Line::raw(""),
            ];

            let list_height = (inner.height as usize).saturating_sub(lines.len() + 1);
            let top = selected.saturating_sub(list_height.saturating_sub(1));
            for (i, path) in results.iter().enumerate().skip(top).take(list_height) {
                let style = if i == *selected {
                    theme.cursor
                } else {
                    theme.text
                };
                lines.push(Line::styled(
                    truncate(&path.display().to_string(), inner.width as usize),
                    style,
                ));
            }

            let state = match (*running, *truncated) {
                (true, _) => "searching…".to_string(),
                (false, true) => format!("{} matches (capped)", results.len()),
                (false, false) => format!("{} matches", results.len()),
            };
            lines.push(Line::styled(state, theme.text_muted));

            frame.render_widget(Paragraph::new(lines), inner);
        }

        Dialog::Report {
            title,
            errors,
            show_all,
        } => {
            let rect = centered(area, 72, 18);
            render_frame(frame, rect);
            let shown = if *show_all {
                errors.len()
            } else {
                errors.len().min(REPORT_PREVIEW)
            };

            let mut lines: Vec<Line<'_>> = errors
                .iter()
                .take(shown)
                .map(|e| Line::styled(truncate(&e.to_string(), 68), theme.error))
                .collect();
            if shown < errors.len() {
                lines.push(Line::styled(
                    format!("… and {} more (Tab to show all)", errors.len() - shown),
                    theme.text_muted,
                ));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled("Enter/Esc to close", theme.text_muted));

            frame.render_widget(
                Paragraph::new(lines).block(dialog_block(title, theme)),
                rect,
            );
        }

        Dialog::QuickView { entry } => {
            let rect = centered(area, 56, 11);
            render_frame(frame, rect);
            let (date, time) = format_timestamp(entry.modified);
            let kind = if entry.is_symlink {
                "symlink"
            } else if entry.is_dir {
                "directory"
            } else {
                "file"
            };
            let mut body = vec![
                Line::raw(format!("Name:     {}", entry.name)),
                Line::raw(format!("Path:     {}", entry.path.display())),
                Line::raw(format!("Kind:     {kind}")),
                Line::raw(format!("Size:     {}", format_size(entry.size))),
                Line::raw(format!("Modified: {date} {time}")),
            ];
            if let Some(mode) = entry.mode {
                body.push(Line::raw(format!(
                    "Mode:     {}",
                    tandem_fs::format_mode(mode)
                )));
            }
            if let Some(owner) = &entry.owner {
                body.push(Line::raw(format!("Owner:    {owner}")));
            }
            frame.render_widget(
                Paragraph::new(body).block(dialog_block("Quick view", theme)),
                rect,
            );
        }

        Dialog::Help => {
            let rect = centered(area, 64, 22);
            render_frame(frame, rect);
            let lines: Vec<Line<'_>> = [
                ("Tab", "switch panel"),
                ("Enter", "enter directory"),
                ("Backspace", "parent directory"),
                ("Alt+Left/Right", "history back / forward"),
                ("Insert / Space", "mark entry"),
                ("+ / - / *", "group select / deselect / invert"),
                ("F3 / Ctrl+Q", "quick view"),
                ("F5 / F6", "copy / move to other panel"),
                ("F7 / F8", "make directory / delete"),
                ("Shift+F8", "delete permanently"),
                ("Ctrl+N", "rename"),
                ("Ctrl+F", "find file"),
                ("Ctrl+R", "refresh"),
                ("Ctrl+H", "toggle hidden files"),
                ("Ctrl+S / Ctrl+V", "cycle sort / view mode"),
                ("Ctrl+T", "cycle theme"),
                ("Ctrl+Z / Ctrl+Y", "undo / redo"),
                ("type letters", "quick search in panel"),
                ("F9", "configuration"),
                ("F10", "quit"),
            ]
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(format!("{key:>16}  "), theme.title),
                    Span::styled(*what, theme.text),
                ])
            })
            .collect();
            frame.render_widget(
                Paragraph::new(lines).block(dialog_block("Help", theme)),
                rect,
            );
        }

        Dialog::Menu { category, item } => {
            let rect = centered(area, 44, 16);
            render_frame(frame, rect);
            let block = dialog_block("Menu", theme);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let mut lines = Vec::new();
            let mut titles = Vec::new();
            for (i, cat) in MENU.iter().enumerate() {
                let style = if i == *category {
                    theme.cursor
                } else {
                    theme.text_muted
                };
                titles.push(Span::styled(format!(" {} ", cat.title), style));
            }
            lines.push(Line::from(titles));
            lines.push(Line::raw(""));

            for (i, entry) in MENU[*category].items.iter().enumerate() {
                let style = if i == *item { theme.cursor } else { theme.text };
                lines.push(Line::styled(format!("  {}", entry.label), style));
            }
            frame.render_widget(Paragraph::new(lines), inner);
        }

        Dialog::Config { tab, theme_index } => {
            let rect = centered(area, 60, 18);
            render_frame(frame, rect);
            let block = dialog_block("Configuration", theme);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let tabs = ["General", "Theme"];
            let mut header = Vec::new();
            for (i, label) in tabs.iter().enumerate() {
                let style = if i == *tab { theme.cursor } else { theme.text_muted };
                header.push(Span::styled(format!(" {label} "), style));
            }

            let mut lines = vec![Line::from(header), Line::raw("")];
            match *tab {
                0 => {
                    for item in &env.config_summary {
                        lines.push(Line::styled(item.clone(), theme.text));
                    }
                    lines.push(Line::raw(""));
                    lines.push(Line::styled(
                        "Settings are edited in config.toml",
                        theme.text_muted,
                    ));
                }
                _ => {
                    for (i, name) in env.theme_names.iter().enumerate() {
                        let style = if i == *theme_index {
                            theme.cursor
                        } else {
                            theme.text
                        };
                        lines.push(Line::styled(format!("  {name}"), style));
                    }
                    lines.push(Line::raw(""));
                    lines.push(Line::styled(
                        "Enter applies the selected theme",
                        theme.text_muted,
                    ));
                }
            }
            frame.render_widget(Paragraph::new(lines), inner);
        }
    }
}
