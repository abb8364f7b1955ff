use ratatui::Frame;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, List, ListItem, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::keybinds::KeyAction;
use crate::types::{MenuItem, PickerMode};
use crate::util::to_u16_saturating;

use super::helpers::{
    anchored_rect, centered_rect, help_keybind_line, list_item_style, themed_block,
};

const COMPLETION_MAX_ROWS: usize = 10;
const COMPLETION_MAX_WIDTH: usize = 48;

pub(crate) fn render_menu(app: &mut App, frame: &mut Frame<'_>) {
    let Some(kind) = app.menu.open else {
        return;
    };
    let theme = app.active_theme().clone();
    let items = kind.items();
    let anchor_x = app
        .menu_bar_rects
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or(0, |(_, rect)| rect.x);
    let width = items
        .iter()
        .map(|i| i.label().width())
        .max()
        .unwrap_or(0)
        + 6;
    let height = items.len() + 2;
    let area = anchored_rect(
        (anchor_x, 0),
        to_u16_saturating(width),
        to_u16_saturating(height),
        frame.area(),
    );
    app.menu.rect = area;
    frame.render_widget(Clear, area);
    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let marker = match item {
                MenuItem::Language(lang) if *lang == app.language => "● ",
                _ => "  ",
            };
            ListItem::new(Line::from(Span::styled(
                format!("{marker}{}", item.label()),
                list_item_style(idx == app.menu.index, &theme),
            )))
        })
        .collect();
    let list = List::new(list_items).block(themed_block(&theme));
    frame.render_widget(list, area);
}

pub(crate) fn render_theme_browser(app: &mut App, frame: &mut Frame<'_>) {
    let theme = app.active_theme().clone();
    let area = centered_rect(50, 50, frame.area());
    app.theme_browser_rect = area;
    frame.render_widget(Clear, area);
    let list_items: Vec<ListItem> = app
        .themes
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            let label = format!("{} [{}]", t.name, t.theme_type);
            ListItem::new(Line::from(Span::styled(
                label,
                list_item_style(idx == app.theme_index, &theme),
            )))
        })
        .collect();
    let list =
        List::new(list_items).block(themed_block(&theme).title("Theme Picker (Live Preview)"));
    frame.render_widget(list, area);
}

pub(crate) fn render_file_picker(app: &mut App, frame: &mut Frame<'_>) {
    let theme = app.active_theme().clone();
    let area = centered_rect(70, 70, frame.area());
    app.file_picker.rect = area;
    frame.render_widget(Clear, area);
    let muted = Style::default().fg(theme.fg_muted);
    let input_label = match app.file_picker.mode {
        PickerMode::Open => "Path: ",
        PickerMode::SaveAs => "Name: ",
    };
    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Dir:  ", muted),
            Span::styled(app.file_picker.dir.display().to_string(), muted),
        ]),
        Line::from(vec![
            Span::styled(input_label, muted),
            Span::styled(app.file_picker.input.clone(), Style::default().fg(theme.fg)),
        ]),
    ];
    let visible = area.height.saturating_sub(5).max(1) as usize;
    let start = app.file_picker_scroll();
    if app.file_picker.entries.is_empty() {
        lines.push(Line::from(Span::styled("No matching files", muted)));
    }
    for (idx, entry) in app
        .file_picker
        .entries
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
    {
        let label = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let style = if idx == app.file_picker.index {
            list_item_style(true, &theme)
        } else if entry.is_dir {
            Style::default().fg(theme.accent)
        } else {
            list_item_style(false, &theme)
        };
        lines.push(Line::from(Span::styled(label, style)));
    }
    while lines.len() < visible + 2 {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("Filter: ", muted),
        Span::styled(app.file_picker.filter.label(), Style::default().fg(theme.fg)),
        Span::styled("   Tab: next filter   Enter: accept   Esc: cancel", muted),
    ]));
    let paragraph = Paragraph::new(lines).block(
        themed_block(&theme).title(app.file_picker.mode.title()),
    );
    frame.render_widget(paragraph, area);

    let cursor_x = area
        .x
        .saturating_add(1)
        .saturating_add(to_u16_saturating(input_label.len() + app.file_picker.input.width()));
    if cursor_x < area.right().saturating_sub(1) {
        frame.set_cursor_position((cursor_x, area.y + 2));
    }
}

/// Popup under the cursor cell listing candidate names.
pub(crate) fn render_completion_popup(app: &mut App, frame: &mut Frame<'_>) {
    let Some(anchor) = app.cursor_screen_position() else {
        return;
    };
    let theme = app.active_theme().clone();
    let label_width = app
        .completion
        .items
        .iter()
        .map(|c| c.name.width() + c.detail.as_deref().map_or(0, |d| d.width() + 2))
        .max()
        .unwrap_or(0)
        .min(COMPLETION_MAX_WIDTH);
    let rows = app.completion.items.len().min(COMPLETION_MAX_ROWS);
    let area = anchored_rect(
        anchor,
        to_u16_saturating(label_width + 2),
        to_u16_saturating(rows + 2),
        frame.area(),
    );
    app.completion.rect = area;
    frame.render_widget(Clear, area);
    let start = app.completion.first_visible();
    let muted = Style::default().fg(theme.fg_muted);
    let list_items: Vec<ListItem> = app
        .completion
        .items
        .iter()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(idx, item)| {
            let selected = idx == app.completion.index;
            let mut spans = vec![Span::styled(
                item.name.clone(),
                list_item_style(selected, &theme),
            )];
            if let Some(detail) = &item.detail {
                let style = if selected {
                    list_item_style(true, &theme)
                } else {
                    muted
                };
                spans.push(Span::styled(format!("  {detail}"), style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let list = List::new(list_items).block(themed_block(&theme));
    frame.render_widget(list, area);
}

pub(crate) fn render_dialog(app: &App, frame: &mut Frame<'_>) {
    let Some(dialog) = app.dialog.as_ref() else {
        return;
    };
    let theme = app.active_theme();
    let area = centered_rect(56, 30, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(Span::styled(
            dialog.message.clone(),
            Style::default().fg(theme.fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[ OK ]  Enter / Esc",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            themed_block(theme)
                .title(dialog.title.clone())
                .border_style(Style::default().fg(theme.error)),
        );
    frame.render_widget(body, area);
}

pub(crate) fn render_help(app: &App, frame: &mut Frame<'_>) {
    let theme = app.active_theme();
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let kb = &app.keybinds;
    let heading = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);
    let key_s = Style::default().fg(theme.accent);
    let desc_s = Style::default().fg(theme.fg);
    let sep_s = Style::default().fg(theme.fg_muted);
    let muted = Style::default().fg(theme.fg_muted);

    let pairs = |actions: &[KeyAction]| -> Vec<(String, &'static str)> {
        actions
            .iter()
            .map(|a| (kb.display_for(*a), a.label()))
            .collect()
    };
    let line_for = |entries: Vec<(String, &'static str)>| {
        let borrowed: Vec<(&str, &str)> =
            entries.iter().map(|(k, d)| (k.as_str(), *d)).collect();
        help_keybind_line(&borrowed, key_s, desc_s, sep_s)
    };

    let lines: Vec<Line> = vec![
        Line::from(Span::styled("File", heading)),
        line_for(pairs(&[
            KeyAction::Open,
            KeyAction::Save,
            KeyAction::SaveAs,
            KeyAction::Exit,
        ])),
        Line::from(""),
        Line::from(Span::styled("Run & Language", heading)),
        line_for(pairs(&[
            KeyAction::Run,
            KeyAction::CycleLanguage,
            KeyAction::LanguageMenu,
        ])),
        Line::from(""),
        Line::from(Span::styled("Menus", heading)),
        line_for(pairs(&[
            KeyAction::FileMenu,
            KeyAction::RunMenu,
            KeyAction::ThemePicker,
        ])),
        Line::from(""),
        Line::from(Span::styled("Editor", heading)),
        line_for(pairs(&[
            KeyAction::Completion,
            KeyAction::Undo,
            KeyAction::Redo,
        ])),
        Line::from(Span::styled(
            "Completion popup: Up/Down select, Tab accept, Esc close (Python only)",
            muted,
        )),
        Line::from(Span::styled(
            "Brackets and quotes close themselves; Enter after ':' indents four spaces",
            muted,
        )),
        Line::from(""),
        Line::from(Span::styled("Esc closes this help", muted)),
    ];
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(themed_block(theme).title("Help"));
    frame.render_widget(body, area);
}
