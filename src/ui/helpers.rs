use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};
use unicode_width::UnicodeWidthChar;

use crate::theme::Theme;

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Popup of `width` x `height` placed below the anchor cell, or above it
/// when there is no room below. Always clamped to `bounds`.
pub(crate) fn anchored_rect(anchor: (u16, u16), width: u16, height: u16, bounds: Rect) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let (ax, ay) = anchor;
    let below = ay.saturating_add(1);
    let y = if below.saturating_add(height) <= bounds.bottom() {
        below
    } else {
        ay.saturating_sub(height).max(bounds.y)
    };
    let x = ax.min(bounds.right().saturating_sub(width)).max(bounds.x);
    Rect::new(x, y, width, height)
}

pub(crate) fn help_keybind_line<'a>(
    entries: &[(&str, &str)],
    key_style: Style,
    desc_style: Style,
    sep_style: Style,
) -> Line<'a> {
    let mut spans = Vec::new();
    for (i, (key, desc)) in entries.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  |  ", sep_style));
        }
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled(format!(" {desc}"), desc_style));
    }
    Line::from(spans)
}

pub(crate) fn list_item_style(selected: bool, theme: &Theme) -> Style {
    if selected {
        Style::default()
            .fg(theme.accent_fg)
            .bg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg)
    }
}

pub(crate) fn themed_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.panel).fg(theme.fg))
        .border_style(Style::default().fg(theme.accent))
}

/// Keeps the display columns `[skip, skip + width)` of a styled line. A wide
/// character cut by either edge is dropped.
pub(crate) fn clip_spans_by_columns(
    spans: Vec<Span<'static>>,
    skip: usize,
    width: usize,
) -> Vec<Span<'static>> {
    let end = skip + width;
    let mut col = 0usize;
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if col >= end {
            break;
        }
        let mut kept = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if col >= skip && col + w <= end {
                kept.push(ch);
            }
            col += w;
            if col >= end {
                break;
            }
        }
        if !kept.is_empty() {
            out.push(Span::styled(kept, span.style));
        }
    }
    out
}

/// Patches `sel` onto the display columns `[start, end)` of a styled line,
/// splitting spans at the edges.
pub(crate) fn apply_selection_to_spans(
    spans: Vec<Span<'static>>,
    start: usize,
    end: usize,
    sel: Style,
) -> Vec<Span<'static>> {
    if start >= end {
        return spans;
    }
    let mut out = Vec::with_capacity(spans.len() + 2);
    let mut col = 0usize;
    for span in spans {
        let mut run = String::new();
        let mut run_selected = false;
        for ch in span.content.chars() {
            let selected = col >= start && col < end;
            if selected != run_selected && !run.is_empty() {
                let style = if run_selected { span.style.patch(sel) } else { span.style };
                out.push(Span::styled(std::mem::take(&mut run), style));
            }
            run_selected = selected;
            run.push(ch);
            col += ch.width().unwrap_or(0);
        }
        if !run.is_empty() {
            let style = if run_selected { span.style.patch(sel) } else { span.style };
            out.push(Span::styled(run, style));
        }
    }
    out
}
