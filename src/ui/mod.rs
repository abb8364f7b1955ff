mod helpers;
mod overlays;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::types::{MenuKind, PendingAction};
use crate::util::{display_col, to_u16_saturating};
use helpers::{apply_selection_to_spans, clip_spans_by_columns};
use overlays::*;

pub(crate) fn draw(app: &mut App, frame: &mut Frame<'_>) {
    let theme = app.active_theme().clone();
    let size = frame.area();
    let output_height = (size.height / 4).clamp(5, 14);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(output_height),
            Constraint::Length(1),
        ])
        .split(size);
    app.editor_rect = vertical[1];
    app.output_rect = vertical[2];

    draw_menu_bar(app, frame, vertical[0]);
    app.sync_editor_scroll();

    let editor_area = vertical[1];
    let border = if app.session.is_dirty() {
        theme.accent
    } else {
        theme.border
    };
    let editor_block = Block::default()
        .title(format!(" {} ", app.document_label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.editor_bg).fg(theme.fg));
    frame.render_widget(editor_block, editor_area);
    let inner = Rect::new(
        editor_area.x.saturating_add(1),
        editor_area.y.saturating_add(1),
        editor_area.width.saturating_sub(2),
        editor_area.height.saturating_sub(2),
    );
    frame.render_widget(Clear, inner);

    let (cursor_row, _) = app.buffer.cursor_zero_based();
    let inner_w = inner.width as usize;
    let content_width = inner_w.saturating_sub(App::EDITOR_GUTTER_WIDTH as usize);
    let base = Style::default().fg(theme.fg).bg(theme.editor_bg);
    let selection = app.buffer.selection_range();
    let sel_style = Style::default().bg(theme.selection);
    let lines = app.buffer.lines();
    let mut lines_out: Vec<Line> = Vec::with_capacity(inner.height as usize);
    for visual_row in 0..inner.height as usize {
        let row = app.editor_scroll_row + visual_row;
        let Some(line) = lines.get(row) else {
            lines_out.push(Line::from(Span::styled(" ".repeat(inner_w), base)));
            continue;
        };
        let line_num_style = if row == cursor_row {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.fg_muted)
        };
        let mut spans = vec![Span::styled(format!("{:>5} ", row + 1), line_num_style)];
        let mut content = app.highlighter.line_spans(row, line, &theme, base);
        if let Some((start, end)) = selected_columns(selection, row, line) {
            content = apply_selection_to_spans(content, start, end, sel_style);
        }
        spans.extend(clip_spans_by_columns(
            content,
            app.editor_scroll_col,
            content_width,
        ));
        let used: usize = spans.iter().map(|s| s.content.width()).sum();
        if used < inner_w {
            spans.push(Span::styled(" ".repeat(inner_w - used), base));
        }
        lines_out.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines_out).style(base), inner);

    let overlay_open = app.dialog.is_some()
        || app.help_open
        || app.theme_browser_open
        || app.file_picker.open
        || app.menu.open.is_some();
    if !overlay_open
        && let Some(pos) = app.cursor_screen_position()
    {
        frame.set_cursor_position(pos);
    }

    draw_output(app, frame, vertical[2]);
    draw_status(app, frame, vertical[3]);

    if app.completion.open && !overlay_open {
        render_completion_popup(app, frame);
    }
    if app.menu.open.is_some() {
        render_menu(app, frame);
    }
    if app.file_picker.open {
        render_file_picker(app, frame);
    }
    if app.theme_browser_open {
        render_theme_browser(app, frame);
    }
    if app.help_open {
        render_help(app, frame);
    }
    if app.dialog.is_some() {
        render_dialog(app, frame);
    }
}

/// Display columns of `line` covered by the selection. Rows fully inside a
/// multi-line selection are marked to the end of their text.
fn selected_columns(
    selection: Option<((usize, usize), (usize, usize))>,
    row: usize,
    line: &str,
) -> Option<(usize, usize)> {
    let ((sr, sc), (er, ec)) = selection?;
    if row < sr || row > er {
        return None;
    }
    let start = if row == sr { sc } else { 0 };
    let end = if row == er { ec } else { line.chars().count() };
    Some((display_col(line, start), display_col(line, end)))
}

/// Menu titles on the left, the language selector on the right.
fn draw_menu_bar(app: &mut App, frame: &mut Frame<'_>, area: Rect) {
    let theme = app.active_theme().clone();
    let bar = Style::default().fg(theme.fg).bg(theme.panel);
    let mut spans = vec![Span::styled(" ", bar)];
    let mut x = area.x.saturating_add(1);
    app.menu_bar_rects.clear();
    for kind in MenuKind::ALL {
        let label = format!(" {} ", kind.title());
        let width = to_u16_saturating(label.width());
        let style = if app.menu.open == Some(kind) {
            Style::default()
                .fg(theme.accent_fg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            bar
        };
        app.menu_bar_rects
            .push((kind, Rect::new(x, area.y, width, 1)));
        spans.push(Span::styled(label, style));
        x = x.saturating_add(width);
    }

    let selector = format!(" [ {} \u{25be} ] ", app.language.name());
    let selector_width = to_u16_saturating(selector.width());
    let used = x.saturating_sub(area.x);
    let gap = area.width.saturating_sub(used).saturating_sub(selector_width);
    spans.push(Span::styled(" ".repeat(gap as usize), bar));
    app.language_rect = Rect::new(
        area.x.saturating_add(used).saturating_add(gap),
        area.y,
        selector_width.min(area.width.saturating_sub(used)),
        1,
    );
    spans.push(Span::styled(
        selector,
        Style::default()
            .fg(theme.accent)
            .bg(theme.panel)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}

/// Output pane: stderr above stdout, run summary in the title.
fn draw_output(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let theme = app.active_theme();
    let title = if app.output.summary.is_empty() {
        " Output ".to_string()
    } else {
        format!(" Output | {} ", app.output.summary)
    };
    let mut lines: Vec<Line> = Vec::new();
    let err_style = Style::default().fg(theme.error);
    let out_style = Style::default().fg(theme.fg);
    for line in app.output.stderr.lines() {
        lines.push(Line::from(Span::styled(line.replace('\t', "    "), err_style)));
    }
    for line in app.output.stdout.lines() {
        lines.push(Line::from(Span::styled(line.replace('\t', "    "), out_style)));
    }
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((to_u16_saturating(app.output_scroll), 0))
        .style(Style::default().bg(theme.bg).fg(theme.fg))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        );
    frame.render_widget(body, area);
}

fn draw_status(app: &App, frame: &mut Frame<'_>, area: Rect) {
    let theme = app.active_theme();
    let (line, col) = app.buffer.cursor();
    let right = format!("Ln {line}, Col {}  {}  ", col + 1, app.language.name());
    let status_style = if app.pending == PendingAction::Exit {
        Style::default().fg(theme.error).bg(theme.panel)
    } else {
        Style::default().fg(theme.fg).bg(theme.panel)
    };
    let left = format!(" {}", app.status);
    let gap = (area.width as usize)
        .saturating_sub(left.width())
        .saturating_sub(right.width());
    let text = Line::from(vec![
        Span::styled(left, status_style),
        Span::styled(" ".repeat(gap), status_style),
        Span::styled(right, Style::default().fg(theme.fg_muted).bg(theme.panel)),
    ]);
    frame.render_widget(Paragraph::new(text).style(status_style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::language::Language;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::path::PathBuf;

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| draw(app, f)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn app() -> App {
        let config = Config {
            completion_server: Vec::new(),
            ..Config::default()
        };
        App::new(PathBuf::from("/tmp"), config)
    }

    #[test]
    fn draws_menu_bar_and_language_selector() {
        let mut app = app();
        let screen = render(&mut app);
        let first = screen.lines().next().unwrap_or_default();
        assert!(first.contains("File"));
        assert!(first.contains("Run"));
        assert!(first.contains("[ Python"));
        assert_eq!(app.menu_bar_rects.len(), 3);
        assert!(app.language_rect.width > 0);
    }

    #[test]
    fn output_pane_shows_stderr_before_stdout() {
        let mut app = app();
        app.output.stdout = "OUT-LINE\n".to_string();
        app.output.stderr = "ERR-LINE\n".to_string();
        app.output.summary = "Python: exit 1".to_string();
        let screen = render(&mut app);
        let err_at = screen.find("ERR-LINE").expect("stderr shown");
        let out_at = screen.find("OUT-LINE").expect("stdout shown");
        assert!(err_at < out_at);
        assert!(screen.contains("Python: exit 1"));
    }

    #[test]
    fn editor_shows_line_numbers_and_text() {
        let mut app = app();
        app.replace_document("print('hi')\nx = 1");
        app.set_language(Language::Python);
        let screen = render(&mut app);
        assert!(screen.contains("    1 print('hi')"));
        assert!(screen.contains("    2 x = 1"));
        assert!(screen.contains("untitled"));
    }

    #[test]
    fn selection_is_painted_with_theme_selection() {
        let mut app = app();
        app.replace_document("hello");
        app.buffer
            .input(KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT));
        app.buffer
            .input(KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT));
        let selection = app.active_theme().selection;
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");
        let buffer = terminal.backend().buffer();
        // Editor text starts after the border and the gutter, on row 2.
        let x = 1 + App::EDITOR_GUTTER_WIDTH;
        assert_eq!(buffer[(x, 2)].symbol(), "h");
        assert_eq!(buffer[(x, 2)].bg, selection);
        assert_eq!(buffer[(x + 1, 2)].bg, selection);
        assert_ne!(buffer[(x + 2, 2)].bg, selection);
    }

    #[test]
    fn selected_columns_cover_whole_middle_rows() {
        let sel = Some(((0, 2), (2, 1)));
        assert_eq!(selected_columns(sel, 0, "abcd"), Some((2, 4)));
        assert_eq!(selected_columns(sel, 1, "\txy"), Some((0, 6)));
        assert_eq!(selected_columns(sel, 2, "\tz"), Some((0, 4)));
        assert_eq!(selected_columns(sel, 3, "q"), None);
        assert_eq!(selected_columns(None, 0, "q"), None);
    }

    #[test]
    fn dialog_renders_over_everything() {
        let mut app = app();
        app.run_current_file();
        let screen = render(&mut app);
        assert!(screen.contains("Execution Error"));
        assert!(screen.contains("Save your code before running."));
    }
}
