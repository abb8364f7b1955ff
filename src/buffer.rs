use ratatui::crossterm::event::KeyEvent;
use ratatui_textarea::{CursorMove, Input, TextArea};

use crate::util::{is_ident_char, text_to_lines, to_u16_saturating};

/// The single editable document.
///
/// Positions handed out by [`Buffer::cursor`] use a 1-indexed line and a
/// 0-indexed character column. Internally the text area is 0-indexed.
pub(crate) struct Buffer {
    area: TextArea<'static>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl Buffer {
    pub(crate) fn from_text(text: &str) -> Self {
        Self {
            area: TextArea::from(text_to_lines(text)),
        }
    }

    /// Whole document. Lines are joined with `\n` only, so whatever was split
    /// off by [`text_to_lines`] comes back unchanged.
    pub(crate) fn text(&self) -> String {
        self.area.lines().join("\n")
    }

    pub(crate) fn lines(&self) -> &[String] {
        self.area.lines()
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.area = TextArea::from(text_to_lines(text));
    }

    pub(crate) fn cursor(&self) -> (usize, usize) {
        let (row, col) = self.area.cursor();
        (row + 1, col)
    }

    /// Row/column as stored, both 0-indexed. Used by rendering and LSP.
    pub(crate) fn cursor_zero_based(&self) -> (usize, usize) {
        self.area.cursor()
    }

    pub(crate) fn set_cursor(&mut self, line: usize, col: usize) {
        self.area.move_cursor(CursorMove::Jump(
            to_u16_saturating(line.saturating_sub(1)),
            to_u16_saturating(col),
        ));
    }

    pub(crate) fn insert_str(&mut self, s: &str) -> bool {
        self.area.insert_str(s)
    }

    pub(crate) fn delete_back(&mut self) -> bool {
        self.area.delete_char()
    }

    pub(crate) fn move_back(&mut self) {
        self.area.move_cursor(CursorMove::Back);
    }

    /// Removes the characters between two (line, column) positions, 1-indexed
    /// lines, end exclusive. The cursor lands on `start` and the removal is
    /// undoable.
    pub(crate) fn delete_range(&mut self, start: (usize, usize), end: (usize, usize)) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let from = self.char_offset(start.0.saturating_sub(1), start.1);
        let to = self.char_offset(end.0.saturating_sub(1), end.1);
        self.set_cursor(end.0, end.1);
        for _ in from..to {
            if !self.delete_back() {
                break;
            }
        }
    }

    /// Forwards a key to the text area's own editing behavior. Returns true
    /// when the document changed.
    pub(crate) fn input(&mut self, key: KeyEvent) -> bool {
        self.area.input(Input::from(key))
    }

    pub(crate) fn undo(&mut self) -> bool {
        self.area.undo()
    }

    pub(crate) fn redo(&mut self) -> bool {
        self.area.redo()
    }

    /// Selected span as ((row, col), (row, col)), 0-indexed, start first.
    pub(crate) fn selection_range(&self) -> Option<((usize, usize), (usize, usize))> {
        self.area
            .selection_range()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
    }

    pub(crate) fn current_line(&self) -> &str {
        let (row, _) = self.area.cursor();
        self.area.lines().get(row).map_or("", String::as_str)
    }

    /// Identifier characters immediately left of the cursor.
    pub(crate) fn identifier_prefix(&self) -> String {
        let (_, col) = self.area.cursor();
        let before: Vec<char> = self.current_line().chars().take(col).collect();
        let start = before
            .iter()
            .rposition(|c| !is_ident_char(*c))
            .map_or(0, |p| p + 1);
        before[start..].iter().collect()
    }

    /// Character offset into [`Buffer::text`] of a 0-indexed row and column,
    /// clamped to the document.
    pub(crate) fn char_offset(&self, row: usize, col: usize) -> usize {
        let lines = self.area.lines();
        let row = row.min(lines.len().saturating_sub(1));
        let before: usize = lines.iter().take(row).map(|l| l.chars().count() + 1).sum();
        let line_len = lines.get(row).map_or(0, |l| l.chars().count());
        before + col.min(line_len)
    }
}
