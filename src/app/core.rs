use super::{AFTER_EDIT, AfterEdit, App, CompletionState, FilePickerState, MenuState};
use std::path::PathBuf;

use ratatui::layout::Rect;
use tracing::{error, info};

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::IdeError;
use crate::highlight::Highlighter;
use crate::keybinds::{KeyAction, KeyBindings};
use crate::language::{FileFilter, Language};
use crate::runner::{CommandExecutor, SystemExecutor};
use crate::session::FileSession;
use crate::theme::{Theme, load_themes, theme_index};
use crate::types::{Dialog, OutputPane, PendingAction, PickerMode};
use crate::util::{char_col_at_display, display_col, inside, relative_path};

impl App {
    pub(crate) const EDITOR_GUTTER_WIDTH: u16 = 6;
    pub(crate) const SCROLL_LINES: usize = 3;

    pub(crate) fn new(cwd: PathBuf, config: Config) -> Self {
        Self::with_executor(cwd, config, Box::new(SystemExecutor))
    }

    pub(crate) fn with_executor(
        cwd: PathBuf,
        config: Config,
        executor: Box<dyn CommandExecutor>,
    ) -> Self {
        let themes = load_themes();
        let active_theme_index = theme_index(&themes, &config.theme);
        let keybinds = KeyBindings::from_overrides(&config.keybinds);
        let mut app = Self {
            file_picker: FilePickerState {
                open: false,
                mode: PickerMode::Open,
                dir: cwd.clone(),
                filter: FileFilter::Lang(Language::default()),
                entries: Vec::new(),
                index: 0,
                input: String::new(),
                rect: Rect::default(),
            },
            cwd,
            buffer: Buffer::default(),
            session: FileSession::default(),
            language: Language::default(),
            highlighter: Highlighter::default(),
            config,
            keybinds,
            status: String::new(),
            pending: PendingAction::None,
            quit: false,
            output: OutputPane::default(),
            dialog: None,
            menu: MenuState {
                open: None,
                index: 0,
                rect: Rect::default(),
            },
            themes,
            active_theme_index,
            theme_browser_open: false,
            theme_index: active_theme_index,
            preview_revert_index: active_theme_index,
            theme_browser_rect: Rect::default(),
            help_open: false,
            completion: CompletionState {
                open: false,
                items: Vec::new(),
                index: 0,
                rect: Rect::default(),
            },
            lsp: None,
            lsp_unavailable: false,
            lsp_document: None,
            pending_completion_request: None,
            executor,
            menu_bar_rects: Vec::new(),
            language_rect: Rect::default(),
            editor_rect: Rect::default(),
            output_rect: Rect::default(),
            editor_scroll_row: 0,
            editor_scroll_col: 0,
            output_scroll: 0,
        };
        app.refresh_highlight();
        app.status = format!(
            "{} menu | {} run | {} help",
            app.keybinds.display_for(KeyAction::FileMenu),
            app.keybinds.display_for(KeyAction::Run),
            app.keybinds.display_for(KeyAction::Help),
        );
        app
    }

    pub(crate) fn active_theme(&self) -> &Theme {
        &self.themes[self.active_theme_index]
    }

    pub(crate) fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = status.into();
    }

    /// Reports a failed action in a dialog. State is left as it was.
    pub(crate) fn show_error(&mut self, err: IdeError) {
        error!(%err, "action failed");
        self.set_status(err.dialog_title());
        self.dialog = Some(Dialog::from(&err));
    }

    pub(crate) fn on_editor_content_changed(&mut self) {
        self.session.mark_dirty();
        self.run_after_edit(&AFTER_EDIT);
    }

    pub(crate) fn run_after_edit(&mut self, concerns: &[AfterEdit]) {
        for concern in concerns {
            match concern {
                AfterEdit::Highlight => self.refresh_highlight(),
                AfterEdit::Completion => self.refresh_completion(),
            }
        }
    }

    pub(crate) fn refresh_highlight(&mut self) {
        let text = self.buffer.text();
        self.highlighter.refresh(&text, self.language);
    }

    /// Switches the active language; the document is re-highlighted and the
    /// completion popup re-evaluated. The file path is not touched.
    pub(crate) fn set_language(&mut self, language: Language) {
        if self.language == language {
            self.set_status(format!("Language: {language}"));
            return;
        }
        info!(from = %self.language, to = %language, "language changed");
        self.language = language;
        self.run_after_edit(&AFTER_EDIT);
        self.set_status(format!("Language: {language}"));
    }

    /// Swaps in a freshly opened document.
    pub(crate) fn replace_document(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.editor_scroll_row = 0;
        self.editor_scroll_col = 0;
        self.completion.reset();
        self.pending_completion_request = None;
        self.refresh_highlight();
    }

    pub(crate) fn document_label(&self) -> String {
        let name = self.session.path().map_or_else(
            || "untitled".to_string(),
            |p| relative_path(&self.cwd, p).display().to_string(),
        );
        if self.session.is_dirty() {
            format!("{name}*")
        } else {
            name
        }
    }

    /// Exit, asking for a second Exit while there are unsaved changes.
    pub(crate) fn request_exit(&mut self) {
        if self.session.is_dirty() && self.pending != PendingAction::Exit {
            self.pending = PendingAction::Exit;
            self.set_status("Unsaved changes. Exit again to quit without saving.");
            return;
        }
        info!("exit requested");
        self.quit = true;
    }

    pub(crate) fn open_theme_browser(&mut self) {
        self.preview_revert_index = self.active_theme_index;
        self.theme_index = self.active_theme_index;
        self.theme_browser_open = true;
    }

    fn editor_text_area(&self) -> Rect {
        let inner = Rect {
            x: self.editor_rect.x.saturating_add(1),
            y: self.editor_rect.y.saturating_add(1),
            width: self.editor_rect.width.saturating_sub(2),
            height: self.editor_rect.height.saturating_sub(2),
        };
        Rect {
            x: inner.x.saturating_add(Self::EDITOR_GUTTER_WIDTH),
            width: inner.width.saturating_sub(Self::EDITOR_GUTTER_WIDTH),
            ..inner
        }
    }

    /// Keeps the cursor inside the visible part of the editor.
    pub(crate) fn sync_editor_scroll(&mut self) {
        let area = self.editor_text_area();
        let (row, col) = self.buffer.cursor_zero_based();
        let height = area.height as usize;
        if height == 0 {
            self.editor_scroll_row = 0;
        } else if row < self.editor_scroll_row {
            self.editor_scroll_row = row;
        } else if row >= self.editor_scroll_row + height {
            self.editor_scroll_row = row + 1 - height;
        }
        let width = area.width as usize;
        let cursor_x = display_col(self.buffer.current_line(), col);
        if width == 0 {
            self.editor_scroll_col = 0;
        } else if cursor_x < self.editor_scroll_col {
            self.editor_scroll_col = cursor_x;
        } else if cursor_x >= self.editor_scroll_col + width {
            self.editor_scroll_col = cursor_x + 1 - width;
        }
    }

    /// Wheel scrolling. The cursor is pulled into the visible rows so the
    /// next sync does not snap the view back.
    pub(crate) fn scroll_editor(&mut self, down: bool) {
        let height = self.editor_text_area().height as usize;
        let max = self.buffer.lines().len().saturating_sub(height.max(1));
        self.editor_scroll_row = if down {
            (self.editor_scroll_row + Self::SCROLL_LINES).min(max)
        } else {
            self.editor_scroll_row.saturating_sub(Self::SCROLL_LINES)
        };
        if height == 0 {
            return;
        }
        let (row, col) = self.buffer.cursor_zero_based();
        let target = row.clamp(self.editor_scroll_row, self.editor_scroll_row + height - 1);
        if target != row {
            self.buffer.set_cursor(target + 1, col);
        }
    }

    pub(crate) fn scroll_output(&mut self, down: bool) {
        let total = self.output.stderr.lines().count() + self.output.stdout.lines().count();
        let max = total.saturating_sub(1);
        self.output_scroll = if down {
            (self.output_scroll + Self::SCROLL_LINES).min(max)
        } else {
            self.output_scroll.saturating_sub(Self::SCROLL_LINES)
        };
    }

    /// Document position (0-indexed row, char column) under a screen cell.
    pub(crate) fn editor_position_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let area = self.editor_text_area();
        if !inside(x, y, self.editor_rect) || y < area.y || y >= area.y + area.height {
            return None;
        }
        let lines = self.buffer.lines();
        let row = (self.editor_scroll_row + (y - area.y) as usize)
            .min(lines.len().saturating_sub(1));
        let target = self.editor_scroll_col + x.saturating_sub(area.x) as usize;
        let col = lines
            .get(row)
            .map_or(0, |line| char_col_at_display(line, target));
        Some((row, col))
    }

    /// Screen cell of the cursor, if it is in view.
    pub(crate) fn cursor_screen_position(&self) -> Option<(u16, u16)> {
        let area = self.editor_text_area();
        let (row, col) = self.buffer.cursor_zero_based();
        let x = display_col(self.buffer.current_line(), col).checked_sub(self.editor_scroll_col)?;
        let y = row.checked_sub(self.editor_scroll_row)?;
        if x >= area.width as usize || y >= area.height as usize {
            return None;
        }
        Some((area.x + x as u16, area.y + y as u16))
    }
}
