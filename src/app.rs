use std::path::PathBuf;

use ratatui::layout::Rect;

use crate::assist::CompletionCandidate;
use crate::buffer::Buffer;
use crate::config::Config;
use crate::highlight::Highlighter;
use crate::keybinds::KeyBindings;
use crate::language::{FileFilter, Language};
use crate::lsp_client::LspClient;
use crate::runner::CommandExecutor;
use crate::session::FileSession;
use crate::theme::Theme;
use crate::types::{Dialog, MenuKind, OutputPane, PendingAction, PickerMode};
use crate::util::DirEntryItem;

mod completion;
mod core;
mod file_ops;
mod input;
mod run;

pub(crate) struct CompletionState {
    pub(crate) open: bool,
    pub(crate) items: Vec<CompletionCandidate>,
    pub(crate) index: usize,
    pub(crate) rect: Rect,
}

impl CompletionState {
    pub(crate) fn reset(&mut self) {
        self.open = false;
        self.items.clear();
        self.index = 0;
    }

    /// First item shown in a popup of the current height.
    pub(crate) fn first_visible(&self) -> usize {
        let visible = self.rect.height.saturating_sub(2).max(1) as usize;
        self.index.saturating_sub(visible - 1)
    }
}

pub(crate) struct MenuState {
    pub(crate) open: Option<MenuKind>,
    pub(crate) index: usize,
    pub(crate) rect: Rect,
}

pub(crate) struct FilePickerState {
    pub(crate) open: bool,
    pub(crate) mode: PickerMode,
    pub(crate) dir: PathBuf,
    pub(crate) filter: FileFilter,
    pub(crate) entries: Vec<DirEntryItem>,
    pub(crate) index: usize,
    /// Typed file name (Save As) or path (Open).
    pub(crate) input: String,
    pub(crate) rect: Rect,
}

/// The document as last announced to the language server.
pub(crate) struct LspDocument {
    pub(crate) uri: String,
    pub(crate) version: i64,
}

/// Work done after every change to the document, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AfterEdit {
    Highlight,
    Completion,
}

pub(crate) const AFTER_EDIT: [AfterEdit; 2] = [AfterEdit::Highlight, AfterEdit::Completion];

pub(crate) struct App {
    pub(crate) cwd: PathBuf,
    pub(crate) buffer: Buffer,
    pub(crate) session: FileSession,
    pub(crate) language: Language,
    pub(crate) highlighter: Highlighter,
    pub(crate) config: Config,
    pub(crate) keybinds: KeyBindings,
    pub(crate) status: String,
    pub(crate) pending: PendingAction,
    pub(crate) quit: bool,
    pub(crate) output: OutputPane,
    pub(crate) dialog: Option<Dialog>,
    pub(crate) menu: MenuState,
    pub(crate) file_picker: FilePickerState,
    pub(crate) themes: Vec<Theme>,
    pub(crate) active_theme_index: usize,
    pub(crate) theme_browser_open: bool,
    pub(crate) theme_index: usize,
    pub(crate) preview_revert_index: usize,
    pub(crate) theme_browser_rect: Rect,
    pub(crate) help_open: bool,
    pub(crate) completion: CompletionState,
    pub(crate) lsp: Option<LspClient>,
    pub(crate) lsp_unavailable: bool,
    pub(crate) lsp_document: Option<LspDocument>,
    pub(crate) pending_completion_request: Option<i64>,
    pub(crate) executor: Box<dyn CommandExecutor>,
    pub(crate) menu_bar_rects: Vec<(MenuKind, Rect)>,
    pub(crate) language_rect: Rect,
    pub(crate) editor_rect: Rect,
    pub(crate) output_rect: Rect,
    pub(crate) editor_scroll_row: usize,
    pub(crate) editor_scroll_col: usize,
    pub(crate) output_scroll: usize,
}
