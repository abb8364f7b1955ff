use super::App;
use std::io;
use std::path::{Path, PathBuf};

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::info;

use crate::language::FileFilter;
use crate::session::resolve_save_target;
use crate::types::PickerMode;
use crate::util::{inside, list_dir};

impl App {
    pub(crate) fn open_file_picker(&mut self, mode: PickerMode) {
        let dir = self
            .session
            .path()
            .and_then(Path::parent)
            .filter(|p| p.is_dir())
            .map_or_else(|| self.cwd.clone(), Path::to_path_buf);
        let input = match mode {
            PickerMode::SaveAs => self
                .session
                .path()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            PickerMode::Open => String::new(),
        };
        self.file_picker.open = true;
        self.file_picker.mode = mode;
        self.file_picker.dir = dir;
        self.file_picker.filter = FileFilter::Lang(self.language);
        self.file_picker.input = input;
        self.refresh_file_picker_entries();
    }

    pub(crate) fn refresh_file_picker_entries(&mut self) {
        self.file_picker.entries = list_dir(&self.file_picker.dir, self.file_picker.filter);
        self.file_picker.index = 0;
    }

    fn close_file_picker(&mut self) {
        self.file_picker.open = false;
        self.file_picker.input.clear();
    }

    fn picker_enter_dir(&mut self, dir: PathBuf) {
        self.file_picker.dir = dir;
        self.refresh_file_picker_entries();
    }

    /// Enter in the picker: typed text wins, otherwise the selected entry.
    fn accept_file_picker(&mut self) {
        let typed = self.file_picker.input.trim().to_string();
        if !typed.is_empty() {
            let dir = self.file_picker.dir.clone();
            match self.file_picker.mode {
                PickerMode::Open => {
                    let path = dir.join(&typed);
                    if path.is_dir() {
                        self.file_picker.input.clear();
                        self.picker_enter_dir(path);
                        return;
                    }
                    self.close_file_picker();
                    self.open_path(&path);
                }
                PickerMode::SaveAs => {
                    let ext = self.file_picker.filter.default_extension();
                    let path = resolve_save_target(&dir, &typed, ext);
                    self.close_file_picker();
                    self.save_as_path(&path);
                }
            }
            return;
        }
        let Some(entry) = self
            .file_picker
            .entries
            .get(self.file_picker.index)
            .cloned()
        else {
            return;
        };
        if entry.is_dir {
            self.picker_enter_dir(entry.path);
            return;
        }
        self.close_file_picker();
        match self.file_picker.mode {
            PickerMode::Open => self.open_path(&entry.path),
            PickerMode::SaveAs => self.save_as_path(&entry.path),
        }
    }

    pub(crate) fn handle_file_picker_key(&mut self, key: KeyEvent) -> io::Result<()> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => {
                self.close_file_picker();
                self.set_status("Cancelled");
            }
            (_, KeyCode::Down) => {
                if self.file_picker.index + 1 < self.file_picker.entries.len() {
                    self.file_picker.index += 1;
                }
            }
            (_, KeyCode::Up) => {
                self.file_picker.index = self.file_picker.index.saturating_sub(1);
            }
            (_, KeyCode::Tab) => {
                self.file_picker.filter = self.file_picker.filter.next();
                self.refresh_file_picker_entries();
                self.set_status(format!("Filter: {}", self.file_picker.filter.label()));
            }
            (_, KeyCode::Enter) => self.accept_file_picker(),
            (_, KeyCode::Backspace) => {
                self.file_picker.input.pop();
            }
            (m, KeyCode::Char(c))
                if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.file_picker.input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn handle_file_picker_mouse(&mut self, mouse: MouseEvent) -> io::Result<()> {
        let rect = self.file_picker.rect;
        if !inside(mouse.column, mouse.row, rect) {
            if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                self.close_file_picker();
                self.set_status("Cancelled");
            }
            return Ok(());
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                if self.file_picker.index + 1 < self.file_picker.entries.len() {
                    self.file_picker.index += 1;
                }
            }
            MouseEventKind::ScrollUp => {
                self.file_picker.index = self.file_picker.index.saturating_sub(1);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                // Rows: border, directory line, input line, then entries.
                let Some(row) = mouse.row.checked_sub(rect.y + 3) else {
                    return Ok(());
                };
                let idx = self.file_picker_scroll() + row as usize;
                if idx < self.file_picker.entries.len() {
                    if self.file_picker.index == idx {
                        self.accept_file_picker();
                    } else {
                        self.file_picker.index = idx;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// First visible entry so the selection stays on screen.
    pub(crate) fn file_picker_scroll(&self) -> usize {
        let visible = self.file_picker.rect.height.saturating_sub(5).max(1) as usize;
        self.file_picker.index.saturating_sub(visible - 1)
    }

    /// Opens `path` into the editor. On failure the document and path stay
    /// as they were.
    pub(crate) fn open_path(&mut self, path: &Path) {
        match self.session.open(path) {
            Ok(text) => {
                self.replace_document(&text);
                self.set_status(format!("Opened {}", path.display()));
            }
            Err(err) => self.show_error(err),
        }
    }

    /// Save, falling back to Save As when the document has no path yet.
    pub(crate) fn save_current(&mut self) {
        let text = self.buffer.text();
        match self.session.save(&text) {
            Ok(true) => {
                if let Some(path) = self.session.path() {
                    self.status = format!("Saved {}", path.display());
                }
            }
            Ok(false) => self.open_file_picker(PickerMode::SaveAs),
            Err(err) => self.show_error(err),
        }
    }

    pub(crate) fn save_as_path(&mut self, path: &Path) {
        let text = self.buffer.text();
        match self.session.save_as(path, &text) {
            Ok(()) => {
                info!(path = %path.display(), "document now bound to file");
                self.set_status(format!("Saved {}", path.display()));
            }
            Err(err) => self.show_error(err),
        }
    }
}
