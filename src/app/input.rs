use super::App;
use std::io;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::assist::{closing_pair, newline_for};
use crate::keybinds::{KeyAction, KeyScope};
use crate::types::{MenuItem, MenuKind, PendingAction, PickerMode};
use crate::util::inside;

impl App {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> io::Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if self.dialog.is_some() {
            return self.handle_dialog_key(key);
        }
        if self.help_open {
            return self.handle_help_key(key);
        }
        if self.theme_browser_open {
            return self.handle_theme_browser_key(key);
        }
        if self.file_picker.open {
            return self.handle_file_picker_key(key);
        }
        if self.menu.open.is_some() {
            return self.handle_menu_key(key);
        }
        if self.completion.open && self.handle_completion_key(key)? {
            return Ok(());
        }

        let action = self.keybinds.lookup(&key, KeyScope::Global);
        if self.pending == PendingAction::Exit && action != Some(KeyAction::Exit) {
            self.pending = PendingAction::None;
            self.set_status("Exit cancelled");
        }
        if let Some(action) = action {
            return self.run_key_action(action);
        }
        self.handle_editor_key(key)
    }

    pub(crate) fn run_key_action(&mut self, action: KeyAction) -> io::Result<()> {
        match action {
            KeyAction::Open => self.open_file_picker(PickerMode::Open),
            KeyAction::Save => self.save_current(),
            KeyAction::SaveAs => self.open_file_picker(PickerMode::SaveAs),
            KeyAction::Exit => self.request_exit(),
            KeyAction::Run => self.run_current_file(),
            KeyAction::CycleLanguage => self.set_language(self.language.next()),
            KeyAction::LanguageMenu => self.open_menu(MenuKind::Language),
            KeyAction::FileMenu => self.open_menu(MenuKind::File),
            KeyAction::RunMenu => self.open_menu(MenuKind::Run),
            KeyAction::ThemePicker => self.open_theme_browser(),
            KeyAction::Help => self.help_open = true,
            KeyAction::Completion => self.request_completion(),
            KeyAction::Undo => {
                if self.buffer.undo() {
                    self.on_editor_content_changed();
                }
            }
            KeyAction::Redo => {
                if self.buffer.redo() {
                    self.on_editor_content_changed();
                }
            }
        }
        self.sync_editor_scroll();
        Ok(())
    }

    pub(crate) fn handle_editor_key(&mut self, key: KeyEvent) -> io::Result<()> {
        if let Some(action) = self.keybinds.lookup(&key, KeyScope::Editor) {
            return self.run_key_action(action);
        }

        if self.config.assist {
            match (key.modifiers, key.code) {
                (m, KeyCode::Char(c))
                    if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    if let Some(pair) = closing_pair(c) {
                        if self.buffer.insert_str(pair) {
                            self.buffer.move_back();
                            self.on_editor_content_changed();
                            self.sync_editor_scroll();
                            return Ok(());
                        }
                    }
                }
                (KeyModifiers::NONE, KeyCode::Enter) => {
                    if let Some(newline) = newline_for(self.buffer.current_line()) {
                        if self.buffer.insert_str(&newline) {
                            self.on_editor_content_changed();
                            self.sync_editor_scroll();
                            return Ok(());
                        }
                    }
                }
                _ => {}
            }
        }

        if self.buffer.input(key) {
            self.on_editor_content_changed();
        } else if self.completion.open {
            self.completion.reset();
            self.pending_completion_request = None;
        }
        self.sync_editor_scroll();
        Ok(())
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> io::Result<()> {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            self.dialog = None;
        }
        Ok(())
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> io::Result<()> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::F(1))
            || self.keybinds.lookup(&key, KeyScope::Global) == Some(KeyAction::Help)
        {
            self.help_open = false;
        }
        Ok(())
    }

    pub(crate) fn open_menu(&mut self, kind: MenuKind) {
        self.completion.reset();
        self.menu.open = Some(kind);
        self.menu.index = match kind {
            MenuKind::Language => self.language.index(),
            _ => 0,
        };
    }

    fn close_menu(&mut self) {
        self.menu.open = None;
        self.menu.index = 0;
    }

    fn activate_menu_item(&mut self, item: MenuItem) -> io::Result<()> {
        self.close_menu();
        match item {
            MenuItem::Open => self.run_key_action(KeyAction::Open),
            MenuItem::Save => self.run_key_action(KeyAction::Save),
            MenuItem::SaveAs => self.run_key_action(KeyAction::SaveAs),
            MenuItem::Exit => self.run_key_action(KeyAction::Exit),
            MenuItem::Run => self.run_key_action(KeyAction::Run),
            MenuItem::Language(lang) => {
                self.set_language(lang);
                Ok(())
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> io::Result<()> {
        let Some(kind) = self.menu.open else {
            return Ok(());
        };
        let items = kind.items();
        match key.code {
            KeyCode::Esc => self.close_menu(),
            KeyCode::Down => {
                if self.menu.index + 1 < items.len() {
                    self.menu.index += 1;
                }
            }
            KeyCode::Up => self.menu.index = self.menu.index.saturating_sub(1),
            KeyCode::Left => self.open_menu(kind.prev()),
            KeyCode::Right => self.open_menu(kind.next()),
            KeyCode::Enter => {
                if let Some(item) = items.get(self.menu.index).copied() {
                    return self.activate_menu_item(item);
                }
            }
            _ => {
                let action = self.keybinds.lookup(&key, KeyScope::Global);
                if matches!(
                    action,
                    Some(KeyAction::FileMenu | KeyAction::RunMenu | KeyAction::LanguageMenu)
                ) {
                    self.close_menu();
                }
            }
        }
        Ok(())
    }

    fn handle_theme_browser_key(&mut self, key: KeyEvent) -> io::Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.active_theme_index = self.preview_revert_index;
                self.theme_index = self.preview_revert_index;
                self.theme_browser_open = false;
                self.set_status(format!("Theme reverted: {}", self.active_theme().name));
            }
            KeyCode::Down => {
                if self.theme_index + 1 < self.themes.len() {
                    self.theme_index += 1;
                    self.active_theme_index = self.theme_index;
                    self.set_status(format!("Preview: {}", self.active_theme().name));
                }
            }
            KeyCode::Up => {
                if self.theme_index > 0 {
                    self.theme_index -= 1;
                    self.active_theme_index = self.theme_index;
                    self.set_status(format!("Preview: {}", self.active_theme().name));
                }
            }
            KeyCode::Enter => {
                self.theme_browser_open = false;
                self.set_status(format!("Theme: {}", self.active_theme().name));
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) -> io::Result<()> {
        let left_down = matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left));

        if self.dialog.is_some() {
            if left_down {
                self.dialog = None;
            }
            return Ok(());
        }
        if self.help_open {
            if left_down {
                self.help_open = false;
            }
            return Ok(());
        }
        if self.theme_browser_open {
            return self.handle_theme_browser_mouse(mouse);
        }
        if self.file_picker.open {
            return self.handle_file_picker_mouse(mouse);
        }
        if self.menu.open.is_some() && self.handle_menu_mouse(mouse)? {
            return Ok(());
        }
        if self.completion.open && self.handle_completion_mouse(mouse)? {
            return Ok(());
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(kind) = self
                    .menu_bar_rects
                    .iter()
                    .find(|(_, rect)| inside(mouse.column, mouse.row, *rect))
                    .map(|(kind, _)| *kind)
                {
                    if self.menu.open == Some(kind) {
                        self.close_menu();
                    } else {
                        self.open_menu(kind);
                    }
                    return Ok(());
                }
                if inside(mouse.column, mouse.row, self.language_rect) {
                    self.open_menu(MenuKind::Language);
                    return Ok(());
                }
                if let Some((row, col)) = self.editor_position_at(mouse.column, mouse.row) {
                    self.buffer.set_cursor(row + 1, col);
                    self.completion.reset();
                    self.pending_completion_request = None;
                }
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let down = matches!(mouse.kind, MouseEventKind::ScrollDown);
                if inside(mouse.column, mouse.row, self.editor_rect) {
                    self.scroll_editor(down);
                } else if inside(mouse.column, mouse.row, self.output_rect) {
                    self.scroll_output(down);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns true when the event was consumed by the open menu.
    fn handle_menu_mouse(&mut self, mouse: MouseEvent) -> io::Result<bool> {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return Ok(true);
        }
        let Some(kind) = self.menu.open else {
            return Ok(false);
        };
        if !inside(mouse.column, mouse.row, self.menu.rect) {
            self.close_menu();
            // A click on another menu title opens that menu instead.
            return Ok(false);
        }
        let row = mouse.row.saturating_sub(self.menu.rect.y + 1) as usize;
        if let Some(item) = kind.items().get(row).copied() {
            self.menu.index = row;
            self.activate_menu_item(item)?;
        }
        Ok(true)
    }

    fn handle_theme_browser_mouse(&mut self, mouse: MouseEvent) -> io::Result<()> {
        let left_down = matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left));
        if !inside(mouse.column, mouse.row, self.theme_browser_rect) {
            if left_down {
                self.active_theme_index = self.preview_revert_index;
                self.theme_index = self.preview_revert_index;
                self.theme_browser_open = false;
                self.set_status(format!("Theme reverted: {}", self.active_theme().name));
            }
            return Ok(());
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                if self.theme_index + 1 < self.themes.len() {
                    self.theme_index += 1;
                    self.active_theme_index = self.theme_index;
                }
            }
            MouseEventKind::ScrollUp => {
                if self.theme_index > 0 {
                    self.theme_index -= 1;
                    self.active_theme_index = self.theme_index;
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let row = mouse.row.saturating_sub(self.theme_browser_rect.y + 1) as usize;
                if row < self.themes.len() {
                    self.theme_index = row;
                    self.active_theme_index = row;
                    self.theme_browser_open = false;
                    self.set_status(format!("Theme: {}", self.active_theme().name));
                }
            }
            _ => {}
        }
        Ok(())
    }
}
