use super::{AfterEdit, App, LspDocument};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assist::{CompletionCandidate, word_candidates};
use crate::language::Language;
use crate::lsp_client::{LspClient, LspInbound, parse_completion_items};
use crate::util::{file_uri, inside, utf16_col};

impl App {
    fn completion_enabled(&self) -> bool {
        self.config.assist && self.language == Language::Python
    }

    /// After-edit completion pass. Closes the popup outside Python, otherwise
    /// asks the language server (or the word index) for candidates at the
    /// cursor.
    pub(crate) fn refresh_completion(&mut self) {
        if !self.completion_enabled() {
            self.completion.reset();
            self.pending_completion_request = None;
            return;
        }
        let prefix = self.buffer.identifier_prefix();
        let after_dot = self.char_before_cursor() == Some('.');
        if prefix.is_empty() && !after_dot {
            self.completion.reset();
            self.pending_completion_request = None;
            return;
        }
        self.request_completion();
    }

    /// Completion at the cursor regardless of the prefix. Bound to a key.
    pub(crate) fn request_completion(&mut self) {
        if !self.completion_enabled() {
            self.set_status("Completion is available for Python only");
            return;
        }
        if self.ensure_lsp() && self.request_lsp_completion() {
            return;
        }
        let items = word_candidates(&self.buffer.text(), &self.buffer.identifier_prefix());
        self.show_completion(items);
    }

    fn char_before_cursor(&self) -> Option<char> {
        let (_, col) = self.buffer.cursor_zero_based();
        col.checked_sub(1)
            .and_then(|c| self.buffer.current_line().chars().nth(c))
    }

    fn lsp_root(&self) -> PathBuf {
        self.session
            .path()
            .and_then(|p| p.parent())
            .filter(|p| p.is_dir())
            .map_or_else(|| self.cwd.clone(), |p| p.to_path_buf())
    }

    /// Starts the language server on first use. A server that fails to
    /// start is not retried for the rest of the session.
    fn ensure_lsp(&mut self) -> bool {
        if self.lsp.is_some() {
            return true;
        }
        if self.lsp_unavailable {
            return false;
        }
        let root = self.lsp_root();
        match LspClient::start(&self.config.completion_server, &root) {
            Ok(client) => {
                info!(command = ?self.config.completion_server, "completion server started");
                self.lsp = Some(client);
                self.lsp_document = None;
                true
            }
            Err(err) => {
                warn!(
                    command = ?self.config.completion_server,
                    %err,
                    "completion server unavailable"
                );
                self.lsp_unavailable = true;
                self.set_status(format!(
                    "Completion server unavailable ({err}); using word completion"
                ));
                false
            }
        }
    }

    fn document_uri(&self) -> Option<String> {
        match self.session.path() {
            Some(path) => file_uri(path),
            None => file_uri(&self.cwd.join("untitled.py")),
        }
    }

    /// Sends the whole document (didOpen for a new URI, didChange otherwise)
    /// and asks for completion at the cursor.
    fn request_lsp_completion(&mut self) -> bool {
        let Some(uri) = self.document_uri() else {
            return false;
        };
        let text = self.buffer.text();
        let (row, char_col) = self.buffer.cursor_zero_based();
        let col = utf16_col(self.buffer.current_line(), char_col);
        let Some(lsp) = self.lsp.as_mut() else {
            return false;
        };
        let version = match &self.lsp_document {
            Some(doc) if doc.uri == uri => doc.version + 1,
            _ => 1,
        };
        let sent = if version == 1 {
            lsp.did_open(&uri, &text, version)
        } else {
            lsp.did_change(&uri, &text, version)
        };
        self.lsp_document = Some(LspDocument {
            uri: uri.clone(),
            version,
        });
        match sent.and_then(|()| lsp.request_completion(&uri, row, col)) {
            Ok(id) => {
                debug!(id, row, col, "completion requested");
                self.pending_completion_request = Some(id);
                true
            }
            Err(err) => {
                warn!(%err, "completion server stopped responding");
                self.drop_lsp();
                false
            }
        }
    }

    fn drop_lsp(&mut self) {
        self.lsp = None;
        self.lsp_document = None;
        self.lsp_unavailable = true;
        self.pending_completion_request = None;
        self.set_status("Completion server stopped; using word completion");
    }

    pub(crate) fn poll_lsp(&mut self) {
        let mut inbound = Vec::new();
        let mut disconnected = false;
        if let Some(lsp) = self.lsp.as_ref() {
            loop {
                match lsp.rx.try_recv() {
                    Ok(msg) => inbound.push(msg),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }
        for msg in inbound {
            self.handle_lsp_message(msg);
        }
        if disconnected {
            self.drop_lsp();
        }
    }

    fn handle_lsp_message(&mut self, msg: LspInbound) {
        match msg {
            LspInbound::Notification { method, params } => {
                if method == "window/showMessage" {
                    if let Some(text) = params.get("message").and_then(Value::as_str) {
                        self.set_status(format!("Completion server: {text}"));
                    }
                } else {
                    debug!(%method, "ignored server notification");
                }
            }
            LspInbound::Response { id, result } => {
                if self.pending_completion_request == Some(id) {
                    self.pending_completion_request = None;
                    self.handle_completion_response(result);
                } else {
                    debug!(id, "dropped stale response");
                }
            }
        }
    }

    pub(crate) fn handle_completion_response(&mut self, result: Value) {
        if !self.completion_enabled() {
            return;
        }
        match parse_completion_items(&result) {
            Ok(items) => {
                let prefix = self.buffer.identifier_prefix().to_lowercase();
                let items: Vec<CompletionCandidate> = items
                    .into_iter()
                    .filter(|c| c.name.to_lowercase().starts_with(&prefix))
                    .collect();
                debug!(count = items.len(), "completion response");
                self.show_completion(items);
            }
            Err(msg) => {
                warn!(%msg, "completion error");
                self.completion.reset();
            }
        }
    }

    /// Replaces any open popup. An empty list closes it.
    pub(crate) fn show_completion(&mut self, items: Vec<CompletionCandidate>) {
        if items.is_empty() {
            self.completion.reset();
            return;
        }
        self.completion.items = items;
        self.completion.index = 0;
        self.completion.open = true;
    }

    /// Replaces the identifier prefix before the cursor with the selected
    /// candidate.
    pub(crate) fn apply_completion(&mut self) {
        let Some(item) = self.completion.items.get(self.completion.index).cloned() else {
            self.completion.reset();
            return;
        };
        let prefix_len = self.buffer.identifier_prefix().chars().count();
        let (line, col) = self.buffer.cursor();
        self.buffer
            .delete_range((line, col.saturating_sub(prefix_len)), (line, col));
        self.buffer.insert_str(&item.name);
        self.completion.reset();
        self.pending_completion_request = None;
        self.session.mark_dirty();
        self.run_after_edit(&[AfterEdit::Highlight]);
        self.set_status(format!("Inserted completion: {}", item.name));
    }

    /// Returns false for keys the popup does not handle; those go on to the
    /// editor.
    pub(crate) fn handle_completion_key(&mut self, key: KeyEvent) -> io::Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.completion.reset();
                self.pending_completion_request = None;
            }
            KeyCode::Down => {
                if self.completion.index + 1 < self.completion.items.len() {
                    self.completion.index += 1;
                }
            }
            KeyCode::Up => {
                self.completion.index = self.completion.index.saturating_sub(1);
            }
            KeyCode::Tab => self.apply_completion(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn handle_completion_mouse(&mut self, mouse: MouseEvent) -> io::Result<bool> {
        if !inside(mouse.column, mouse.row, self.completion.rect) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.completion.reset();
            }
            return Ok(false);
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let row = mouse.row.saturating_sub(self.completion.rect.y + 1) as usize;
                let idx = self.completion.first_visible() + row;
                if idx < self.completion.items.len() {
                    self.completion.index = idx;
                    self.apply_completion();
                }
            }
            MouseEventKind::ScrollDown => {
                if self.completion.index + 1 < self.completion.items.len() {
                    self.completion.index += 1;
                }
            }
            MouseEventKind::ScrollUp => {
                self.completion.index = self.completion.index.saturating_sub(1);
            }
            _ => {}
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::core::tests::test_app;
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;
    use serde_json::json;
    use tempfile::tempdir;

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                .expect("key");
        }
    }

    fn names(app: &App) -> Vec<String> {
        app.completion.items.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn typing_a_prefix_opens_word_completion() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        app.replace_document("counter = 1\n");
        app.buffer.set_cursor(2, 0);
        type_text(&mut app, "cou");
        assert!(app.completion.open);
        assert_eq!(names(&app), vec!["counter"]);
        assert!(app.lsp_unavailable);
    }

    #[test]
    fn tab_replaces_prefix_with_candidate() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        app.replace_document("counter = 1\n");
        app.buffer.set_cursor(2, 0);
        type_text(&mut app, "cou");
        app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE))
            .expect("tab");
        assert!(!app.completion.open);
        assert_eq!(app.buffer.text(), "counter = 1\ncounter");
        assert_eq!(app.buffer.cursor(), (2, 7));
    }

    #[test]
    fn arrows_move_selection_and_esc_closes() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        type_text(&mut app, "pr");
        assert_eq!(names(&app), vec!["print"]);
        app.show_completion(vec![
            CompletionCandidate { name: "a".into(), detail: None },
            CompletionCandidate { name: "b".into(), detail: None },
        ]);
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE))
            .expect("down");
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE))
            .expect("down");
        assert_eq!(app.completion.index, 1);
        app.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE))
            .expect("up");
        assert_eq!(app.completion.index, 0);
        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
            .expect("esc");
        assert!(!app.completion.open);
        assert_eq!(app.buffer.text(), "pr");
    }

    #[test]
    fn non_python_language_closes_popup() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        type_text(&mut app, "pr");
        assert!(app.completion.open);
        app.set_language(Language::JavaScript);
        assert!(!app.completion.open);
        type_text(&mut app, "i");
        assert!(!app.completion.open);
    }

    #[test]
    fn assist_off_never_completes() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        app.config.assist = false;
        type_text(&mut app, "pr");
        assert!(!app.completion.open);
    }

    #[test]
    fn server_items_are_filtered_by_prefix() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        type_text(&mut app, "fo");
        app.completion.reset();
        app.handle_completion_response(json!([{ "label": "format" }, { "label": "float" }]));
        assert_eq!(names(&app), vec!["format"]);
    }

    #[test]
    fn stale_response_is_dropped_and_show_message_reaches_status() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        type_text(&mut app, "fo");
        app.completion.reset();
        app.pending_completion_request = Some(7);
        app.handle_lsp_message(LspInbound::Response {
            id: 6,
            result: json!([{ "label": "format" }]),
        });
        assert!(!app.completion.open);
        assert_eq!(app.pending_completion_request, Some(7));
        app.handle_lsp_message(LspInbound::Response {
            id: 7,
            result: json!([{ "label": "format" }]),
        });
        assert_eq!(names(&app), vec!["format"]);
        assert_eq!(app.pending_completion_request, None);

        app.handle_lsp_message(LspInbound::Notification {
            method: "window/showMessage".to_string(),
            params: json!({ "type": 3, "message": "indexing done" }),
        });
        assert_eq!(app.status, "Completion server: indexing done");
    }

    #[test]
    fn click_accepts_candidate_under_mouse() {
        let tmp = tempdir().expect("tempdir");
        let (mut app, _) = test_app(tmp.path().to_path_buf());
        type_text(&mut app, "x");
        app.show_completion(vec![
            CompletionCandidate { name: "xa".into(), detail: None },
            CompletionCandidate { name: "xb".into(), detail: None },
        ]);
        app.completion.rect = Rect::new(10, 5, 20, 4);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        assert!(app.handle_completion_mouse(click).expect("mouse"));
        assert_eq!(app.buffer.text(), "xb");
    }
}
