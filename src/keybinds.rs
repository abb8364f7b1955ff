use std::collections::HashMap;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum KeyAction {
    // Global
    Open,
    Save,
    SaveAs,
    Exit,
    Run,
    CycleLanguage,
    LanguageMenu,
    FileMenu,
    RunMenu,
    ThemePicker,
    Help,
    // Editor
    Completion,
    Undo,
    Redo,
}

impl KeyAction {
    pub(crate) fn is_global(self) -> bool {
        !matches!(
            self,
            KeyAction::Completion | KeyAction::Undo | KeyAction::Redo
        )
    }

    pub(crate) fn is_editor(self) -> bool {
        !self.is_global()
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            KeyAction::Open => "Open",
            KeyAction::Save => "Save",
            KeyAction::SaveAs => "Save As",
            KeyAction::Exit => "Exit",
            KeyAction::Run => "Run",
            KeyAction::CycleLanguage => "Next Language",
            KeyAction::LanguageMenu => "Language Menu",
            KeyAction::FileMenu => "File Menu",
            KeyAction::RunMenu => "Run Menu",
            KeyAction::ThemePicker => "Themes",
            KeyAction::Help => "Help",
            KeyAction::Completion => "Completion",
            KeyAction::Undo => "Undo",
            KeyAction::Redo => "Redo",
        }
    }

    pub(crate) fn all() -> &'static [KeyAction] {
        &[
            KeyAction::Open,
            KeyAction::Save,
            KeyAction::SaveAs,
            KeyAction::Exit,
            KeyAction::Run,
            KeyAction::CycleLanguage,
            KeyAction::LanguageMenu,
            KeyAction::FileMenu,
            KeyAction::RunMenu,
            KeyAction::ThemePicker,
            KeyAction::Help,
            KeyAction::Completion,
            KeyAction::Undo,
            KeyAction::Redo,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyBind {
    pub(crate) modifiers: KeyModifiers,
    pub(crate) code: KeyCode,
}

impl KeyBind {
    /// Terminals may report Ctrl+letter as the ASCII control character.
    fn normalize_char_with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> KeyCode {
        match code {
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
                let u = c as u32;
                if (1..=26).contains(&u) {
                    KeyCode::Char(char::from(b'a' + (u as u8) - 1))
                } else {
                    KeyCode::Char(c.to_ascii_lowercase())
                }
            }
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }

    pub(crate) fn parse(s: &str) -> Option<KeyBind> {
        let parts: Vec<&str> = s.split('+').collect();
        let (key_str, mods) = parts.split_last()?;
        let mut modifiers = KeyModifiers::NONE;
        for part in mods {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "alt" => modifiers |= KeyModifiers::ALT,
                _ => return None,
            }
        }
        let lower = key_str.to_ascii_lowercase();
        let code = match lower.as_str() {
            "space" => KeyCode::Char(' '),
            "esc" | "escape" => KeyCode::Esc,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            f if f.len() > 1 && f.starts_with('f') => {
                let n: u8 = f[1..].parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                KeyCode::F(n)
            }
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(KeyBind { modifiers, code })
    }

    fn key_name(&self) -> String {
        match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            _ => "?".to_string(),
        }
    }

    pub(crate) fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        parts.push(self.key_name());
        parts.join("+")
    }

    /// Character keys compare case-insensitively and ignore Shift, since
    /// crossterm reports uppercase letters with the Shift bit set.
    pub(crate) fn matches(&self, key: &KeyEvent) -> bool {
        let bind_code = Self::normalize_char_with_modifiers(self.code, self.modifiers);
        let ev_code = Self::normalize_char_with_modifiers(key.code, key.modifiers);
        let mut bind_mods = self.modifiers;
        let mut ev_mods = key.modifiers;
        if matches!(ev_code, KeyCode::Char(_)) {
            ev_mods -= KeyModifiers::SHIFT;
        }
        if matches!(bind_code, KeyCode::Char(_)) {
            bind_mods -= KeyModifiers::SHIFT;
        }
        ev_code == bind_code && ev_mods == bind_mods
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyScope {
    Global,
    Editor,
}

#[derive(Debug, Clone)]
pub(crate) struct KeyBindings {
    pub(crate) map: HashMap<KeyAction, Vec<KeyBind>>,
}

impl KeyBindings {
    pub(crate) fn defaults() -> Self {
        let mut map: HashMap<KeyAction, Vec<KeyBind>> = HashMap::new();
        let mut bind = |action: KeyAction, s: &str| {
            if let Some(parsed) = KeyBind::parse(s) {
                map.entry(action).or_default().push(parsed);
            }
        };

        bind(KeyAction::Open, "ctrl+o");
        bind(KeyAction::Save, "ctrl+s");
        bind(KeyAction::SaveAs, "f12");
        bind(KeyAction::Exit, "ctrl+q");
        bind(KeyAction::Run, "f5");
        bind(KeyAction::Run, "ctrl+r");
        bind(KeyAction::CycleLanguage, "ctrl+l");
        bind(KeyAction::LanguageMenu, "alt+l");
        bind(KeyAction::FileMenu, "f10");
        bind(KeyAction::FileMenu, "alt+f");
        bind(KeyAction::RunMenu, "alt+r");
        bind(KeyAction::ThemePicker, "ctrl+t");
        bind(KeyAction::Help, "f1");

        bind(KeyAction::Completion, "ctrl+space");
        bind(KeyAction::Undo, "ctrl+z");
        bind(KeyAction::Redo, "ctrl+y");

        KeyBindings { map }
    }

    /// Defaults with the config file's overrides applied.
    pub(crate) fn from_overrides(overrides: &HashMap<String, SingleOrVec>) -> Self {
        let mut kb = Self::defaults();
        apply_keybinding_overrides(&mut kb, overrides);
        kb
    }

    /// First action in declaration order wins when binds overlap.
    pub(crate) fn lookup(&self, key: &KeyEvent, scope: KeyScope) -> Option<KeyAction> {
        KeyAction::all().iter().copied().find(|action| {
            let in_scope = match scope {
                KeyScope::Global => action.is_global(),
                KeyScope::Editor => action.is_editor(),
            };
            in_scope
                && self
                    .map
                    .get(action)
                    .is_some_and(|binds| binds.iter().any(|b| b.matches(key)))
        })
    }

    pub(crate) fn display_for(&self, action: KeyAction) -> String {
        self.map
            .get(&action)
            .and_then(|v| v.first())
            .map(|b| b.display())
            .unwrap_or_else(|| "unbound".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SingleOrVec {
    Single(String),
    Multiple(Vec<String>),
}

pub(crate) fn parse_key_action_name(name: &str) -> Option<KeyAction> {
    serde_json::from_value::<KeyAction>(serde_json::Value::String(name.to_string())).ok()
}

/// An empty list unbinds the action. An entry whose binds all fail to parse
/// keeps the defaults.
pub(crate) fn apply_keybinding_overrides(
    kb: &mut KeyBindings,
    overrides: &HashMap<String, SingleOrVec>,
) {
    for (action_name, val) in overrides {
        let Some(action) = parse_key_action_name(action_name) else {
            warn!(action = %action_name, "unknown key action in config");
            continue;
        };
        let strings: Vec<&String> = match val {
            SingleOrVec::Single(s) => vec![s],
            SingleOrVec::Multiple(v) => v.iter().collect(),
        };
        if strings.is_empty() {
            kb.map.insert(action, Vec::new());
            continue;
        }
        let mut binds = Vec::new();
        for s in strings {
            match KeyBind::parse(s) {
                Some(parsed) => binds.push(parsed),
                None => warn!(action = %action_name, bind = %s, "invalid keybind in config"),
            }
        }
        if !binds.is_empty() {
            kb.map.insert(action, binds);
        }
    }
}
