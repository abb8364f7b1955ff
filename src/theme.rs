use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use include_dir::{Dir, include_dir};
use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

use crate::syntax::TokenKind;

const LOCAL_THEME_DIR: &str = "themes";
pub(crate) const DEFAULT_THEME: &str = "Monokai";
static EMBEDDED_THEMES: Dir = include_dir!("$CARGO_MANIFEST_DIR/themes");

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub(crate) name: String,
    pub(crate) theme_type: String,
    pub(crate) bg: Color,
    pub(crate) editor_bg: Color,
    pub(crate) fg: Color,
    pub(crate) fg_muted: Color,
    pub(crate) border: Color,
    pub(crate) panel: Color,
    pub(crate) accent: Color,
    pub(crate) accent_fg: Color,
    pub(crate) selection: Color,
    pub(crate) error: Color,
    pub(crate) tokens: HashMap<TokenKind, Color>,
}

impl Theme {
    /// Foreground for a token kind: its own entry, else the nearest ancestor
    /// with one, else `None` (the caller keeps the default text color).
    pub(crate) fn token_color(&self, kind: TokenKind) -> Option<Color> {
        let mut current = Some(kind);
        while let Some(k) = current {
            if let Some(color) = self.tokens.get(&k) {
                return Some(*color);
            }
            current = k.parent();
        }
        None
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThemeFile {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) theme_type: String,
    pub(crate) colors: ThemeColors,
    #[serde(default)]
    pub(crate) tokens: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThemeColors {
    pub(crate) background: String,
    #[serde(rename = "editorBackground")]
    pub(crate) editor_background: String,
    pub(crate) foreground: String,
    #[serde(rename = "foregroundMuted")]
    pub(crate) foreground_muted: String,
    pub(crate) border: String,
    #[serde(default)]
    pub(crate) panel: Option<String>,
    pub(crate) accent: String,
    #[serde(default, rename = "accentForeground")]
    pub(crate) accent_foreground: Option<String>,
    pub(crate) selection: String,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

pub(crate) fn color_from_hex(input: &str, fallback: Color) -> Color {
    let s = input.trim();
    let Some(stripped) = s.strip_prefix('#') else {
        return fallback;
    };
    if stripped.len() != 6 || !stripped.is_ascii() {
        return fallback;
    }
    let r = u8::from_str_radix(&stripped[0..2], 16).ok();
    let g = u8::from_str_radix(&stripped[2..4], 16).ok();
    let b = u8::from_str_radix(&stripped[4..6], 16).ok();
    match (r, g, b) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => fallback,
    }
}

fn parse_optional(value: Option<&String>, fallback: Color) -> Color {
    value.map_or(fallback, |c| color_from_hex(c, fallback))
}

pub(crate) fn theme_from_file(tf: ThemeFile) -> Theme {
    let c = &tf.colors;
    let border = color_from_hex(&c.border, Color::Rgb(76, 86, 106));
    let accent = color_from_hex(&c.accent, Color::Rgb(94, 129, 172));
    let mut tokens = HashMap::new();
    for (kind_name, hex) in &tf.tokens {
        let Some(kind) = TokenKind::from_name(kind_name) else {
            warn!(theme = %tf.name, kind = %kind_name, "unknown token kind in theme");
            continue;
        };
        // Entries that do not parse define no foreground.
        let color = color_from_hex(hex, Color::Reset);
        if color != Color::Reset {
            tokens.insert(kind, color);
        }
    }
    Theme {
        bg: color_from_hex(&c.background, Color::Rgb(46, 52, 64)),
        editor_bg: color_from_hex(&c.editor_background, Color::Rgb(59, 66, 82)),
        fg: color_from_hex(&c.foreground, Color::Rgb(216, 222, 233)),
        fg_muted: color_from_hex(&c.foreground_muted, Color::Rgb(143, 155, 179)),
        border,
        panel: parse_optional(c.panel.as_ref(), border),
        accent,
        accent_fg: parse_optional(c.accent_foreground.as_ref(), Color::Rgb(236, 239, 244)),
        selection: color_from_hex(&c.selection, Color::Rgb(67, 76, 94)),
        error: parse_optional(c.error.as_ref(), Color::Rgb(191, 97, 106)),
        tokens,
        name: tf.name,
        theme_type: tf.theme_type,
    }
}

pub(crate) fn load_themes() -> Vec<Theme> {
    let mut themes = Vec::new();

    let local = PathBuf::from(LOCAL_THEME_DIR);
    if local.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(&local)
            .ok()
            .into_iter()
            .flat_map(|rd| rd.filter_map(Result::ok))
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "json"))
            .collect();
        paths.sort();
        for path in paths {
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<ThemeFile>(&raw) {
                Ok(tf) => themes.push(theme_from_file(tf)),
                Err(err) => warn!(path = %path.display(), %err, "skipping theme file"),
            }
        }
    }
    if themes.is_empty() {
        let mut files: Vec<_> = EMBEDDED_THEMES
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .collect();
        files.sort_by_key(|f| f.path());
        for file in files {
            let Some(raw) = file.contents_utf8() else {
                continue;
            };
            let Ok(tf) = serde_json::from_str::<ThemeFile>(raw) else {
                continue;
            };
            themes.push(theme_from_file(tf));
        }
    }
    if themes.is_empty() {
        themes.push(fallback_theme());
    }
    themes.sort_by_key(|t| (t.theme_type != "dark", t.name.to_ascii_lowercase()));
    themes
}

/// Plain palette used when no theme file can be read at all.
fn fallback_theme() -> Theme {
    Theme {
        name: DEFAULT_THEME.to_string(),
        theme_type: "dark".to_string(),
        bg: Color::Rgb(46, 52, 64),
        editor_bg: Color::Rgb(59, 66, 82),
        fg: Color::Rgb(216, 222, 233),
        fg_muted: Color::Rgb(143, 155, 179),
        border: Color::Rgb(76, 86, 106),
        panel: Color::Rgb(76, 86, 106),
        accent: Color::Rgb(94, 129, 172),
        accent_fg: Color::Rgb(236, 239, 244),
        selection: Color::Rgb(67, 76, 94),
        error: Color::Rgb(191, 97, 106),
        tokens: HashMap::new(),
    }
}

pub(crate) fn theme_index(themes: &[Theme], name: &str) -> usize {
    themes
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"{"name":"Test","type":"dark","colors":{"background":"#1a1b26","editorBackground":"#16161e","foreground":"#a9b1d6","foregroundMuted":"#565f89","border":"#414868","accent":"#7aa2f7","selection":"#364a82"},"tokens":{"Keyword":"#ff0000","Name.Function":"#00ff00","Bogus.Kind":"#0000ff","Comment":"nope"}}"##;

    #[test]
    fn theme_file_deserializes_and_converts() {
        let tf: ThemeFile = serde_json::from_str(MINIMAL).expect("valid theme");
        let theme = theme_from_file(tf);
        assert_eq!(theme.name, "Test");
        assert_eq!(theme.bg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.fg, Color::Rgb(169, 177, 214));
        // Optional colors fall back.
        assert_eq!(theme.panel, theme.border);
        assert_eq!(theme.error, Color::Rgb(191, 97, 106));
    }

    #[test]
    fn token_colors_inherit_from_parent_kind() {
        let tf: ThemeFile = serde_json::from_str(MINIMAL).expect("valid theme");
        let theme = theme_from_file(tf);
        assert_eq!(theme.token_color(TokenKind::Keyword), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(
            theme.token_color(TokenKind::KeywordConstant),
            Some(Color::Rgb(255, 0, 0))
        );
        assert_eq!(
            theme.token_color(TokenKind::NameFunction),
            Some(Color::Rgb(0, 255, 0))
        );
        // Unparseable entries and absent kinds define no color.
        assert_eq!(theme.token_color(TokenKind::Comment), None);
        assert_eq!(theme.token_color(TokenKind::Name), None);
        assert_eq!(theme.tokens.len(), 2);
    }

    #[test]
    fn missing_required_color_is_rejected() {
        let json = r##"{"name":"X","type":"dark","colors":{"background":"#000000"}}"##;
        assert!(serde_json::from_str::<ThemeFile>(json).is_err());
    }

    #[test]
    fn invalid_hex_uses_fallback() {
        assert_eq!(color_from_hex("zzz", Color::Red), Color::Red);
        assert_eq!(color_from_hex("#12345", Color::Red), Color::Red);
        assert_eq!(color_from_hex(" #0a0B0c ", Color::Red), Color::Rgb(10, 11, 12));
    }

    #[test]
    fn non_ascii_hex_uses_fallback() {
        assert_eq!(color_from_hex("#a\u{e9}\u{e9}b", Color::Reset), Color::Reset);
        assert_eq!(color_from_hex("#12345\u{e9}", Color::Red), Color::Red);
    }

    #[test]
    fn shipped_themes_parse_and_default_exists() {
        let themes = load_themes();
        assert!(themes.len() >= 2);
        let idx = theme_index(&themes, DEFAULT_THEME);
        assert_eq!(themes[idx].name, DEFAULT_THEME);
        assert!(themes[idx].token_color(TokenKind::String).is_some());
    }

    #[test]
    fn unknown_theme_name_selects_first() {
        let themes = load_themes();
        assert_eq!(theme_index(&themes, "does-not-exist"), 0);
    }
}
