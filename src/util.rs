use std::fs;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;
use url::Url;

use crate::language::FileFilter;

/// Splits on `\n` only. `\r` stays attached to its line and a trailing
/// newline yields a final empty line, so `lines.join("\n")` restores the
/// input exactly.
pub(crate) fn text_to_lines(text: &str) -> Vec<String> {
    text.split('\n').map(ToString::to_string).collect()
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub(crate) fn inside(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

pub(crate) fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

pub(crate) fn to_u16_saturating(v: usize) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// Display columns taken by the first `col` characters of `line`.
pub(crate) fn display_col(line: &str, col: usize) -> usize {
    line.chars()
        .take(col)
        .map(|c| if c == '\t' { 4 } else { c.width().unwrap_or(0) })
        .sum()
}

/// Character column whose cell covers display column `target`; past the
/// end of the line this is the line length.
pub(crate) fn char_col_at_display(line: &str, target: usize) -> usize {
    let mut width = 0usize;
    for (i, c) in line.chars().enumerate() {
        let w = if c == '\t' { 4 } else { c.width().unwrap_or(0) };
        if width + w > target {
            return i;
        }
        width += w;
    }
    line.chars().count()
}

/// LSP `character` for a char column: UTF-16 code units, the protocol's
/// default position encoding.
pub(crate) fn utf16_col(line: &str, col: usize) -> usize {
    line.chars().take(col).map(char::len_utf16).sum()
}

/// `file://` URI for a path that may not exist yet.
pub(crate) fn file_uri(path: &Path) -> Option<String> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    let abs = abs.canonicalize().unwrap_or(abs);
    Url::from_file_path(abs).ok().map(|u| u.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirEntryItem {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

/// Directory listing for the file picker: `..` first (when there is a
/// parent), then directories, then files accepted by `filter`, each group
/// sorted by name. Hidden entries are skipped.
pub(crate) fn list_dir(dir: &Path, filter: FileFilter) -> Vec<DirEntryItem> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                dirs.push(DirEntryItem {
                    name,
                    path,
                    is_dir: true,
                });
            } else if filter.matches(&name) {
                files.push(DirEntryItem {
                    name,
                    path,
                    is_dir: false,
                });
            }
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));
    let mut out = Vec::with_capacity(dirs.len() + files.len() + 1);
    if let Some(parent) = dir.parent() {
        out.push(DirEntryItem {
            name: "..".to_string(),
            path: parent.to_path_buf(),
            is_dir: true,
        });
    }
    out.extend(dirs);
    out.extend(files);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use tempfile::tempdir;

    #[test]
    fn text_to_lines_keeps_every_separator() {
        assert_eq!(text_to_lines(""), vec![""]);
        assert_eq!(text_to_lines("a\n"), vec!["a", ""]);
        assert_eq!(text_to_lines("a\r\nb"), vec!["a\r", "b"]);
        assert_eq!(text_to_lines("a\n\nb").join("\n"), "a\n\nb");
    }

    #[test]
    fn ident_chars() {
        assert!(is_ident_char('a'));
        assert!(is_ident_char('_'));
        assert!(is_ident_char('9'));
        assert!(!is_ident_char('.'));
        assert!(!is_ident_char(' '));
    }

    #[test]
    fn inside_respects_rect_edges() {
        let rect = Rect::new(2, 3, 4, 2);
        assert!(inside(2, 3, rect));
        assert!(inside(5, 4, rect));
        assert!(!inside(6, 4, rect));
        assert!(!inside(2, 5, rect));
    }

    #[test]
    fn display_col_expands_tabs_and_wide_chars() {
        assert_eq!(display_col("abc", 2), 2);
        assert_eq!(display_col("\tx", 1), 4);
        assert_eq!(display_col("日本", 2), 4);
    }

    #[test]
    fn utf16_col_counts_surrogate_pairs() {
        assert_eq!(utf16_col("abc", 2), 2);
        assert_eq!(utf16_col("\u{e9}x", 2), 2);
        assert_eq!(utf16_col("\u{1f600}x", 1), 2);
        assert_eq!(utf16_col("\u{1f600}x", 2), 3);
        assert_eq!(utf16_col("ab", 10), 2);
    }

    #[test]
    fn char_col_at_display_inverts_display_col() {
        assert_eq!(char_col_at_display("abc", 1), 1);
        assert_eq!(char_col_at_display("\tx", 2), 0);
        assert_eq!(char_col_at_display("\tx", 4), 1);
        assert_eq!(char_col_at_display("日本", 3), 1);
        assert_eq!(char_col_at_display("ab", 10), 2);
    }

    #[test]
    fn list_dir_groups_and_filters() {
        let tmp = tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir(root.join("pkg")).expect("mkdir");
        fs::write(root.join("b.py"), "").expect("write");
        fs::write(root.join("a.py"), "").expect("write");
        fs::write(root.join("main.c"), "").expect("write");
        fs::write(root.join(".hidden.py"), "").expect("write");

        let items = list_dir(root, FileFilter::Lang(Language::Python));
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["..", "pkg", "a.py", "b.py"]);

        let all = list_dir(root, FileFilter::All);
        assert!(all.iter().any(|i| i.name == "main.c"));
        assert!(!all.iter().any(|i| i.name == ".hidden.py"));
    }
}
