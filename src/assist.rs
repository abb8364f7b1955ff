use std::collections::BTreeMap;

use crate::util::is_ident_char;

/// Indentation inserted after a line that opens a block.
pub(crate) const INDENT: &str = "    ";
const MAX_WORD_CANDIDATES: usize = 50;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const PYTHON_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bool", "bytes", "callable", "chr", "dict", "dir", "divmod",
    "enumerate", "filter", "float", "format", "frozenset", "getattr", "hasattr", "hash", "help",
    "hex", "id", "input", "int", "isinstance", "issubclass", "iter", "len", "list", "map", "max",
    "min", "next", "object", "open", "ord", "pow", "print", "range", "repr", "reversed", "round",
    "set", "setattr", "slice", "sorted", "str", "sum", "super", "tuple", "type", "vars", "zip",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompletionCandidate {
    pub(crate) name: String,
    pub(crate) detail: Option<String>,
}

/// Text inserted for an auto-closing opener; the cursor goes back one
/// character afterwards.
pub(crate) fn closing_pair(c: char) -> Option<&'static str> {
    match c {
        '(' => Some("()"),
        '[' => Some("[]"),
        '{' => Some("{}"),
        '"' => Some("\"\""),
        '\'' => Some("''"),
        _ => None,
    }
}

pub(crate) fn opens_block(line: &str) -> bool {
    line.trim().ends_with(':')
}

/// Replacement for the default newline on Enter, if any.
pub(crate) fn newline_for(line: &str) -> Option<String> {
    opens_block(line).then(|| format!("\n{INDENT}"))
}

fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_ident_char(c))
        .filter(|w| w.chars().next().is_some_and(|c| !c.is_ascii_digit()))
}

/// Offline completion: document identifiers plus Python keywords and
/// builtins that extend `prefix`. An empty prefix yields nothing.
pub(crate) fn word_candidates(text: &str, prefix: &str) -> Vec<CompletionCandidate> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let mut found: BTreeMap<&str, &'static str> = BTreeMap::new();
    let extends = |w: &str| w.len() > prefix.len() && w.starts_with(prefix);
    for kw in PYTHON_KEYWORDS.iter().copied().filter(|w| extends(w)) {
        found.insert(kw, "keyword");
    }
    for b in PYTHON_BUILTINS.iter().copied().filter(|w| extends(w)) {
        found.entry(b).or_insert("builtin");
    }
    for word in identifiers(text).filter(|w| extends(w)) {
        found.entry(word).or_insert("word");
    }
    found
        .into_iter()
        .take(MAX_WORD_CANDIDATES)
        .map(|(name, detail)| CompletionCandidate {
            name: name.to_string(),
            detail: Some(detail.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cands: &[CompletionCandidate]) -> Vec<&str> {
        cands.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn only_the_five_openers_pair() {
        assert_eq!(closing_pair('('), Some("()"));
        assert_eq!(closing_pair('{'), Some("{}"));
        assert_eq!(closing_pair('['), Some("[]"));
        assert_eq!(closing_pair('"'), Some("\"\""));
        assert_eq!(closing_pair('\''), Some("''"));
        assert_eq!(closing_pair('<'), None);
        assert_eq!(closing_pair(')'), None);
    }

    #[test]
    fn colon_line_gets_four_space_indent() {
        assert_eq!(newline_for("if x:").as_deref(), Some("\n    "));
        assert_eq!(newline_for("    for i in y:   ").as_deref(), Some("\n    "));
        assert_eq!(newline_for("x = 1"), None);
        assert_eq!(newline_for("d = {'a': 1}"), None);
        assert_eq!(newline_for(""), None);
    }

    #[test]
    fn word_candidates_mix_sources() {
        let text = "counter = 0\ncount_items = []\n";
        let cands = word_candidates(text, "co");
        assert_eq!(names(&cands), vec!["continue", "count_items", "counter"]);
        assert_eq!(cands[0].detail.as_deref(), Some("keyword"));
        assert_eq!(cands[1].detail.as_deref(), Some("word"));
    }

    #[test]
    fn word_candidates_skip_exact_and_numeric() {
        let cands = word_candidates("pr pr 9pr print_me", "pr");
        assert_eq!(names(&cands), vec!["print", "print_me"]);
        assert_eq!(cands[0].detail.as_deref(), Some("builtin"));
    }

    #[test]
    fn empty_prefix_gives_nothing() {
        assert!(word_candidates("alpha beta", "").is_empty());
    }
}
