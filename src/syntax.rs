//! Whole-document tokenizer used for coloring.
//!
//! Every language shares one scanner driven by a [`LangRules`] table. The
//! scanner never drops input: the concatenated token texts always equal the
//! source, which is what lets [`token_spans`] partition the document.

use crate::language::Language;
use crate::util::is_ident_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TokenKind {
    Text,
    Whitespace,
    Keyword,
    KeywordConstant,
    KeywordType,
    Name,
    NameFunction,
    NameClass,
    NameBuiltin,
    NameDecorator,
    String,
    StringEscape,
    Number,
    Comment,
    CommentPreproc,
    Operator,
    Punctuation,
}

impl TokenKind {
    pub(crate) const ALL: [TokenKind; 17] = [
        TokenKind::Text,
        TokenKind::Whitespace,
        TokenKind::Keyword,
        TokenKind::KeywordConstant,
        TokenKind::KeywordType,
        TokenKind::Name,
        TokenKind::NameFunction,
        TokenKind::NameClass,
        TokenKind::NameBuiltin,
        TokenKind::NameDecorator,
        TokenKind::String,
        TokenKind::StringEscape,
        TokenKind::Number,
        TokenKind::Comment,
        TokenKind::CommentPreproc,
        TokenKind::Operator,
        TokenKind::Punctuation,
    ];

    /// Dotted name, as used by theme files.
    pub(crate) fn name(self) -> &'static str {
        match self {
            TokenKind::Text => "Text",
            TokenKind::Whitespace => "Text.Whitespace",
            TokenKind::Keyword => "Keyword",
            TokenKind::KeywordConstant => "Keyword.Constant",
            TokenKind::KeywordType => "Keyword.Type",
            TokenKind::Name => "Name",
            TokenKind::NameFunction => "Name.Function",
            TokenKind::NameClass => "Name.Class",
            TokenKind::NameBuiltin => "Name.Builtin",
            TokenKind::NameDecorator => "Name.Decorator",
            TokenKind::String => "String",
            TokenKind::StringEscape => "String.Escape",
            TokenKind::Number => "Number",
            TokenKind::Comment => "Comment",
            TokenKind::CommentPreproc => "Comment.Preproc",
            TokenKind::Operator => "Operator",
            TokenKind::Punctuation => "Punctuation",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<TokenKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub(crate) fn parent(self) -> Option<TokenKind> {
        match self {
            TokenKind::Whitespace => Some(TokenKind::Text),
            TokenKind::KeywordConstant | TokenKind::KeywordType => Some(TokenKind::Keyword),
            TokenKind::NameFunction
            | TokenKind::NameClass
            | TokenKind::NameBuiltin
            | TokenKind::NameDecorator => Some(TokenKind::Name),
            TokenKind::StringEscape => Some(TokenKind::String),
            TokenKind::CommentPreproc => Some(TokenKind::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
}

/// Character offsets, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenSpan {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

struct LangRules {
    keywords: &'static [&'static str],
    constants: &'static [&'static str],
    types: &'static [&'static str],
    builtins: &'static [&'static str],
    line_comment: &'static str,
    block_comment: Option<(&'static str, &'static str)>,
    triple_quotes: bool,
    string_prefixes: &'static [&'static str],
    backtick_strings: bool,
    preprocessor: bool,
    decorators: bool,
    dollar_idents: bool,
    function_openers: &'static [&'static str],
    class_openers: &'static [&'static str],
}

const PYTHON: LangRules = LangRules {
    keywords: &[
        "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
        "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
        "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
        "with", "yield",
    ],
    constants: &["True", "False", "None"],
    types: &[],
    builtins: &[
        "abs", "all", "any", "bool", "bytes", "dict", "enumerate", "filter", "float", "input",
        "int", "isinstance", "len", "list", "map", "max", "min", "open", "print", "range",
        "repr", "reversed", "set", "sorted", "str", "sum", "super", "tuple", "type", "zip",
        "self",
    ],
    line_comment: "#",
    block_comment: None,
    triple_quotes: true,
    string_prefixes: &[
        "r", "u", "b", "f", "br", "rb", "fr", "rf", "R", "U", "B", "F", "BR", "RB", "FR", "RF",
        "Br", "bR", "Rb", "rB", "Fr", "fR", "Rf", "rF",
    ],
    backtick_strings: false,
    preprocessor: false,
    decorators: true,
    dollar_idents: false,
    function_openers: &["def"],
    class_openers: &["class"],
};

const JAVASCRIPT: LangRules = LangRules {
    keywords: &[
        "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "export", "extends", "finally", "for", "from",
        "function", "if", "import", "in", "instanceof", "let", "new", "of", "return", "static",
        "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with",
        "yield",
    ],
    constants: &["true", "false", "null", "undefined", "NaN", "Infinity"],
    types: &[],
    builtins: &[
        "Array", "Boolean", "Date", "Error", "JSON", "Map", "Math", "Number", "Object",
        "Promise", "RegExp", "Set", "String", "Symbol", "console", "document", "globalThis",
        "module", "parseFloat", "parseInt", "process", "require", "window",
    ],
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    triple_quotes: false,
    string_prefixes: &[],
    backtick_strings: true,
    preprocessor: false,
    decorators: false,
    dollar_idents: true,
    function_openers: &["function"],
    class_openers: &["class"],
};

const C: LangRules = LangRules {
    keywords: &[
        "auto", "break", "case", "const", "continue", "default", "do", "else", "enum",
        "extern", "for", "goto", "if", "inline", "register", "restrict", "return", "sizeof",
        "static", "struct", "switch", "typedef", "union", "volatile", "while",
    ],
    constants: &["NULL", "true", "false"],
    types: &[
        "bool", "char", "double", "float", "int", "long", "short", "signed", "size_t",
        "unsigned", "void", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
        "uint32_t", "uint64_t",
    ],
    builtins: &[
        "printf", "scanf", "malloc", "calloc", "realloc", "free", "strlen", "strcpy", "strcmp",
        "memcpy", "memset", "fprintf", "fopen", "fclose", "puts", "exit",
    ],
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    triple_quotes: false,
    string_prefixes: &["L", "u", "U", "u8"],
    backtick_strings: false,
    preprocessor: true,
    decorators: false,
    dollar_idents: false,
    function_openers: &[],
    class_openers: &["struct", "union", "enum"],
};

const JAVA: LangRules = LangRules {
    keywords: &[
        "abstract", "assert", "break", "case", "catch", "class", "continue", "default", "do",
        "else", "enum", "extends", "final", "finally", "for", "if", "implements", "import",
        "instanceof", "interface", "new", "package", "private", "protected", "public",
        "return", "static", "super", "switch", "synchronized", "this", "throw", "throws",
        "try", "var", "volatile", "while", "record",
    ],
    constants: &["true", "false", "null"],
    types: &[
        "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
    ],
    builtins: &[
        "String", "System", "Math", "Object", "Integer", "Long", "Double", "Boolean",
        "List", "ArrayList", "Map", "HashMap", "Exception",
    ],
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    triple_quotes: true,
    string_prefixes: &[],
    backtick_strings: false,
    preprocessor: false,
    decorators: true,
    dollar_idents: true,
    function_openers: &[],
    class_openers: &["class", "interface", "enum", "record"],
};

fn rules_for(lang: Language) -> &'static LangRules {
    match lang {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::C => &C,
        Language::Java => &JAVA,
    }
}

const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~?";
const PUNCTUATION_CHARS: &str = "()[]{},;.:";

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    rules: &'a LangRules,
    tokens: Vec<Token>,
    /// Last keyword seen, cleared by any other significant token.
    opener: Option<&'static str>,
}

impl<'a> Scanner<'a> {
    fn at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, pat: &str) -> bool {
        let mut i = self.pos;
        for c in pat.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn at_line_start(&self) -> bool {
        self.chars[..self.pos]
            .iter()
            .rev()
            .take_while(|c| **c != '\n')
            .all(|c| c.is_whitespace())
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if start == self.pos {
            return;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if kind != TokenKind::Whitespace && kind != TokenKind::Comment {
            self.opener = None;
        }
        // Adjacent pieces of one kind are merged so plain runs stay one token.
        if let Some(last) = self.tokens.last_mut() {
            if last.kind == kind && matches!(kind, TokenKind::Whitespace | TokenKind::String) {
                last.text.push_str(&text);
                return;
            }
        }
        self.tokens.push(Token { kind, text });
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.chars.len() {
            let start = self.pos;
            let ch = self.chars[self.pos];

            if ch.is_whitespace() {
                while self.at(0).is_some_and(char::is_whitespace) {
                    self.pos += 1;
                }
                self.push(TokenKind::Whitespace, start);
                continue;
            }
            if self.rules.preprocessor && ch == '#' && self.at_line_start() {
                self.scan_preprocessor();
                self.push(TokenKind::CommentPreproc, start);
                continue;
            }
            if self.starts_with(self.rules.line_comment) {
                while self.at(0).is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
                self.push(TokenKind::Comment, start);
                continue;
            }
            if let Some((open, close)) = self.rules.block_comment {
                if self.starts_with(open) {
                    self.pos += open.chars().count();
                    while self.pos < self.chars.len() && !self.starts_with(close) {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + close.chars().count()).min(self.chars.len());
                    self.push(TokenKind::Comment, start);
                    continue;
                }
            }
            if self.is_quote(ch) {
                self.scan_string(start);
                continue;
            }
            if ch.is_ascii_digit() || (ch == '.' && self.at(1).is_some_and(|c| c.is_ascii_digit()))
            {
                self.scan_number();
                self.push(TokenKind::Number, start);
                continue;
            }
            if self.rules.decorators && ch == '@' && self.at(1).is_some_and(is_ident_start) {
                self.pos += 1;
                while self
                    .at(0)
                    .is_some_and(|c| is_ident_char(c) || c == '.')
                {
                    self.pos += 1;
                }
                self.push(TokenKind::NameDecorator, start);
                continue;
            }
            if is_ident_start(ch) || (self.rules.dollar_idents && ch == '$') {
                self.scan_word(start);
                continue;
            }
            if OPERATOR_CHARS.contains(ch) {
                while self.at(0).is_some_and(|c| OPERATOR_CHARS.contains(c)) {
                    self.pos += 1;
                }
                self.push(TokenKind::Operator, start);
                continue;
            }
            self.pos += 1;
            if PUNCTUATION_CHARS.contains(ch) {
                self.push(TokenKind::Punctuation, start);
            } else {
                self.push(TokenKind::Text, start);
            }
        }
        self.tokens
    }

    fn is_quote(&self, ch: char) -> bool {
        ch == '"' || ch == '\'' || (self.rules.backtick_strings && ch == '`')
    }

    fn scan_preprocessor(&mut self) {
        while let Some(c) = self.at(0) {
            if c == '\n' {
                let continued = self.pos > 0 && self.chars[self.pos - 1] == '\\';
                if !continued {
                    break;
                }
            }
            self.pos += 1;
        }
    }

    fn scan_number(&mut self) {
        while let Some(c) = self.at(0) {
            let exponent_sign = (c == '+' || c == '-')
                && self.pos > 0
                && matches!(self.chars[self.pos - 1], 'e' | 'E')
                && !self.number_is_hex();
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number_is_hex(&self) -> bool {
        let digits: String = self.chars[..self.pos]
            .iter()
            .rev()
            .take_while(|c| c.is_ascii_alphanumeric() || **c == '_' || **c == '.')
            .collect();
        let lower = digits.to_ascii_lowercase();
        lower.ends_with("x0")
    }

    fn scan_word(&mut self, start: usize) {
        self.pos += 1;
        while self
            .at(0)
            .is_some_and(|c| is_ident_char(c) || (self.rules.dollar_idents && c == '$'))
        {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if self.at(0).is_some_and(|c| self.is_quote(c))
            && self.rules.string_prefixes.contains(&word.as_str())
        {
            self.scan_string(start);
            return;
        }
        let rules = self.rules;
        let opener = self.opener;
        if let Some(kw) = rules.keywords.iter().find(|k| **k == word) {
            self.push(TokenKind::Keyword, start);
            self.opener = Some(*kw);
            return;
        }
        let kind = if opener.is_some_and(|o| rules.function_openers.contains(&o)) {
            TokenKind::NameFunction
        } else if opener.is_some_and(|o| rules.class_openers.contains(&o)) {
            TokenKind::NameClass
        } else if rules.constants.contains(&word.as_str()) {
            TokenKind::KeywordConstant
        } else if rules.types.contains(&word.as_str()) {
            TokenKind::KeywordType
        } else if rules.builtins.contains(&word.as_str()) {
            TokenKind::NameBuiltin
        } else {
            TokenKind::Name
        };
        self.push(kind, start);
    }

    /// `start` may sit before a string prefix such as `r` or `f`.
    fn scan_string(&mut self, start: usize) {
        let quote = self.chars[self.pos];
        let triple = self.rules.triple_quotes
            && quote != '`'
            && self.at(1) == Some(quote)
            && self.at(2) == Some(quote);
        let delim_len = if triple { 3 } else { 1 };
        let multiline = triple || quote == '`';
        let raw = self.chars[start..self.pos]
            .iter()
            .any(|c| matches!(c, 'r' | 'R'));
        self.pos += delim_len;
        let mut piece = start;
        loop {
            let Some(c) = self.at(0) else {
                break;
            };
            if c == '\\' && !raw && self.pos + 1 < self.chars.len() {
                self.push(TokenKind::String, piece);
                let esc = self.pos;
                self.pos += 2;
                self.push(TokenKind::StringEscape, esc);
                piece = self.pos;
                continue;
            }
            if c == '\\' && raw {
                self.pos = (self.pos + 2).min(self.chars.len());
                continue;
            }
            if c == '\n' && !multiline {
                break;
            }
            if c == quote && (!triple || (self.at(1) == Some(quote) && self.at(2) == Some(quote))) {
                self.pos += delim_len;
                break;
            }
            self.pos += 1;
        }
        self.push(TokenKind::String, piece);
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Tokens in source order; their texts concatenate back to `text`.
pub(crate) fn tokenize(text: &str, lang: Language) -> Vec<Token> {
    Scanner {
        chars: text.chars().collect(),
        pos: 0,
        rules: rules_for(lang),
        tokens: Vec::new(),
        opener: None,
    }
    .run()
}

/// Walks the tokens with a running character offset.
pub(crate) fn token_spans(tokens: &[Token]) -> Vec<TokenSpan> {
    let mut spans = Vec::with_capacity(tokens.len());
    let mut offset = 0usize;
    for token in tokens {
        let len = token.text.chars().count();
        spans.push(TokenSpan {
            kind: token.kind,
            start: offset,
            end: offset + len,
        });
        offset += len;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(text: &str, lang: Language) -> Vec<(TokenKind, String)> {
        tokenize(text, lang)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn assert_partition(text: &str, lang: Language) {
        let tokens = tokenize(text, lang);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, text, "{lang}: tokens must rebuild the input");
        let spans = token_spans(&tokens);
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.start, expected_start, "{lang}: gap or overlap");
            assert!(span.end > span.start, "{lang}: empty span");
            expected_start = span.end;
        }
        assert_eq!(expected_start, text.chars().count());
    }

    #[test]
    fn spans_partition_every_language() {
        let samples = [
            "",
            "def f(x):\n    return x + 1\n",
            "s = '''multi\nline''' # tail",
            "unterminated = \"abc\nnext",
            "/* open comment",
            "#include <stdio.h>\nint main(void) { printf(\"%d\\n\", 0x1F); }\n",
            "const t = `a\n${b}`; // done",
            "@Override public void run() { String s = \"\\t\"; }",
            "x = 1e-5 + .5 - 0xFFe+1",
            "ünïcode = 'ß' + \"日本\"\r\n",
            "\\\\ stray \\ backslashes \\",
            "'\\",
        ];
        for lang in Language::ALL {
            for sample in samples {
                assert_partition(sample, lang);
            }
        }
    }

    #[test]
    fn python_keywords_names_and_comments() {
        let toks = kinds_of("def greet(name):\n    return None  # done", Language::Python);
        assert_eq!(
            toks,
            vec![
                (TokenKind::Keyword, "def".to_string()),
                (TokenKind::NameFunction, "greet".to_string()),
                (TokenKind::Punctuation, "(".to_string()),
                (TokenKind::Name, "name".to_string()),
                (TokenKind::Punctuation, ")".to_string()),
                (TokenKind::Punctuation, ":".to_string()),
                (TokenKind::Keyword, "return".to_string()),
                (TokenKind::KeywordConstant, "None".to_string()),
                (TokenKind::Comment, "# done".to_string()),
            ]
        );
    }

    #[test]
    fn python_class_and_builtin() {
        let toks = kinds_of("class Foo: print", Language::Python);
        assert_eq!(toks[1], (TokenKind::NameClass, "Foo".to_string()));
        assert_eq!(toks[3], (TokenKind::NameBuiltin, "print".to_string()));
    }

    #[test]
    fn escapes_are_split_out_of_strings() {
        let toks = kinds_of("'a\\nb'", Language::Python);
        assert_eq!(
            toks,
            vec![
                (TokenKind::String, "'a".to_string()),
                (TokenKind::StringEscape, "\\n".to_string()),
                (TokenKind::String, "b'".to_string()),
            ]
        );
    }

    #[test]
    fn raw_and_prefixed_strings() {
        let toks = kinds_of("r'\\d+' f\"{x}\"", Language::Python);
        assert_eq!(toks[0], (TokenKind::String, "r'\\d+'".to_string()));
        assert_eq!(toks[1], (TokenKind::String, "f\"{x}\"".to_string()));
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let toks = kinds_of("\"\"\"doc\nmore\"\"\" x", Language::Python);
        assert_eq!(toks[0], (TokenKind::String, "\"\"\"doc\nmore\"\"\"".to_string()));
        assert_eq!(toks[1], (TokenKind::Name, "x".to_string()));
    }

    #[test]
    fn hash_is_not_a_comment_outside_python() {
        let toks = kinds_of("#define N 3\nint x;", Language::C);
        assert_eq!(toks[0], (TokenKind::CommentPreproc, "#define N 3".to_string()));
        assert_eq!(toks[1], (TokenKind::KeywordType, "int".to_string()));
    }

    #[test]
    fn c_block_comment_and_struct_name() {
        let toks = kinds_of("/* a\n b */ struct point", Language::C);
        assert_eq!(toks[0], (TokenKind::Comment, "/* a\n b */".to_string()));
        assert_eq!(toks[1], (TokenKind::Keyword, "struct".to_string()));
        assert_eq!(toks[2], (TokenKind::NameClass, "point".to_string()));
    }

    #[test]
    fn javascript_function_and_template() {
        let toks = kinds_of("function go() { return `x`; }", Language::JavaScript);
        assert_eq!(toks[0], (TokenKind::Keyword, "function".to_string()));
        assert_eq!(toks[1], (TokenKind::NameFunction, "go".to_string()));
        assert!(toks.contains(&(TokenKind::String, "`x`".to_string())));
    }

    #[test]
    fn java_annotation_and_types() {
        let toks = kinds_of("@Override\npublic static void main", Language::Java);
        assert_eq!(toks[0], (TokenKind::NameDecorator, "@Override".to_string()));
        assert_eq!(toks[3], (TokenKind::KeywordType, "void".to_string()));
        assert_eq!(toks[4], (TokenKind::Name, "main".to_string()));
    }

    #[test]
    fn numbers_with_exponents_and_hex() {
        let toks = kinds_of("1e-5 0x1F", Language::C);
        assert_eq!(toks[0], (TokenKind::Number, "1e-5".to_string()));
        assert_eq!(toks[1], (TokenKind::Number, "0x1F".to_string()));
    }

    #[test]
    fn kind_hierarchy() {
        assert_eq!(TokenKind::KeywordConstant.parent(), Some(TokenKind::Keyword));
        assert_eq!(TokenKind::Keyword.parent(), None);
        assert_eq!(TokenKind::from_name("Name.Builtin"), Some(TokenKind::NameBuiltin));
        assert_eq!(TokenKind::from_name("Name.Other"), None);
    }

    #[test]
    fn span_offsets_count_characters_not_bytes() {
        let spans = token_spans(&tokenize("é = 1", Language::Python));
        assert_eq!(spans[0], TokenSpan { kind: TokenKind::Name, start: 0, end: 1 });
        assert_eq!(spans.last().map(|s| s.end), Some(5));
    }
}
