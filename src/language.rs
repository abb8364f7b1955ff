use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) enum Language {
    #[default]
    Python,
    JavaScript,
    C,
    Java,
}

impl Language {
    pub(crate) const ALL: [Language; 4] = [
        Language::Python,
        Language::JavaScript,
        Language::C,
        Language::Java,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::C => "C",
            Language::Java => "Java",
        }
    }

    /// Exact lookup; `None` for anything outside the fixed set.
    pub(crate) fn parse(name: &str) -> Option<Language> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(name))
    }

    pub(crate) fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::C => "c",
            Language::Java => "java",
        }
    }

    pub(crate) fn next(self) -> Language {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub(crate) fn index(self) -> usize {
        Self::ALL.iter().position(|l| *l == self).unwrap_or(0)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File-type filters offered by the open/save pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileFilter {
    Lang(Language),
    All,
}

impl FileFilter {
    pub(crate) const ALL: [FileFilter; 5] = [
        FileFilter::Lang(Language::Python),
        FileFilter::Lang(Language::JavaScript),
        FileFilter::Lang(Language::C),
        FileFilter::Lang(Language::Java),
        FileFilter::All,
    ];

    pub(crate) fn label(self) -> String {
        match self {
            FileFilter::Lang(lang) => format!("{} Files (*.{})", lang.name(), lang.extension()),
            FileFilter::All => "All Files (*.*)".to_string(),
        }
    }

    pub(crate) fn matches(self, file_name: &str) -> bool {
        match self {
            FileFilter::All => true,
            FileFilter::Lang(lang) => file_name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(lang.extension())),
        }
    }

    /// Extension appended by Save As when the typed name has none.
    pub(crate) fn default_extension(self) -> &'static str {
        match self {
            FileFilter::Lang(lang) => lang.extension(),
            FileFilter::All => Language::Python.extension(),
        }
    }

    pub(crate) fn next(self) -> FileFilter {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}
