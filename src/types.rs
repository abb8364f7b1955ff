use crate::error::IdeError;
use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingAction {
    None,
    /// Exit was requested with unsaved changes; a second Exit confirms.
    Exit,
}

/// Top-level menus in the menu bar, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuKind {
    File,
    Run,
    Language,
}

impl MenuKind {
    pub(crate) const ALL: [MenuKind; 3] = [MenuKind::File, MenuKind::Run, MenuKind::Language];

    pub(crate) fn title(self) -> &'static str {
        match self {
            MenuKind::File => "File",
            MenuKind::Run => "Run",
            MenuKind::Language => "Language",
        }
    }

    pub(crate) fn items(self) -> Vec<MenuItem> {
        match self {
            MenuKind::File => vec![
                MenuItem::Open,
                MenuItem::Save,
                MenuItem::SaveAs,
                MenuItem::Exit,
            ],
            MenuKind::Run => vec![MenuItem::Run],
            MenuKind::Language => Language::ALL.into_iter().map(MenuItem::Language).collect(),
        }
    }

    pub(crate) fn next(self) -> MenuKind {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub(crate) fn prev(self) -> MenuKind {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuItem {
    Open,
    Save,
    SaveAs,
    Exit,
    Run,
    Language(Language),
}

impl MenuItem {
    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::Open => "Open",
            MenuItem::Save => "Save",
            MenuItem::SaveAs => "Save As",
            MenuItem::Exit => "Exit",
            MenuItem::Run => "Run",
            MenuItem::Language(lang) => lang.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickerMode {
    Open,
    SaveAs,
}

impl PickerMode {
    pub(crate) fn title(self) -> &'static str {
        match self {
            PickerMode::Open => "Open File",
            PickerMode::SaveAs => "Save As",
        }
    }
}

/// Modal message box; dismissed with Enter, Esc or a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dialog {
    pub(crate) title: String,
    pub(crate) message: String,
}

impl From<&IdeError> for Dialog {
    fn from(err: &IdeError) -> Self {
        Self {
            title: err.dialog_title().to_string(),
            message: err.to_string(),
        }
    }
}

/// Latest runner result as shown in the output pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OutputPane {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) summary: String,
}
