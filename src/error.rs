use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single user action. None of them are fatal: the action is
/// abandoned, state stays as it was, and the app shows a dialog.
#[derive(Debug, Error)]
pub(crate) enum IdeError {
    #[error("Save your code before running.")]
    SaveBeforeRun,
    #[error("Unsupported language selected: {0}")]
    UnsupportedLanguage(String),
    #[error("{}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl IdeError {
    pub(crate) fn dialog_title(&self) -> &'static str {
        match self {
            IdeError::SaveBeforeRun | IdeError::UnsupportedLanguage(_) | IdeError::Launch { .. } => {
                "Execution Error"
            }
            IdeError::Open { .. } => "Open File Error",
            IdeError::Save { .. } => "Save File Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_titles_follow_error_class() {
        assert_eq!(IdeError::SaveBeforeRun.dialog_title(), "Execution Error");
        assert_eq!(
            IdeError::UnsupportedLanguage("Cobol".into()).dialog_title(),
            "Execution Error"
        );
        let open = IdeError::Open {
            path: PathBuf::from("a.py"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(open.dialog_title(), "Open File Error");
        assert_eq!(open.to_string(), "a.py: missing");
    }

    #[test]
    fn launch_error_names_the_program() {
        let err = IdeError::Launch {
            program: "gcc".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.to_string(), "failed to launch `gcc`: No such file");
        assert_eq!(err.dialog_title(), "Execution Error");
    }
}
