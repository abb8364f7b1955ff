use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::IdeError;

/// Association between the in-memory document and a file on disk.
///
/// The session never holds the document itself; callers pass the text in on
/// save and receive it on open, and only a successful operation moves the
/// path.
#[derive(Debug, Default)]
pub(crate) struct FileSession {
    path: Option<PathBuf>,
    dirty: bool,
}

impl FileSession {
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reads `path` and records it. On failure nothing changes.
    pub(crate) fn open(&mut self, path: &Path) -> Result<String, IdeError> {
        let text = fs::read_to_string(path).map_err(|source| IdeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        info!(path = %path.display(), bytes = text.len(), "opened file");
        Ok(text)
    }

    /// Overwrites the current path. Returns `Ok(false)` when there is no
    /// path yet and the caller has to ask for one (Save As).
    pub(crate) fn save(&mut self, text: &str) -> Result<bool, IdeError> {
        let Some(path) = self.path.clone() else {
            return Ok(false);
        };
        write_verbatim(&path, text)?;
        self.dirty = false;
        info!(path = %path.display(), bytes = text.len(), "saved file");
        Ok(true)
    }

    /// Writes to `path` and adopts it as the current path on success.
    pub(crate) fn save_as(&mut self, path: &Path, text: &str) -> Result<(), IdeError> {
        write_verbatim(path, text)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        info!(path = %path.display(), bytes = text.len(), "saved file as");
        Ok(())
    }
}

fn write_verbatim(path: &Path, text: &str) -> Result<(), IdeError> {
    fs::write(path, text).map_err(|source| IdeError::Save {
        path: path.to_path_buf(),
        source,
    })
}

/// Save As target for a typed name: relative names resolve against `dir`,
/// and a name without an extension gets `default_ext`.
pub(crate) fn resolve_save_target(dir: &Path, name: &str, default_ext: &str) -> PathBuf {
    let mut path = PathBuf::from(name);
    if path.is_relative() {
        path = dir.join(path);
    }
    if path.extension().is_none() {
        path.set_extension(default_ext);
    }
    path
}
