//! In-memory workspace state: which directory is browsed and which file is
//! active. Only the controller mutates it; everyone else observes snapshots.

use std::path::{Path, PathBuf};

use crate::workspace::paths::{validate_file_name, PathError};

/// A file located under the current directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub name: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Absolute path of the file inside `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Workspace state snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceState {
    root_path: PathBuf,
    current_path: PathBuf,
    active_file: Option<FileRef>,
}

impl WorkspaceState {
    /// Fresh state for a workspace opened at `root_path`
    pub fn open(root_path: PathBuf) -> Self {
        Self {
            current_path: root_path.clone(),
            root_path,
            active_file: None,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    pub fn active_file(&self) -> Option<&FileRef> {
        self.active_file.as_ref()
    }

    /// Path of the active file, if any
    pub fn active_file_path(&self) -> Option<PathBuf> {
        self.active_file
            .as_ref()
            .map(|f| f.path_in(&self.current_path))
    }

    /// Navigate to `path`. Selecting a directory invalidates the selection.
    pub fn set_path(&mut self, path: PathBuf) {
        self.clear_active_file();
        self.current_path = path;
    }

    /// Select a file of the current directory. Names that are not a single
    /// entry of `current_path` are rejected and the selection is kept.
    pub fn set_active_file(&mut self, file: Option<FileRef>) -> Result<(), PathError> {
        if let Some(file) = &file {
            validate_file_name(&file.name)?;
        }
        self.active_file = file;
        Ok(())
    }

    pub fn clear_active_file(&mut self) {
        self.active_file = None;
    }

    /// Workspace name shown in the header (last component of the root)
    pub fn project_name(&self) -> String {
        self.root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_starts_at_root_without_selection() {
        let state = WorkspaceState::open(PathBuf::from("/projects/newsletter"));
        assert_eq!(state.current_path(), Path::new("/projects/newsletter"));
        assert!(state.active_file().is_none());
        assert_eq!(state.project_name(), "newsletter");
    }

    #[test]
    fn test_set_path_clears_active_file() {
        let mut state = WorkspaceState::open(PathBuf::from("/projects/newsletter"));
        state
            .set_active_file(Some(FileRef::new("invoice.mjml")))
            .unwrap();
        assert_eq!(
            state.active_file_path(),
            Some(PathBuf::from("/projects/newsletter/invoice.mjml"))
        );

        state.set_path(PathBuf::from("/projects/newsletter/archive"));
        assert!(state.active_file().is_none());
        assert_eq!(state.root_path(), Path::new("/projects/newsletter"));
    }

    #[test]
    fn test_active_file_must_stay_in_current_directory() {
        let mut state = WorkspaceState::open(PathBuf::from("/projects/news"));
        state
            .set_active_file(Some(FileRef::new("invoice.mjml")))
            .unwrap();

        assert_eq!(
            state.set_active_file(Some(FileRef::new("../../etc/passwd"))),
            Err(PathError::PathEscape)
        );
        assert!(state
            .set_active_file(Some(FileRef::new("/etc/passwd")))
            .is_err());
        assert!(state
            .set_active_file(Some(FileRef::new("archive/old.mjml")))
            .is_err());

        // Rejected names leave the previous selection in place
        assert_eq!(
            state.active_file_path(),
            Some(PathBuf::from("/projects/news/invoice.mjml"))
        );

        state.set_active_file(None).unwrap();
        assert!(state.active_file_path().is_none());
    }
}
