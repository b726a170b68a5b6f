//! File access gateway: async file I/O plus the blocking path pickers

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Async file operations used by the workspace workflows
#[async_trait]
pub trait FileGateway: Send + Sync {
    /// Size in bytes, without reading the content
    async fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Read the whole file
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or replace a file
    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Delete a file or a directory tree. A missing path is not an error.
    async fn delete_recursive(&self, path: &Path) -> io::Result<()>;
}

/// Extension filter shown in a file dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extension: &str) -> Self {
        Self {
            name: name.to_string(),
            extensions: vec![extension.to_string()],
        }
    }

    /// True when `path` carries one of the filter's extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|f| f.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Options for a single-file open dialog
#[derive(Debug, Clone)]
pub struct OpenDialog {
    pub default_path: PathBuf,
    pub filters: Vec<FileFilter>,
}

/// Options for a save dialog
#[derive(Debug, Clone)]
pub struct SaveDialog {
    pub title: String,
    pub default_path: PathBuf,
    pub filters: Vec<FileFilter>,
}

/// Path pickers. Both block until the dialog is dismissed and return `None`
/// when the user cancels.
pub trait PathPicker: Send + Sync {
    fn pick_open_path(&self, dialog: &OpenDialog) -> Option<PathBuf>;
    fn pick_save_path(&self, dialog: &SaveDialog) -> Option<PathBuf>;
}

/// Picker answering from a queue of prepared responses.
///
/// The terminal host pushes the path typed on the command line before
/// invoking a workflow; an empty queue behaves like a cancelled dialog.
#[derive(Debug, Default)]
pub struct QueuedPicker {
    answers: Mutex<VecDeque<Option<PathBuf>>>,
}

impl QueuedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next dialog answer (`None` = cancel)
    pub fn push(&self, answer: Option<PathBuf>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }

    fn next(&self) -> Option<PathBuf> {
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .flatten()
    }
}

impl PathPicker for QueuedPicker {
    fn pick_open_path(&self, dialog: &OpenDialog) -> Option<PathBuf> {
        let answer = self.next();
        debug!(
            "Open dialog (default {:?}) answered with {:?}",
            dialog.default_path, answer
        );
        answer
    }

    fn pick_save_path(&self, dialog: &SaveDialog) -> Option<PathBuf> {
        let answer = self.next();
        debug!("Save dialog '{}' answered with {:?}", dialog.title, answer);
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_case_insensitive_extension() {
        let filter = FileFilter::new("All Files", "mjml");
        assert!(filter.accepts(Path::new("/tmp/welcome.mjml")));
        assert!(filter.accepts(Path::new("/tmp/WELCOME.MJML")));
        assert!(!filter.accepts(Path::new("/tmp/welcome.html")));
        assert!(!filter.accepts(Path::new("/tmp/mjml")));
    }

    #[test]
    fn test_queued_picker_answers_in_order_then_cancels() {
        let picker = QueuedPicker::new();
        picker.push(Some(PathBuf::from("/tmp/a.mjml")));
        picker.push(None);

        let dialog = OpenDialog {
            default_path: PathBuf::from("/tmp"),
            filters: vec![],
        };
        assert_eq!(picker.pick_open_path(&dialog), Some(PathBuf::from("/tmp/a.mjml")));
        assert_eq!(picker.pick_open_path(&dialog), None);
        // Empty queue behaves like a cancelled dialog
        assert_eq!(picker.pick_open_path(&dialog), None);
    }
}
