//! File-list collaborator
//!
//! The controller only ever asks the listing to `refresh`; what it shows and
//! how is up to the host.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Receives refresh requests after successful mutations
pub trait FileListing: Send + Sync {
    /// Re-read `dir` from disk
    fn refresh(&self, dir: &Path);
}

/// File entry for directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// List a directory: directories first, then case-insensitive by name.
/// Hidden temp files from in-flight writes and `.DS_Store` are skipped.
pub fn list_files(dir: &Path) -> std::io::Result<Vec<FileEntry>> {
    debug!("Listing files in: {:?}", dir);

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().to_string();

        if name == ".DS_Store" || (name.starts_with('.') && name.ends_with(".tmp")) {
            continue;
        }

        entries.push(FileEntry {
            is_dir: metadata.is_dir(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            name,
        });
    }

    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    Ok(entries)
}

/// Listing that keeps the last read of a directory in memory
#[derive(Debug, Default)]
pub struct DirectoryListing {
    dir: RwLock<Option<PathBuf>>,
    entries: RwLock<Vec<FileEntry>>,
    generation: AtomicU64,
}

impl DirectoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries from the last refresh
    pub fn entries(&self) -> Vec<FileEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Directory of the last refresh
    pub fn dir(&self) -> Option<PathBuf> {
        self.dir.read().ok().and_then(|d| d.clone())
    }

    /// Bumped on every refresh, lets hosts detect that a redraw is due
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl FileListing for DirectoryListing {
    fn refresh(&self, dir: &Path) {
        let entries = match list_files(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list {:?}: {}", dir, e);
                Vec::new()
            }
        };
        if let Ok(mut slot) = self.entries.write() {
            *slot = entries;
        }
        if let Ok(mut slot) = self.dir.write() {
            *slot = Some(dir.to_path_buf());
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_sorts_dirs_first_and_skips_temp_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("b.mjml"), "b").unwrap();
        fs::write(root.join("A.mjml"), "a").unwrap();
        fs::write(root.join(".b.mjml.0f3a.tmp"), "").unwrap();
        fs::create_dir(root.join("zeta")).unwrap();

        let names: Vec<String> = list_files(root).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["zeta", "A.mjml", "b.mjml"]);
    }

    #[test]
    fn test_refresh_updates_entries_and_generation() {
        let temp = TempDir::new().unwrap();
        let listing = DirectoryListing::new();
        assert_eq!(listing.generation(), 0);

        fs::write(temp.path().join("welcome.mjml"), "<mjml/>").unwrap();
        listing.refresh(temp.path());

        assert_eq!(listing.generation(), 1);
        assert_eq!(listing.dir().as_deref(), Some(temp.path()));
        let entries = listing.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "welcome.mjml");
        assert_eq!(entries[0].size, 7);
    }
}
