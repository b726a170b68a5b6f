//! System integration: file manager and clipboard

use arboard::Clipboard;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
    #[error("Failed to write clipboard: {0}")]
    ClipboardFailed(String),
}

/// Host platform, decides how a folder is shown in the file manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

pub trait SystemShell: Send + Sync {
    /// Show `path` highlighted inside its containing folder
    fn reveal_in_folder(&self, path: &Path);
    /// Open `path` with the system default handler
    fn open_path(&self, path: &Path);
    fn write_clipboard(&self, text: &str) -> Result<(), ShellError>;
}

/// What the file manager is asked to show for a reveal request
#[derive(Debug, Clone, PartialEq, Eq)]
enum RevealTarget {
    /// Finder selects the entry (`open -R`)
    Select(PathBuf),
    /// No selection support, open the containing folder
    Folder(PathBuf),
}

fn reveal_target(platform: Platform, path: &Path) -> RevealTarget {
    match platform {
        Platform::MacOs => RevealTarget::Select(path.to_path_buf()),
        _ => RevealTarget::Folder(path.parent().unwrap_or(path).to_path_buf()),
    }
}

/// `SystemShell` backed by the desktop environment
pub struct NativeShell {
    platform: Platform,
    /// 延迟创建并保持存活，部分平台在 Clipboard 释放后会丢失内容
    clipboard: Mutex<Option<Clipboard>>,
}

impl NativeShell {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            clipboard: Mutex::new(None),
        }
    }
}

impl Default for NativeShell {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

fn open_detached(path: &Path) {
    debug!("Opening {:?}", path);
    if let Err(e) = open::that_detached(path) {
        warn!("Failed to open {:?}: {}", path, e);
    }
}

impl SystemShell for NativeShell {
    fn reveal_in_folder(&self, path: &Path) {
        match reveal_target(self.platform, path) {
            RevealTarget::Select(entry) => {
                debug!("Revealing {:?}", entry);
                if let Err(e) = Command::new("open")
                    .arg("-R")
                    .arg(&entry)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                {
                    warn!("Failed to reveal {:?}: {}", entry, e);
                }
            }
            RevealTarget::Folder(folder) => open_detached(&folder),
        }
    }

    fn open_path(&self, path: &Path) {
        open_detached(path);
    }

    fn write_clipboard(&self, text: &str) -> Result<(), ShellError> {
        let mut slot = self
            .clipboard
            .lock()
            .map_err(|e| ShellError::ClipboardUnavailable(e.to_string()))?;
        if slot.is_none() {
            let clipboard =
                Clipboard::new().map_err(|e| ShellError::ClipboardUnavailable(e.to_string()))?;
            *slot = Some(clipboard);
        }
        let Some(clipboard) = slot.as_mut() else {
            return Err(ShellError::ClipboardUnavailable(
                "clipboard not initialised".to_string(),
            ));
        };
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ShellError::ClipboardFailed(e.to_string()))?;
        debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform_matches_target() {
        let platform = Platform::current();
        if cfg!(target_os = "macos") {
            assert_eq!(platform, Platform::MacOs);
        } else if cfg!(target_os = "windows") {
            assert_eq!(platform, Platform::Windows);
        } else {
            assert_eq!(platform, Platform::Other);
        }
    }

    #[test]
    fn test_reveal_selects_on_macos_and_opens_parent_elsewhere() {
        let path = Path::new("/projects/news/archive");
        assert_eq!(
            reveal_target(Platform::MacOs, path),
            RevealTarget::Select(PathBuf::from("/projects/news/archive"))
        );
        assert_eq!(
            reveal_target(Platform::Windows, path),
            RevealTarget::Folder(PathBuf::from("/projects/news"))
        );
        assert_eq!(
            reveal_target(Platform::Other, Path::new("/")),
            RevealTarget::Folder(PathBuf::from("/"))
        );
    }

    #[test]
    fn test_clipboard_errors_name_the_failure() {
        let err = ShellError::ClipboardUnavailable("no display".to_string());
        assert_eq!(err.to_string(), "Clipboard unavailable: no display");
    }
}
