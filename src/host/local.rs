//! Local file-system gateway
//!
//! Writes go through a temp file + rename so a failed write never leaves a
//! truncated target behind.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::gateway::FileGateway;

/// `FileGateway` backed by the local disk
#[derive(Debug, Clone, Default)]
pub struct LocalFileGateway {
    /// Move deleted paths to the system trash instead of unlinking them
    use_trash: bool,
}

impl LocalFileGateway {
    pub fn new(use_trash: bool) -> Self {
        Self { use_trash }
    }
}

/// Sibling temp path for an atomic write: `.<name>.<uuid>.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_name = format!(".{}.{}.tmp", name, Uuid::new_v4().simple());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

#[async_trait]
impl FileGateway for LocalFileGateway {
    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        debug!("Reading file: {:?}", path);
        fs::read(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        debug!("Writing file: {:?} ({} bytes)", path, contents.len());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = temp_path_for(path);
        let written = async {
            let mut temp_file = fs::File::create(&temp_path).await?;
            temp_file.write_all(contents).await?;
            temp_file.sync_all().await?;
            drop(temp_file);
            fs::rename(&temp_path, path).await
        }
        .await;

        if written.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to clean up temp file {:?}: {}", temp_path, e);
                }
            }
        }
        written
    }

    async fn delete_recursive(&self, path: &Path) -> io::Result<()> {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Delete target already gone: {:?}", path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.use_trash {
            debug!("Moving to trash: {:?}", path);
            let target = path.to_path_buf();
            return tokio::task::spawn_blocking(move || trash::delete(&target))
                .await
                .map_err(io::Error::other)?
                .map_err(|e| io::Error::other(e.to_string()));
        }

        debug!("Deleting: {:?}", path);
        if metadata.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let gateway = LocalFileGateway::default();
        let path = temp.path().join("nested").join("welcome.mjml");

        gateway.write_file(&path, b"<mjml></mjml>").await.unwrap();
        let content = gateway.read_file(&path).await.unwrap();
        assert_eq!(content, b"<mjml></mjml>");

        // No temp files left next to the target
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_write_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let gateway = LocalFileGateway::default();
        let path = temp.path().join("a.html");

        gateway.write_file(&path, b"first version").await.unwrap();
        gateway.write_file(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_delete_recursive_removes_directory_tree() {
        let temp = TempDir::new().unwrap();
        let gateway = LocalFileGateway::default();
        let dir = temp.path().join("drafts");
        std::fs::create_dir_all(dir.join("old")).unwrap();
        std::fs::write(dir.join("old").join("a.mjml"), "x").unwrap();

        gateway.delete_recursive(&dir).await.unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_file_size_reads_metadata() {
        let temp = TempDir::new().unwrap();
        let gateway = LocalFileGateway::default();
        let path = temp.path().join("promo.mjml");
        std::fs::write(&path, "<mjml/>").unwrap();

        assert_eq!(gateway.file_size(&path).await.unwrap(), 7);
        let missing = gateway.file_size(&temp.path().join("nope.mjml")).await;
        assert_eq!(missing.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_ok() {
        let temp = TempDir::new().unwrap();
        let gateway = LocalFileGateway::default();
        assert!(gateway
            .delete_recursive(&temp.path().join("missing.mjml"))
            .await
            .is_ok());
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/work/news/invoice-mobile.png"));
        assert_eq!(temp.parent(), Some(Path::new("/work/news")));
        let name = temp.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".invoice-mobile.png."));
        assert!(name.ends_with(".tmp"));
    }
}
