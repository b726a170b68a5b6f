//! Template rendering for hosts without their own preview engine
//!
//! Runs an external command (by default the `mjml` CLI) on the selected file
//! and turns its stdout into a preview artifact.

use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::workspace::preview::{PreviewArtifact, PreviewKind};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render command is empty")]
    NoCommand,
    #[error("Render command '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("Render output is not valid UTF-8")]
    InvalidOutput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a file into a `PreviewArtifact`
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: Vec<String>,
    template_extension: String,
}

impl CommandRenderer {
    pub fn new(command: Vec<String>, template_extension: &str) -> Self {
        Self {
            command,
            template_extension: template_extension.to_string(),
        }
    }

    /// Render `file`.
    ///
    /// Templates go through the render command, `.html` files are shown
    /// as-is, anything else becomes a non-HTML text artifact.
    pub async fn render(&self, file: &Path) -> Result<PreviewArtifact, RenderError> {
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == self.template_extension {
            return self.run_command(file).await;
        }

        let raw = tokio::fs::read(file).await?;
        let content = String::from_utf8(raw).map_err(|_| RenderError::InvalidOutput)?;
        if extension == "html" || extension == "htm" {
            Ok(PreviewArtifact::html(content))
        } else {
            Ok(PreviewArtifact::new(PreviewKind::Other(extension), content))
        }
    }

    async fn run_command(&self, file: &Path) -> Result<PreviewArtifact, RenderError> {
        let (program, args) = self.command.split_first().ok_or(RenderError::NoCommand)?;

        debug!("Rendering {:?} with {} {:?}", file, program, args);
        let output = Command::new(program).args(args).arg(file).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Render of {:?} failed: {}", file, stderr);
            return Err(RenderError::CommandFailed {
                command: self.command.join(" "),
                stderr,
            });
        }

        let html = String::from_utf8(output.stdout).map_err(|_| RenderError::InvalidOutput)?;
        Ok(PreviewArtifact::html(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_html_file_passes_through() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();

        let renderer = CommandRenderer::new(vec!["mjml".to_string(), "-s".to_string()], "mjml");
        let artifact = renderer.render(&path).await.unwrap();
        assert!(artifact.is_html());
        assert_eq!(artifact.content, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_other_files_are_not_html() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "plain").unwrap();

        let renderer = CommandRenderer::new(vec![], "mjml");
        let artifact = renderer.render(&path).await.unwrap();
        assert!(!artifact.is_html());
        assert_eq!(artifact.kind, PreviewKind::Other("txt".to_string()));
    }

    #[tokio::test]
    async fn test_template_without_command_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("welcome.mjml");
        std::fs::write(&path, "<mjml/>").unwrap();

        let renderer = CommandRenderer::new(vec![], "mjml");
        assert!(matches!(
            renderer.render(&path).await,
            Err(RenderError::NoCommand)
        ));
    }
}
