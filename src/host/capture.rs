//! Screenshot capture service
//!
//! The local implementation writes the rendered HTML to a temp file and asks
//! a headless Chromium-family browser to rasterize it at the requested width.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No headless browser found (tried {0})")]
    BrowserNotFound(String),
    #[error("Capture at {width}px timed out after {secs}s")]
    TimedOut { width: u32, secs: u64 },
    #[error("Browser exited with {status}: {stderr}")]
    BrowserFailed { status: String, stderr: String },
    #[error("Capture I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Renders HTML content at a pixel width and returns the encoded image
#[async_trait]
pub trait ScreenshotService: Send + Sync {
    async fn capture(&self, content: &str, width: u32) -> Result<Bytes, CaptureError>;
}

/// Browsers probed on PATH when none is configured
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "microsoft-edge",
];

/// `ScreenshotService` using `<browser> --headless --screenshot`.
///
/// Callers bound each capture with a timeout; the browser process is killed
/// when the capture future is dropped.
#[derive(Debug, Clone)]
pub struct BrowserScreenshotService {
    browser: Option<String>,
    height: u32,
}

impl BrowserScreenshotService {
    pub fn new(browser: Option<String>, height: u32) -> Self {
        Self { browser, height }
    }

    fn locate_browser(&self) -> Result<PathBuf, CaptureError> {
        if let Some(browser) = &self.browser {
            return which::which(browser)
                .map_err(|_| CaptureError::BrowserNotFound(browser.clone()));
        }
        BROWSER_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| CaptureError::BrowserNotFound(BROWSER_CANDIDATES.join(", ")))
    }
}

#[async_trait]
impl ScreenshotService for BrowserScreenshotService {
    async fn capture(&self, content: &str, width: u32) -> Result<Bytes, CaptureError> {
        let browser = self.locate_browser()?;

        let workdir = tempfile::tempdir()?;
        let page = workdir.path().join("preview.html");
        let output = workdir.path().join("screenshot.png");
        tokio::fs::write(&page, content).await?;

        let page_url = Url::from_file_path(&page)
            .map_err(|_| CaptureError::Other(format!("Invalid page path {:?}", page)))?;

        debug!("Capturing {} at {}px with {:?}", page_url, width, browser);

        let mut command = Command::new(&browser);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg(format!("--window-size={},{}", width, self.height))
            .arg(format!("--screenshot={}", output.display()))
            .arg(page_url.as_str())
            .kill_on_drop(true);

        let result = command.output().await?;

        if !result.status.success() {
            return Err(CaptureError::BrowserFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let image = tokio::fs::read(&output).await?;
        info!("Captured {}px screenshot ({} bytes)", width, image.len());
        Ok(Bytes::from(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_browser_is_reported() {
        let service = BrowserScreenshotService::new(
            Some("inkwell-no-such-browser".to_string()),
            800,
        );
        let err = service.locate_browser().unwrap_err();
        assert!(matches!(err, CaptureError::BrowserNotFound(ref name) if name == "inkwell-no-such-browser"));
    }

    #[test]
    fn test_timeout_message_names_width() {
        let err = CaptureError::TimedOut { width: 375, secs: 30 };
        assert_eq!(err.to_string(), "Capture at 375px timed out after 30s");
    }
}
