//! Dual-resolution screenshot export
//!
//! Runs as a small transaction: capture both images into memory, validate
//! them, then commit both files. A failed commit restores whatever was on
//! disk before, so callers only ever observe "both written" or "none".

use bytes::Bytes;
use futures::future::join;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::host::capture::{CaptureError, ScreenshotService};
use crate::host::gateway::FileGateway;
use crate::workspace::error::WorkspaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Mobile,
    Desktop,
}

impl Variant {
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Mobile => "Mobile",
            Variant::Desktop => "Desktop",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Variant::Mobile => "mobile",
            Variant::Desktop => "desktop",
        }
    }

    /// `<base>-mobile.png` / `<base>-desktop.png`
    pub fn file_name(&self, base: &str) -> String {
        format!("{}-{}.png", base, self.suffix())
    }
}

/// What to capture and where the images go
#[derive(Debug, Clone)]
pub struct ScreenshotPlan {
    pub base_name: String,
    pub target_dir: PathBuf,
    pub mobile_width: u32,
    pub desktop_width: u32,
    pub timeout: Duration,
}

impl ScreenshotPlan {
    pub fn target(&self, variant: Variant) -> PathBuf {
        self.target_dir.join(variant.file_name(&self.base_name))
    }
}

/// Paths written by a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotPair {
    pub mobile: PathBuf,
    pub desktop: PathBuf,
}

/// A captured image waiting to be committed
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub variant: Variant,
    pub target: PathBuf,
    pub image: Bytes,
}

impl StagedImage {
    fn validate(&self) -> Result<(), WorkspaceError> {
        match image::guess_format(&self.image) {
            Ok(image::ImageFormat::Png) => Ok(()),
            _ => Err(WorkspaceError::InvalidImage {
                label: self.variant.label(),
            }),
        }
    }
}

async fn capture_one(
    service: &dyn ScreenshotService,
    content: &str,
    width: u32,
    variant: Variant,
    timeout: Duration,
) -> Result<Bytes, WorkspaceError> {
    let captured = tokio::time::timeout(timeout, service.capture(content, width))
        .await
        .unwrap_or_else(|_| {
            Err(CaptureError::TimedOut {
                width,
                secs: timeout.as_secs(),
            })
        });
    captured.map_err(|source| WorkspaceError::Capture {
        label: variant.label(),
        source,
    })
}

/// Capture both widths concurrently and validate the results.
///
/// Fails as soon as either capture fails; nothing is written here.
pub async fn stage(
    service: &dyn ScreenshotService,
    content: &str,
    plan: &ScreenshotPlan,
) -> Result<[StagedImage; 2], WorkspaceError> {
    debug!(
        "Capturing {} at {}px and {}px",
        plan.base_name, plan.mobile_width, plan.desktop_width
    );

    let (mobile, desktop) = tokio::try_join!(
        capture_one(service, content, plan.mobile_width, Variant::Mobile, plan.timeout),
        capture_one(service, content, plan.desktop_width, Variant::Desktop, plan.timeout)
    )?;

    let staged = [
        StagedImage {
            variant: Variant::Mobile,
            target: plan.target(Variant::Mobile),
            image: mobile,
        },
        StagedImage {
            variant: Variant::Desktop,
            target: plan.target(Variant::Desktop),
            image: desktop,
        },
    ];
    for image in &staged {
        image.validate()?;
    }
    Ok(staged)
}

/// Existing content of `path`, `None` when the file does not exist
async fn snapshot(files: &dyn FileGateway, path: &Path) -> Result<Option<Vec<u8>>, WorkspaceError> {
    match files.read_file(path).await {
        Ok(previous) => Ok(Some(previous)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(WorkspaceError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Put `path` back to how it was before the commit
async fn restore(files: &dyn FileGateway, path: &Path, previous: Option<&[u8]>) -> io::Result<()> {
    match previous {
        Some(bytes) => files.write_file(path, bytes).await,
        None => files.delete_recursive(path).await,
    }
}

/// Write both staged images, all or nothing.
///
/// Both writes run concurrently and are awaited to completion. If one
/// fails the other is rolled back. If the rollback fails too, the error
/// lists the files that could not be restored.
pub async fn commit(
    files: &dyn FileGateway,
    staged: [StagedImage; 2],
) -> Result<ScreenshotPair, WorkspaceError> {
    let [mobile, desktop] = staged;

    let (previous_mobile, previous_desktop) =
        join(snapshot(files, &mobile.target), snapshot(files, &desktop.target)).await;
    let previous_mobile = previous_mobile?;
    let previous_desktop = previous_desktop?;

    let (mobile_written, desktop_written) = join(
        files.write_file(&mobile.target, &mobile.image),
        files.write_file(&desktop.target, &desktop.image),
    )
    .await;

    let (cause, written) = match (mobile_written, desktop_written) {
        (Ok(()), Ok(())) => {
            info!(
                "Saved screenshots {:?} and {:?}",
                mobile.target, desktop.target
            );
            return Ok(ScreenshotPair {
                mobile: mobile.target,
                desktop: desktop.target,
            });
        }
        (Err(source), Ok(())) => (
            WorkspaceError::Write {
                path: mobile.target.clone(),
                source,
            },
            vec![(&desktop.target, previous_desktop.as_deref())],
        ),
        (Ok(()), Err(source)) => (
            WorkspaceError::Write {
                path: desktop.target.clone(),
                source,
            },
            vec![(&mobile.target, previous_mobile.as_deref())],
        ),
        (Err(source), Err(_)) => (
            WorkspaceError::Write {
                path: mobile.target.clone(),
                source,
            },
            Vec::new(),
        ),
    };

    warn!("Screenshot commit failed, rolling back: {}", cause);
    let mut leftover = Vec::new();
    for (path, previous) in written {
        if let Err(e) = restore(files, path, previous).await {
            error!("Rollback of {:?} failed: {}", path, e);
            leftover.push(path.clone());
        }
    }

    if leftover.is_empty() {
        Err(cause)
    } else {
        Err(WorkspaceError::PartialCommit {
            leftover,
            cause: Box::new(cause),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_file_names() {
        assert_eq!(Variant::Mobile.file_name("invoice"), "invoice-mobile.png");
        assert_eq!(Variant::Desktop.file_name("invoice"), "invoice-desktop.png");
    }

    #[test]
    fn test_validate_rejects_non_png() {
        let png = StagedImage {
            variant: Variant::Mobile,
            target: PathBuf::from("/w/a-mobile.png"),
            image: Bytes::from_static(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
        };
        assert!(png.validate().is_ok());

        let jpeg = StagedImage {
            variant: Variant::Desktop,
            target: PathBuf::from("/w/a-desktop.png"),
            image: Bytes::from_static(b"\xFF\xD8\xFF\xE0\0\x10JFIF"),
        };
        assert!(matches!(
            jpeg.validate(),
            Err(WorkspaceError::InvalidImage { label: "Desktop" })
        ));
    }
}
