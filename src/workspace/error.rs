use std::path::PathBuf;
use thiserror::Error;

use crate::host::capture::CaptureError;
use crate::host::shell::ShellError;
use crate::workspace::paths::PathError;

/// Failures of the workspace workflows. Each one is reported to the user
/// through the notifier before being returned.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Not a template file: {}", .0.display())]
    NotATemplate(PathBuf),
    #[error("Template exceeds 1MB limit: {}", .0.display())]
    TemplateTooLarge(PathBuf),
    #[error("Template is not valid UTF-8: {}", .0.display())]
    InvalidUtf8(PathBuf),
    #[error("{label} screenshot failed: {source}")]
    Capture {
        label: &'static str,
        #[source]
        source: CaptureError,
    },
    #[error("{label} screenshot is not a PNG image")]
    InvalidImage { label: &'static str },
    #[error("{cause}; left behind: {}", display_paths(.leftover))]
    PartialCommit {
        leftover: Vec<PathBuf>,
        cause: Box<WorkspaceError>,
    },
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ShellError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_name_the_path() {
        let err = WorkspaceError::Write {
            path: PathBuf::from("/work/invoice-mobile.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to write /work/invoice-mobile.png: denied");
    }

    #[test]
    fn test_partial_commit_lists_leftovers() {
        let err = WorkspaceError::PartialCommit {
            leftover: vec![PathBuf::from("/w/a-mobile.png")],
            cause: Box::new(WorkspaceError::InvalidImage { label: "Desktop" }),
        };
        assert_eq!(
            err.to_string(),
            "Desktop screenshot is not a PNG image; left behind: /w/a-mobile.png"
        );
    }
}
