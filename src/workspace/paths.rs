//! Path resolution inside the browsed directory

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Maximum path length
pub const MAX_PATH_LENGTH: usize = 4096;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Path escapes the current directory")]
    PathEscape,
    #[error("Path exceeds maximum length")]
    PathTooLong,
    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Resolve `name` against `base` without touching the disk.
///
/// Absolute names are accepted when they lie under `base`. `.` and `..` are
/// folded lexically; anything that climbs above `base` or resolves to
/// `base` itself is rejected.
pub fn resolve_under(base: &Path, name: &str) -> Result<PathBuf, PathError> {
    if name.len() > MAX_PATH_LENGTH {
        return Err(PathError::PathTooLong);
    }
    if name.contains('\0') {
        return Err(PathError::InvalidName("name contains a NUL byte".to_string()));
    }

    let candidate = Path::new(name);
    let relative = if candidate.is_absolute() {
        candidate
            .strip_prefix(base)
            .map_err(|_| PathError::PathEscape)?
            .to_path_buf()
    } else {
        candidate.to_path_buf()
    };

    let mut components: Vec<&std::ffi::OsStr> = Vec::new();
    for component in relative.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if components.pop().is_none() {
                    return Err(PathError::PathEscape);
                }
            }
            Component::Normal(part) => components.push(part),
            Component::RootDir | Component::Prefix(_) => return Err(PathError::PathEscape),
        }
    }

    if components.is_empty() {
        return Err(PathError::InvalidName(format!(
            "'{}' does not name an entry",
            name
        )));
    }

    let mut full_path = base.to_path_buf();
    for component in components {
        full_path.push(component);
    }
    Ok(full_path)
}

/// Check that `name` is a single entry name: no separators, no `.`/`..`,
/// not absolute.
pub fn validate_file_name(name: &str) -> Result<(), PathError> {
    if name.len() > MAX_PATH_LENGTH {
        return Err(PathError::PathTooLong);
    }
    if name.contains('\0') {
        return Err(PathError::InvalidName("name contains a NUL byte".to_string()));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        (Some(Component::ParentDir), _) | (Some(Component::RootDir), _) => {
            Err(PathError::PathEscape)
        }
        _ => Err(PathError::InvalidName(format!(
            "'{}' is not a file name in the current directory",
            name
        ))),
    }
}

/// Name of a file with `extension` stripped, when it is the suffix
/// (`invoice.mjml` -> `invoice`, `invoice.txt` stays `invoice.txt`).
pub fn strip_extension(file_name: &str, extension: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let suffix = format!(".{}", extension);
    match base.strip_suffix(&suffix) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape_prevention() {
        let root = Path::new("/projects/news");

        // Valid paths
        assert_eq!(
            resolve_under(root, "file.mjml").unwrap(),
            PathBuf::from("/projects/news/file.mjml")
        );
        assert!(resolve_under(root, "dir/file.mjml").is_ok());
        assert!(resolve_under(root, "./file.mjml").is_ok());
        assert_eq!(
            resolve_under(root, "dir/../file.mjml").unwrap(),
            PathBuf::from("/projects/news/file.mjml")
        );
        assert!(resolve_under(root, "/projects/news/draft.mjml").is_ok());

        // Escape attempts
        assert_eq!(resolve_under(root, "../file.mjml"), Err(PathError::PathEscape));
        assert_eq!(
            resolve_under(root, "dir/../../file.mjml"),
            Err(PathError::PathEscape)
        );
        assert_eq!(resolve_under(root, "/etc/passwd"), Err(PathError::PathEscape));
    }

    #[test]
    fn test_directory_itself_is_rejected() {
        let root = Path::new("/projects/news");
        assert!(matches!(resolve_under(root, "."), Err(PathError::InvalidName(_))));
        assert!(matches!(resolve_under(root, ""), Err(PathError::InvalidName(_))));
        assert!(matches!(
            resolve_under(root, "/projects/news"),
            Err(PathError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("invoice.mjml").is_ok());
        assert!(validate_file_name("my invoice.v2.mjml").is_ok());

        assert_eq!(validate_file_name("../../etc/passwd"), Err(PathError::PathEscape));
        assert_eq!(validate_file_name("/etc/passwd"), Err(PathError::PathEscape));
        assert!(matches!(validate_file_name("sub/a.mjml"), Err(PathError::InvalidName(_))));
        assert!(matches!(validate_file_name("a.mjml/"), Err(PathError::InvalidName(_))));
        assert!(matches!(validate_file_name("."), Err(PathError::InvalidName(_))));
        assert!(matches!(validate_file_name(""), Err(PathError::InvalidName(_))));
        assert!(matches!(validate_file_name("a\0b"), Err(PathError::InvalidName(_))));
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("invoice.mjml", "mjml"), "invoice");
        assert_eq!(strip_extension("invoice.v2.mjml", "mjml"), "invoice.v2");
        assert_eq!(strip_extension("invoice.txt", "mjml"), "invoice.txt");
        assert_eq!(strip_extension(".mjml", "mjml"), ".mjml");
        assert_eq!(strip_extension("emails/invoice.mjml", "mjml"), "invoice");
    }
}
