//! Project workspace engine
//!
//! This module provides:
//! - Workspace state (root, browsed directory, active file)
//! - The controller driving import / create / remove / export / screenshot
//! - Preview handle shared with the renderer
//! - User settings

pub mod config;
pub mod controller;
pub mod error;
pub mod paths;
pub mod preview;
pub mod screenshot;
pub mod state;
pub mod template;

pub use config::{ConfigError, Settings};
pub use controller::{
    Collaborators, ExportActions, ImportedTemplate, WorkspaceController, WorkspaceEvent,
};
pub use error::WorkspaceError;
pub use paths::PathError;
pub use preview::{PreviewArtifact, PreviewHandle, PreviewKind};
pub use screenshot::ScreenshotPair;
pub use state::{FileRef, WorkspaceState};
