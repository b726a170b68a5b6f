//! Inkwell Core - project workspace engine for the Inkwell template editor
//!
//! - `workspace`: workspace state, settings and the controller that drives
//!   import / create / delete / export / screenshot workflows
//! - `host`: collaborator traits and their local implementations
//!   (file system, pickers, screenshots, clipboard, notifications)
//! - `cli`: line-oriented terminal host
//! - `util`: logging

pub mod cli;
pub mod host;
pub mod util;
pub mod workspace;

pub use workspace::{Settings, WorkspaceController, WorkspaceError, WorkspaceState};
