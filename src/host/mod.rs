//! Collaborators the workspace controller talks to
//!
//! Each concern sits behind a narrow trait so the controller can be driven
//! by a desktop shell, the terminal host or test doubles:
//! - `gateway`: file I/O and open/save pickers
//! - `capture`: screenshot rendering
//! - `listing`: the file list that gets refreshed after mutations
//! - `notify`: user-facing success / error messages
//! - `modal`: named dialogs owned by the host
//! - `shell`: system file manager and clipboard
//! - `render`: template -> preview rendering for the terminal host

pub mod capture;
pub mod gateway;
pub mod listing;
pub mod local;
pub mod modal;
pub mod notify;
pub mod render;
pub mod shell;

pub use capture::{BrowserScreenshotService, CaptureError, ScreenshotService};
pub use gateway::{FileFilter, FileGateway, OpenDialog, PathPicker, QueuedPicker, SaveDialog};
pub use listing::{list_files, DirectoryListing, FileEntry, FileListing};
pub use local::LocalFileGateway;
pub use modal::{Modal, ModalHost};
pub use notify::{ChannelNotifier, Notification, Notifier, Severity};
pub use render::{CommandRenderer, RenderError};
pub use shell::{NativeShell, Platform, ShellError, SystemShell};
