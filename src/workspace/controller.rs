//! Project workspace controller
//!
//! Coordinates file mutations, the latest preview and the export workflows
//! for one open workspace:
//! - every workflow reports its outcome through the notifier, success and
//!   failure alike, and returns it to the caller
//! - a refresh is requested once per successful mutation, after the I/O
//! - mutating workflows run one at a time (fair FIFO queue)
//! - navigation and selection are single atomic state transitions

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::host::capture::ScreenshotService;
use crate::host::gateway::{FileFilter, FileGateway, OpenDialog, PathPicker, SaveDialog};
use crate::host::listing::FileListing;
use crate::host::modal::{Modal, ModalHost};
use crate::host::notify::{Notifier, Severity};
use crate::host::shell::{Platform, SystemShell};
use crate::workspace::config::Settings;
use crate::workspace::error::WorkspaceError;
use crate::workspace::paths::{resolve_under, strip_extension, PathError};
use crate::workspace::preview::PreviewHandle;
use crate::workspace::screenshot::{self, ScreenshotPair, ScreenshotPlan};
use crate::workspace::state::{FileRef, WorkspaceState};
use crate::workspace::template::{DEFAULT_TEMPLATE, MAX_TEMPLATE_SIZE};

pub const COPIED_MESSAGE: &str = "Copied!";
pub const EXPORTED_MESSAGE: &str = "Successfully exported HTML";
pub const SCREENSHOTS_MESSAGE: &str = "Successfully saved mobile and desktop screenshots";
pub const EXPORT_DIALOG_TITLE: &str = "Export to HTML file";

/// External services the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileGateway>,
    pub picker: Arc<dyn PathPicker>,
    pub capture: Arc<dyn ScreenshotService>,
    pub listing: Arc<dyn FileListing>,
    pub notifier: Arc<dyn Notifier>,
    pub modals: Arc<dyn ModalHost>,
    pub shell: Arc<dyn SystemShell>,
}

/// Template content read by the last import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTemplate {
    pub source: PathBuf,
    pub content: String,
}

/// Which export actions the host should enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportActions {
    pub copy: bool,
    pub export_html: bool,
    pub screenshot: bool,
    pub send: bool,
}

/// Navigation / selection events coming from the file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    PathChanged(PathBuf),
    ActiveFileChanged(Option<FileRef>),
}

pub struct WorkspaceController {
    state: watch::Sender<WorkspaceState>,
    preview: PreviewHandle,
    settings: Settings,
    deps: Collaborators,
    platform: Platform,
    imported: StdMutex<Option<ImportedTemplate>>,
    /// 串行化会修改文件系统或状态的工作流
    ops: Mutex<()>,
}

impl WorkspaceController {
    /// Open a workspace rooted at `root_path`
    pub fn open(
        root_path: PathBuf,
        settings: Settings,
        preview: PreviewHandle,
        deps: Collaborators,
    ) -> Self {
        info!("Opening workspace at {}", root_path.display());
        let (state, _rx) = watch::channel(WorkspaceState::open(root_path));
        Self {
            state,
            preview,
            settings,
            deps,
            platform: Platform::current(),
            imported: StdMutex::new(None),
            ops: Mutex::new(()),
        }
    }

    /// Override the platform used by `open_in_system_browser`
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// Current state snapshot
    pub fn state(&self) -> WorkspaceState {
        self.state.borrow().clone()
    }

    /// Observe every state transition
    pub fn subscribe(&self) -> watch::Receiver<WorkspaceState> {
        self.state.subscribe()
    }

    /// Content kept by the last successful import
    pub fn imported_template(&self) -> Option<ImportedTemplate> {
        self.imported.lock().ok().and_then(|slot| slot.clone())
    }

    // ---- state transitions ----

    /// Navigate to another directory; the selection is dropped
    pub fn set_path(&self, path: PathBuf) {
        debug!("Navigating to {}", path.display());
        self.state.send_modify(|state| state.set_path(path));
    }

    /// Select a file of the current directory. Invalid names are rejected
    /// without notifying observers.
    pub fn set_active_file(&self, file: Option<FileRef>) -> Result<(), PathError> {
        debug!("Active file: {:?}", file);
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            outcome = state.set_active_file(file);
            outcome.is_ok()
        });
        if let Err(e) = &outcome {
            warn!("Selection rejected: {}", e);
        }
        outcome
    }

    pub fn handle_event(&self, event: WorkspaceEvent) -> Result<(), PathError> {
        match event {
            WorkspaceEvent::PathChanged(path) => {
                self.set_path(path);
                Ok(())
            }
            WorkspaceEvent::ActiveFileChanged(file) => self.set_active_file(file),
        }
    }

    /// Release what the workspace view held. Also runs on drop.
    pub fn teardown(&self) {
        self.preview.clear();
    }

    pub fn available_actions(&self) -> ExportActions {
        let html = self.preview.html_content().is_some();
        let has_active = self.state.borrow().active_file().is_some();
        ExportActions {
            copy: html,
            export_html: html,
            screenshot: html && has_active,
            send: html,
        }
    }

    // ---- workflows ----

    /// Pick a template file and read it.
    ///
    /// Returns `Ok(None)` when the dialog is cancelled. The content is kept
    /// for later use; workspace state is left alone.
    pub async fn import_template(&self) -> Result<Option<ImportedTemplate>, WorkspaceError> {
        let _guard = self.ops.lock().await;

        let filter = FileFilter::new("All Files", &self.settings.templates.extension);
        let dialog = OpenDialog {
            default_path: self.state.borrow().root_path().to_path_buf(),
            filters: vec![filter.clone()],
        };
        let Some(source) = self.deps.picker.pick_open_path(&dialog) else {
            debug!("Import cancelled");
            return Ok(None);
        };

        let result = self.read_template(&source, &filter).await;
        let imported = self.report(result, |t| format!("Imported {}", file_label(&t.source)))?;

        if let Ok(mut slot) = self.imported.lock() {
            *slot = Some(imported.clone());
        }
        Ok(Some(imported))
    }

    async fn read_template(
        &self,
        source: &Path,
        filter: &FileFilter,
    ) -> Result<ImportedTemplate, WorkspaceError> {
        if !filter.accepts(source) {
            return Err(WorkspaceError::NotATemplate(source.to_path_buf()));
        }
        let read_error = |e: std::io::Error| WorkspaceError::Read {
            path: source.to_path_buf(),
            source: e,
        };
        let size = self.deps.files.file_size(source).await.map_err(read_error)?;
        if size > MAX_TEMPLATE_SIZE as u64 {
            return Err(WorkspaceError::TemplateTooLarge(source.to_path_buf()));
        }
        let raw = self.deps.files.read_file(source).await.map_err(read_error)?;
        // 文件可能在 stat 之后被改写
        if raw.len() > MAX_TEMPLATE_SIZE {
            return Err(WorkspaceError::TemplateTooLarge(source.to_path_buf()));
        }
        let content =
            String::from_utf8(raw).map_err(|_| WorkspaceError::InvalidUtf8(source.to_path_buf()))?;
        Ok(ImportedTemplate {
            source: source.to_path_buf(),
            content,
        })
    }

    /// Create `name` in the current directory from the default template.
    /// The new file is not selected.
    pub async fn add_file(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let _guard = self.ops.lock().await;
        let dir = self.current_path();

        let result: Result<PathBuf, WorkspaceError> = async {
            let path = resolve_under(&dir, name)?;
            self.deps
                .files
                .write_file(&path, DEFAULT_TEMPLATE.as_bytes())
                .await
                .map_err(|source| WorkspaceError::Write {
                    path: path.clone(),
                    source,
                })?;
            Ok(path)
        }
        .await;

        let path = self.report(result, |p| format!("Created {}", file_label(p)))?;
        self.deps.listing.refresh(&dir);
        Ok(path)
    }

    /// Delete `name` (file or directory tree) from the current directory.
    /// Any successful deletion drops the selection.
    pub async fn remove_file(&self, name: &str) -> Result<(), WorkspaceError> {
        let _guard = self.ops.lock().await;
        let dir = self.current_path();

        let result: Result<PathBuf, WorkspaceError> = async {
            let path = resolve_under(&dir, name)?;
            self.deps
                .files
                .delete_recursive(&path)
                .await
                .map_err(|source| WorkspaceError::Delete {
                    path: path.clone(),
                    source,
                })?;
            Ok(path)
        }
        .await;

        let path = self.report(result, |p| format!("Removed {}", file_label(p)))?;
        self.deps.listing.refresh(&dir);
        self.state.send_modify(|state| state.clear_active_file());
        debug!("Removed {}, selection cleared", path.display());
        Ok(())
    }

    /// Show the current directory in the system file manager
    pub fn open_in_system_browser(&self) {
        let path = self.current_path();
        match self.platform {
            Platform::MacOs => self.deps.shell.reveal_in_folder(&path),
            _ => self.deps.shell.open_path(&path),
        }
    }

    /// Copy the rendered HTML to the clipboard.
    ///
    /// Returns `Ok(false)` without doing anything when there is no HTML
    /// preview.
    pub fn copy_rendered_html(&self) -> Result<bool, WorkspaceError> {
        let Some(content) = self.preview.html_content() else {
            debug!("Copy ignored: no HTML preview");
            return Ok(false);
        };
        let result = self
            .deps
            .shell
            .write_clipboard(&content)
            .map_err(WorkspaceError::from);
        self.report(result, |_| COPIED_MESSAGE.to_string())?;
        Ok(true)
    }

    /// Save the rendered HTML to a file chosen in a save dialog.
    ///
    /// Returns `Ok(None)` when there is no HTML preview or the dialog is
    /// cancelled; nothing is written or reported in that case.
    pub async fn export_to_html(&self) -> Result<Option<PathBuf>, WorkspaceError> {
        let _guard = self.ops.lock().await;

        let Some(content) = self.preview.html_content() else {
            debug!("Export ignored: no HTML preview");
            return Ok(None);
        };

        let dialog = SaveDialog {
            title: EXPORT_DIALOG_TITLE.to_string(),
            default_path: self.state.borrow().root_path().to_path_buf(),
            filters: vec![FileFilter::new(
                "All Files",
                &self.settings.templates.export_extension,
            )],
        };
        let Some(target) = self.deps.picker.pick_save_path(&dialog) else {
            debug!("Export cancelled");
            return Ok(None);
        };

        let result = self
            .deps
            .files
            .write_file(&target, content.as_bytes())
            .await
            .map(|()| target.clone())
            .map_err(|source| WorkspaceError::Write {
                path: target.clone(),
                source,
            });
        let target = self.report(result, |_| EXPORTED_MESSAGE.to_string())?;
        self.deps.listing.refresh(&self.current_path());
        Ok(Some(target))
    }

    /// Capture the preview at the mobile and desktop widths and save both
    /// images next to the active file.
    ///
    /// Either both images are written and one success notification fires,
    /// or nothing is written and one error is reported. Returns `Ok(None)`
    /// without side effects when there is no active file or HTML preview.
    pub async fn capture_screenshots(&self) -> Result<Option<ScreenshotPair>, WorkspaceError> {
        let _guard = self.ops.lock().await;

        let (dir, active) = {
            let state = self.state.borrow();
            (
                state.current_path().to_path_buf(),
                state.active_file().cloned(),
            )
        };
        let Some(active) = active else {
            debug!("Screenshot ignored: no active file");
            return Ok(None);
        };
        let Some(content) = self.preview.html_content() else {
            debug!("Screenshot ignored: no HTML preview");
            return Ok(None);
        };

        let plan = ScreenshotPlan {
            base_name: strip_extension(&active.name, &self.settings.templates.extension),
            target_dir: dir.clone(),
            mobile_width: self.settings.preview.mobile,
            desktop_width: self.settings.preview.desktop,
            timeout: self.settings.capture.timeout(),
        };

        let result: Result<ScreenshotPair, WorkspaceError> = async {
            let staged = screenshot::stage(self.deps.capture.as_ref(), &content, &plan).await?;
            screenshot::commit(self.deps.files.as_ref(), staged).await
        }
        .await;

        let pair = self.report(result, |_| SCREENSHOTS_MESSAGE.to_string())?;
        self.deps.listing.refresh(&dir);
        Ok(Some(pair))
    }

    // ---- modal triggers ----

    pub fn open_settings_modal(&self) {
        self.deps.modals.open(Modal::Settings);
    }

    /// Only available while an HTML preview exists
    pub fn open_send_modal(&self) -> bool {
        if self.preview.html_content().is_none() {
            debug!("Send ignored: no HTML preview");
            return false;
        }
        self.deps.modals.open(Modal::Send);
        true
    }

    pub fn open_add_file_modal(&self) {
        self.deps.modals.open(Modal::AddFile);
    }

    // ---- helpers ----

    fn current_path(&self) -> PathBuf {
        self.state.borrow().current_path().to_path_buf()
    }

    /// Map a workflow result to exactly one notification
    fn report<T>(
        &self,
        result: Result<T, WorkspaceError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, WorkspaceError> {
        match &result {
            Ok(value) => {
                let message = success(value);
                info!("{}", message);
                self.deps.notifier.notify(&message, Severity::Success);
            }
            Err(e) => {
                warn!("Workspace operation failed: {}", e);
                self.deps.notifier.notify(&e.to_string(), Severity::Error);
            }
        }
        result
    }
}

impl Drop for WorkspaceController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
