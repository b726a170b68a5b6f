//! Terminal host
//!
//! Drives a `WorkspaceController` from line commands on stdin. Dialogs are
//! answered from the command arguments, notifications are printed and
//! appended to the activity log.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::host::{
    BrowserScreenshotService, ChannelNotifier, CommandRenderer, DirectoryListing, FileListing,
    LocalFileGateway, Modal, ModalHost, NativeShell, QueuedPicker, Severity,
};
use crate::util::FileLogger;
use crate::workspace::paths::{resolve_under, PathError};
use crate::workspace::{
    Collaborators, FileRef, PreviewArtifact, PreviewHandle, PreviewKind, Settings,
    WorkspaceController,
};

#[derive(Parser, Debug)]
#[command(name = "inkwell-core", version, about = "Browse, preview and export email templates")]
pub struct Cli {
    /// Project directory to open
    pub project: PathBuf,

    /// Settings file (defaults to ~/.inkwell/settings.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Cd(String),
    Select(String),
    New(String),
    Remove(String),
    Import(PathBuf),
    Export(Option<PathBuf>),
    Copy,
    Screenshot,
    Send,
    Settings,
    AddFile,
    Open,
    Actions,
    Help,
    Quit,
}

const HELP: &str = "\
Commands:
  ls                 list the current directory
  cd <dir>           change directory (.. to go up, / for the project root)
  select <file>      select and preview a file
  new [<file>]       create a file from the default template
  rm <file>          delete a file or directory
  import <path>      import a template file
  export [<path>]    export the preview as HTML (no path = cancel)
  copy               copy the preview HTML to the clipboard
  shot               save mobile and desktop screenshots
  send               open the send dialog
  settings           show settings
  open               open the directory in the file manager
  actions            show which export actions are available
  help               show this help
  quit               close the workspace";

impl Command {
    /// Parse a line; `Ok(None)` for blank lines
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        let required = |name: &str| {
            arg.map(str::to_string)
                .ok_or_else(|| format!("usage: {} <{}>", verb, name))
        };

        let command = match verb {
            "ls" => Command::List,
            "cd" => Command::Cd(required("dir")?),
            "select" => Command::Select(required("file")?),
            "new" => match arg {
                Some(name) => Command::New(name.to_string()),
                None => Command::AddFile,
            },
            "rm" => Command::Remove(required("file")?),
            "import" => Command::Import(PathBuf::from(required("path")?)),
            "export" => Command::Export(arg.map(PathBuf::from)),
            "copy" => Command::Copy,
            "shot" | "screenshot" => Command::Screenshot,
            "send" => Command::Send,
            "settings" => Command::Settings,
            "open" => Command::Open,
            "actions" => Command::Actions,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

/// Directory reached by `cd <arg>` from `current`, never above `root`
pub fn navigate_target(root: &Path, current: &Path, arg: &str) -> Result<PathBuf, PathError> {
    if arg == "/" || arg == "~" {
        return Ok(root.to_path_buf());
    }
    if Path::new(arg).is_absolute() {
        return match resolve_under(root, arg) {
            Err(PathError::InvalidName(_)) if Path::new(arg) == root => Ok(root.to_path_buf()),
            other => other,
        };
    }
    let relative = current
        .strip_prefix(root)
        .unwrap_or_else(|_| Path::new(""))
        .join(arg);
    let relative = relative.to_string_lossy();
    match resolve_under(root, &relative) {
        // Folded back onto the root itself
        Err(PathError::InvalidName(_)) if !relative.contains('\0') => Ok(root.to_path_buf()),
        other => other,
    }
}

/// Modal host for the terminal: there are no dialogs, so print instead
struct TerminalModalHost {
    settings_summary: String,
}

impl ModalHost for TerminalModalHost {
    fn open(&self, modal: Modal) {
        info!("Modal requested: {}", modal);
        match modal {
            Modal::Settings => println!("{}", self.settings_summary),
            Modal::Send => println!("[send] sending is handled by the desktop app"),
            Modal::AddFile => println!("[new] usage: new <file>"),
        }
    }
}

fn print_listing(listing: &DirectoryListing, root: &Path) {
    let dir = listing.dir().unwrap_or_else(|| root.to_path_buf());
    let shown = dir.strip_prefix(root).unwrap_or(&dir);
    println!("/{}", shown.display());
    for entry in listing.entries() {
        if entry.is_dir {
            println!("  {}/", entry.name);
        } else {
            println!("  {:<40} {:>10}", entry.name, entry.size);
        }
    }
}

/// Open the workspace and process commands until `quit` or end of input
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    }
    .context("Failed to load settings")?;

    let root = cli
        .project
        .canonicalize()
        .with_context(|| format!("Cannot open project {}", cli.project.display()))?;
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());

    let logger = FileLogger::global();
    logger.cleanup_old_logs();
    logger.write_core_log("info", &format!("Workspace opened: {}", root.display()));

    let (notifier, mut notifications) = ChannelNotifier::channel(64);
    let log_root = root.clone();
    let printer = tokio::spawn(async move {
        while let Some(note) = notifications.recv().await {
            match note.severity {
                Severity::Success => println!("[ok] {}", note.message),
                Severity::Error => println!("[error] {}", note.message),
            }
            FileLogger::global().write_notification(&log_root, note.severity, &note.message);
        }
    });

    let picker = Arc::new(QueuedPicker::new());
    let listing = Arc::new(DirectoryListing::new());
    let settings_summary = toml::to_string_pretty(&settings)
        .unwrap_or_else(|e| format!("Failed to render settings: {}", e));
    let deps = Collaborators {
        files: Arc::new(LocalFileGateway::new(settings.files.delete_to_trash)),
        picker: picker.clone(),
        capture: Arc::new(BrowserScreenshotService::new(
            settings.capture.browser.clone(),
            settings.capture.height,
        )),
        listing: listing.clone(),
        notifier: Arc::new(notifier),
        modals: Arc::new(TerminalModalHost { settings_summary }),
        shell: Arc::new(NativeShell::default()),
    };
    let renderer = CommandRenderer::new(
        settings.render.command.clone(),
        &settings.templates.extension,
    );
    let preview = PreviewHandle::new();
    let controller = WorkspaceController::open(root.clone(), settings, preview, deps);

    println!("Project: {}", controller.state().project_name());
    listing.refresh(&root);
    print_listing(&listing, &root);
    let mut seen_generation = listing.generation();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        debug!("Command: {:?}", command);

        if command == Command::Quit {
            break;
        }
        execute(&controller, &picker, &renderer, &listing, &root, command).await;

        if listing.generation() != seen_generation {
            seen_generation = listing.generation();
            print_listing(&listing, &root);
        }
    }

    controller.teardown();
    drop(controller);
    // Sender 随 controller 释放，printer 读完剩余通知后退出
    if let Err(e) = printer.await {
        warn!("Notification printer stopped: {}", e);
    }
    logger.write_core_log("info", &format!("Workspace closed: {}", root.display()));
    Ok(())
}

async fn execute(
    controller: &WorkspaceController,
    picker: &QueuedPicker,
    renderer: &CommandRenderer,
    listing: &DirectoryListing,
    root: &Path,
    command: Command,
) {
    // Workflow failures are already reported through the notifier
    match command {
        Command::List => {
            listing.refresh(controller.state().current_path());
        }
        Command::Cd(arg) => {
            let current = controller.state().current_path().to_path_buf();
            match navigate_target(root, &current, &arg) {
                Ok(target) if target.is_dir() => {
                    controller.set_path(target.clone());
                    controller.preview().clear();
                    listing.refresh(&target);
                }
                Ok(target) => println!("{} is not a directory", target.display()),
                Err(e) => println!("{}", e),
            }
        }
        Command::Select(name) => {
            let state = controller.state();
            let path = match resolve_under(state.current_path(), &name) {
                Ok(path) if path.is_file() => path,
                Ok(path) => {
                    println!("{} is not a file", path.display());
                    return;
                }
                Err(e) => {
                    println!("{}", e);
                    return;
                }
            };
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                return;
            };
            let parent = path.parent().unwrap_or(state.current_path()).to_path_buf();
            if parent != state.current_path() {
                controller.set_path(parent);
            }
            if let Err(e) = controller.set_active_file(Some(FileRef::new(file_name))) {
                println!("{}", e);
                return;
            }
            match renderer.render(&path).await {
                Ok(artifact) => {
                    println!("Preview ready ({} bytes)", artifact.content.len());
                    controller.preview().publish(artifact);
                }
                Err(e) => {
                    println!("Preview failed: {}", e);
                    controller
                        .preview()
                        .publish(PreviewArtifact::new(PreviewKind::Other("error".to_string()), e.to_string()));
                }
            }
        }
        Command::New(name) => {
            let _ = controller.add_file(&name).await;
        }
        Command::AddFile => controller.open_add_file_modal(),
        Command::Remove(name) => {
            if controller.remove_file(&name).await.is_ok() {
                controller.preview().clear();
            }
        }
        Command::Import(path) => {
            picker.push(Some(path));
            if let Ok(Some(imported)) = controller.import_template().await {
                println!("{} characters imported", imported.content.chars().count());
            }
        }
        Command::Export(path) => {
            picker.push(path);
            if let Ok(None) = controller.export_to_html().await {
                println!("Nothing exported");
            }
        }
        Command::Copy => {
            if let Ok(false) = controller.copy_rendered_html() {
                println!("No HTML preview to copy");
            }
        }
        Command::Screenshot => {
            if let Ok(None) = controller.capture_screenshots().await {
                println!("Select a file with an HTML preview first");
            }
        }
        Command::Send => {
            if !controller.open_send_modal() {
                println!("No HTML preview to send");
            }
        }
        Command::Settings => controller.open_settings_modal(),
        Command::Open => controller.open_in_system_browser(),
        Command::Actions => {
            let actions = controller.available_actions();
            println!(
                "copy: {}  export: {}  screenshot: {}  send: {}",
                actions.copy, actions.export_html, actions.screenshot, actions.send
            );
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("ls").unwrap(), Some(Command::List));
        assert_eq!(
            Command::parse("rm  draft.mjml ").unwrap(),
            Some(Command::Remove("draft.mjml".to_string()))
        );
        assert_eq!(
            Command::parse("select my file.mjml").unwrap(),
            Some(Command::Select("my file.mjml".to_string()))
        );
        assert_eq!(Command::parse("export").unwrap(), Some(Command::Export(None)));
        assert_eq!(
            Command::parse("export out/news.html").unwrap(),
            Some(Command::Export(Some(PathBuf::from("out/news.html"))))
        );
        assert_eq!(Command::parse("new").unwrap(), Some(Command::AddFile));
        assert_eq!(Command::parse("shot").unwrap(), Some(Command::Screenshot));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("rm").unwrap_err(), "usage: rm <file>");
        assert!(Command::parse("frobnicate").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn test_navigate_target_stays_under_root() {
        let root = Path::new("/projects/news");
        let current = Path::new("/projects/news/archive");

        assert_eq!(
            navigate_target(root, current, "2024").unwrap(),
            PathBuf::from("/projects/news/archive/2024")
        );
        assert_eq!(navigate_target(root, current, "..").unwrap(), root);
        assert_eq!(navigate_target(root, current, "/").unwrap(), root);
        assert_eq!(navigate_target(root, root, "/projects/news").unwrap(), root);
        assert_eq!(
            navigate_target(root, root, ".."),
            Err(PathError::PathEscape)
        );
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from(["inkwell-core", "/tmp/news", "--config", "/tmp/s.toml"]).unwrap();
        assert_eq!(cli.project, PathBuf::from("/tmp/news"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }
}
