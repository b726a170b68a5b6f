//! User settings (~/.inkwell/settings.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    ReadError(String),
    #[error("Failed to write settings: {0}")]
    WriteError(String),
    #[error("Failed to parse settings: {0}")]
    ParseError(String),
    #[error("Invalid setting {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("Cannot locate home directory")]
    NoHomeDir,
}

/// Editor settings shared by every workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub templates: TemplateSection,
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub files: FilesSection,
}

/// Preview widths, also used for screenshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSection {
    #[serde(default = "default_mobile_width")]
    pub mobile: u32,
    #[serde(default = "default_desktop_width")]
    pub desktop: u32,
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            mobile: default_mobile_width(),
            desktop: default_desktop_width(),
        }
    }
}

fn default_mobile_width() -> u32 {
    320
}

fn default_desktop_width() -> u32 {
    650
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    /// Extension of template files (without the dot)
    #[serde(default = "default_template_extension")]
    pub extension: String,
    /// Extension offered by the HTML export dialog
    #[serde(default = "default_export_extension")]
    pub export_extension: String,
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            extension: default_template_extension(),
            export_extension: default_export_extension(),
        }
    }
}

fn default_template_extension() -> String {
    "mjml".to_string()
}

fn default_export_extension() -> String {
    "html".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSection {
    /// Browser binary; probed on PATH when unset
    pub browser: Option<String>,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    #[serde(default = "default_capture_timeout")]
    pub timeout_secs: u64,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            browser: None,
            height: default_capture_height(),
            timeout_secs: default_capture_timeout(),
        }
    }
}

impl CaptureSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_capture_height() -> u32 {
    1200
}

fn default_capture_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSection {
    /// Program and arguments; the template path is appended
    #[serde(default = "default_render_command")]
    pub command: Vec<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            command: default_render_command(),
        }
    }
}

fn default_render_command() -> Vec<String> {
    vec!["mjml".to_string(), "-s".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilesSection {
    /// Move removed files to the system trash
    #[serde(default)]
    pub delete_to_trash: bool,
}

impl Settings {
    /// Default settings file location
    pub fn settings_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".inkwell").join("settings.toml"))
    }

    /// Load settings from `path`, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let settings: Settings =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make every workflow fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "capture.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.preview.mobile == 0 || self.preview.desktop == 0 {
            return Err(ConfigError::InvalidValue {
                key: "preview",
                reason: "widths must be positive".to_string(),
            });
        }
        if self.render.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "render.command",
                reason: "must name a program".to_string(),
            });
        }
        Ok(())
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::settings_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}
