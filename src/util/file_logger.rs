use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::host::notify::Severity;

/// 日志文件保留天数
const LOG_RETENTION_DAYS: i64 = 7;

/// 全局日志写入器单例
static FILE_LOGGER: std::sync::OnceLock<FileLogger> = std::sync::OnceLock::new();

/// One JSON line in the activity log
#[derive(Debug, Serialize)]
struct LogRecord {
    ts: String,
    level: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace: Option<String>,
    msg: String,
}

struct LogFileState {
    writer: Option<BufWriter<File>>,
    current_date: Option<NaiveDate>,
}

/// Thread-safe activity log writer.
///
/// Appends one JSON record per line to `~/.inkwell/logs/YYYY-MM-DD.log`,
/// rolling over at midnight. Used to keep a history of the notifications
/// the user saw, independent of the tracing output.
pub struct FileLogger {
    log_dir: PathBuf,
    state: Mutex<LogFileState>,
}

impl FileLogger {
    /// Global instance rooted in the user's home directory
    pub fn global() -> &'static FileLogger {
        FILE_LOGGER.get_or_init(|| {
            let log_dir = dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".inkwell")
                .join("logs");
            FileLogger::new(log_dir)
        })
    }

    pub fn new(log_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&log_dir);
        Self {
            log_dir,
            state: Mutex::new(LogFileState {
                writer: None,
                current_date: None,
            }),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Record a notification shown for a workspace
    pub fn write_notification(&self, workspace: &Path, severity: Severity, message: &str) {
        let level = match severity {
            Severity::Success => "info",
            Severity::Error => "error",
        };
        let record = LogRecord {
            ts: Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            level: level.to_string(),
            source: "notification".to_string(),
            workspace: Some(workspace.display().to_string()),
            msg: message.to_string(),
        };
        self.write_record(&record);
    }

    /// Record a message from the core itself
    pub fn write_core_log(&self, level: &str, message: &str) {
        let record = LogRecord {
            ts: Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            level: level.to_string(),
            source: "core".to_string(),
            workspace: None,
            msg: message.to_string(),
        };
        self.write_record(&record);
    }

    /// 清理超过保留天数的日志文件
    pub fn cleanup_old_logs(&self) {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(LOG_RETENTION_DAYS);
        let entries = match fs::read_dir(&self.log_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            // YYYY-MM-DD.log
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                    if date < cutoff {
                        let _ = fs::remove_file(&path);
                    }
                }
            }
        }
    }

    fn write_record(&self, record: &LogRecord) {
        let today = Local::now().date_naive();
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return,
        };

        if state.current_date != Some(today) {
            state.writer = None;
            state.current_date = None;
            if let Some(w) = self.open_log_file(today) {
                state.writer = Some(w);
                state.current_date = Some(today);
            }
        }

        if let Some(ref mut writer) = state.writer {
            if let Ok(json) = serde_json::to_string(record) {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn open_log_file(&self, date: NaiveDate) -> Option<BufWriter<File>> {
        let filename = format!("{}.log", date.format("%Y-%m-%d"));
        let path = self.log_dir.join(filename);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(BufWriter::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_notification_written_as_json_line() {
        let temp = TempDir::new().unwrap();
        let logger = FileLogger::new(temp.path().to_path_buf());

        logger.write_notification(Path::new("/projects/news"), Severity::Error, "Disk full");

        let today = format!("{}.log", Local::now().date_naive().format("%Y-%m-%d"));
        let content = fs::read_to_string(temp.path().join(today)).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["level"], "error");
        assert_eq!(line["source"], "notification");
        assert_eq!(line["workspace"], "/projects/news");
        assert_eq!(line["msg"], "Disk full");
    }

    #[test]
    fn test_cleanup_removes_only_expired_logs() {
        let temp = TempDir::new().unwrap();
        let logger = FileLogger::new(temp.path().to_path_buf());

        fs::write(temp.path().join("2000-01-01.log"), "{}\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "keep").unwrap();
        logger.write_core_log("info", "started");

        logger.cleanup_old_logs();

        assert!(!temp.path().join("2000-01-01.log").exists());
        assert!(temp.path().join("notes.txt").exists());
        let today = format!("{}.log", Local::now().date_naive().format("%Y-%m-%d"));
        assert!(temp.path().join(today).exists());
    }
}
