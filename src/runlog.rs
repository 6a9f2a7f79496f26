//! The per-run log.
//!
//! One [`RunLog`] is opened when the run starts and passed by `&mut` to
//! every component. Each line is written to a timestamped file as
//! `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`, flushed immediately, and
//! mirrored to stdout. Developer diagnostics go through `tracing` instead.

use crate::error::{Result, WinstrapError};
use crate::ui::Theme;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Severity of a run log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Label written between brackets in the log line.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line that was logged during this run.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Append-only log for a single run.
pub struct RunLog {
    file: Option<File>,
    path: Option<PathBuf>,
    console: Option<Theme>,
    verbose: bool,
    records: Vec<LogRecord>,
}

/// File name for a run started at `started`.
pub fn log_file_name(started: &DateTime<Local>) -> String {
    format!("winstrap_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Format one log line (without the trailing newline).
pub fn format_line(timestamp: &DateTime<Local>, level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

impl RunLog {
    /// Open a fresh log file in `dir`, creating the directory if needed.
    ///
    /// `console` controls the stdout mirror; pass `None` to log to the
    /// file only.
    pub fn open(
        dir: &Path,
        started: &DateTime<Local>,
        console: Option<Theme>,
        verbose: bool,
    ) -> Result<Self> {
        let path = dir.join(log_file_name(started));
        let unavailable = |e: std::io::Error| WinstrapError::LogUnavailable {
            path: path.clone(),
            message: e.to_string(),
        };

        fs::create_dir_all(dir).map_err(unavailable)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(unavailable)?;

        Ok(Self {
            file: Some(file),
            path: Some(path),
            console,
            verbose,
            records: Vec::new(),
        })
    }

    /// A log that only keeps records in memory.
    pub fn memory() -> Self {
        Self {
            file: None,
            path: None,
            console: None,
            verbose: false,
            records: Vec::new(),
        }
    }

    /// Enable verbose detail lines.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Path of the log file, if one is open.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Info, message.as_ref());
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Warning, message.as_ref());
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Error, message.as_ref());
    }

    /// INFO line marking the start of a pipeline stage.
    pub fn section(&mut self, title: &str) {
        self.emit(LogLevel::Info, &format!("== {} ==", title), true);
    }

    /// INFO line that is only written in verbose mode.
    pub fn detail(&mut self, message: impl AsRef<str>) {
        if self.verbose {
            self.write(LogLevel::Info, message.as_ref());
        }
    }

    /// Everything logged so far, in order.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Whether any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    /// Number of lines logged at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.iter().filter(|r| r.level == level).count()
    }

    fn write(&mut self, level: LogLevel, message: &str) {
        self.emit(level, message, false);
    }

    fn emit(&mut self, level: LogLevel, message: &str, header: bool) {
        let line = format_line(&Local::now(), level, message);

        if let Some(file) = self.file.as_mut() {
            let written = file
                .write_all(line.as_bytes())
                .and_then(|_| file.write_all(b"\n"))
                .and_then(|_| file.flush());
            if let Err(e) = written {
                tracing::warn!("run log write failed, continuing without file: {}", e);
                self.file = None;
            }
        }

        if let Some(theme) = &self.console {
            match level {
                LogLevel::Info if header => println!("{}", theme.header.apply_to(&line)),
                LogLevel::Info => println!("{}", line),
                LogLevel::Warning => println!("{}", theme.warning.apply_to(&line)),
                LogLevel::Error => println!("{}", theme.error.apply_to(&line)),
            }
        }

        self.records.push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }
}
