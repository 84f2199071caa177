//! Logging utilities.
//!
//! The crates log through the `log` facade. This module provides the log
//! levels accepted in configuration, the record format used in log files,
//! and `log_init`, which installs a logger writing to a log file.
//! Without a log file, nothing is logged.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Log level.
///
/// This enum represents the different log levels in the system,
/// ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose debug information.
    Trace,

    /// Debug information.
    Debug,

    /// Informational messages.
    Info,

    /// Warning messages.
    Warning,

    /// Error messages.
    Error,
}

impl LogLevel {
    /// Get the name of this log level.
    ///
    /// # Returns
    ///
    /// A string representation of this log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// The corresponding `log` crate filter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Trace => log::LevelFilter::Trace,
            Self::Debug => log::LevelFilter::Debug,
            Self::Info => log::LevelFilter::Info,
            Self::Warning => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Debug
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Self::Trace,
            log::Level::Debug => Self::Debug,
            log::Level::Info => Self::Info,
            log::Level::Warn => Self::Warning,
            log::Level::Error => Self::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();
    /// Convert from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - The string to convert from. Case-insensitive.
    ///
    /// # Returns
    ///
    /// `Ok(LogLevel)` if valid, or `Err(())` if not a valid log level.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A log record as written to the log file.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// The log level.
    pub level: LogLevel,

    /// The logger name (the `log` target).
    pub target: String,

    /// The log message.
    pub message: String,

    /// The process id.
    pub pid: u32,

    /// The timestamp when the log was recorded.
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl LogRecord {
    /// Create a new log record with the current timestamp.
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
            pid: std::process::id(),
            timestamp: chrono::Local::now(),
        }
    }

    /// Format this log record as one log file line.
    ///
    /// # Returns
    ///
    /// `<timestamp> <LEVEL> <target> <pid> <message>`, with the timestamp in
    /// local time including the UTC offset.
    pub fn format(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%z"),
            self.level,
            self.target,
            self.pid,
            self.message
        )
    }
}

/// A logger appending formatted records to a file.
pub struct FileLogger {
    file: Mutex<File>,
    level: LogLevel,
}

impl FileLogger {
    /// Open (append to) the log file.
    pub fn open(path: &Path, level: LogLevel) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        LogLevel::from(metadata.level()) >= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = LogRecord::new(
            record.level().into(),
            record.target(),
            record.args().to_string(),
        )
        .format();
        let mut file = self.file.lock();
        // Logging must never fail a module run.
        let _ = writeln!(file, "{}", line);
    }

    fn flush(&self) {
        let _ = self.file.lock().flush();
    }
}

/// Set up logging to a log file.
///
/// Without a log file, logging stays disabled. A logger can only be
/// installed once per process; later calls leave the first logger in place.
///
/// # Arguments
///
/// * `log_file` - Path name of the log file, or `None`.
/// * `level` - Minimum level of records written.
pub fn log_init(log_file: Option<&Path>, level: LogLevel) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let logger = FileLogger::open(path, level)
        .map_err(|e| Error::Config(format!("Cannot open log file {}: {}", path.display(), e)))?;
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warning);
        assert!(LogLevel::Warning > LogLevel::Info);
        assert!(LogLevel::Info > LogLevel::Debug);
        assert!(LogLevel::Debug > LogLevel::Trace);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("err".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_record_format() {
        let record = LogRecord::new(LogLevel::Debug, "zhmc_modules::partition", "Module entry");
        let line = record.format();
        assert!(line.contains(" DEBUG zhmc_modules::partition "));
        assert!(line.ends_with(&format!("{} Module entry", std::process::id())));
    }

    #[test]
    fn test_file_logger_writes_enabled_records() {
        use log::Log;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zhmc.log");
        let logger = FileLogger::open(&path, LogLevel::Info).unwrap();

        logger.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("t")
                .args(format_args!("hidden"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("t")
                .args(format_args!("shown"))
                .build(),
        );
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("WARNING t"));
        assert!(content.contains("shown"));
        assert!(!content.contains("hidden"));
    }

    #[test]
    fn test_log_init_without_file_is_noop() {
        assert!(log_init(None, LogLevel::Debug).is_ok());
    }
}
