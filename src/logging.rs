use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use serde::{Deserialize, Serialize};

/// Default maximum number of log lines to keep in memory
pub const DEFAULT_MAX_LOG_LINES: usize = 10000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    /// Source directory of the definition the entry belongs to, if any
    pub scope: Option<String>,
}

pub struct LogManager {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    max_lines: usize,
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_LINES)
    }
}

impl LogManager {
    pub fn new(max_lines: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(max_lines.min(1024)))),
            max_lines,
        }
    }

    pub fn log(&self, level: LogLevel, message: &str, scope: Option<&str>) {
        let entry = LogEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            message: message.to_string(),
            scope: scope.map(str::to_string),
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(entry);

        // Remove from front if full
        while entries.len() > self.max_lines {
            entries.pop_front();
        }
    }

    pub fn info(&self, message: &str, scope: Option<&str>) {
        self.log(LogLevel::Info, message, scope);
    }

    pub fn warning(&self, message: &str, scope: Option<&str>) {
        self.log(LogLevel::Warning, message, scope);
    }

    pub fn error(&self, message: &str, scope: Option<&str>) {
        self.log(LogLevel::Error, message, scope);
    }

    pub fn get_logs(&self, scope: Option<&str>) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match scope {
            Some(scope) => entries
                .iter()
                .filter(|e| e.scope.as_deref() == Some(scope))
                .cloned()
                .collect(),
            None => entries.iter().cloned().collect(),
        }
    }
}
