//! Logs as values.
//!
//! Every fallible stage returns its diagnostics as an ordered `Vec<LogEntry>`
//! next to its result instead of writing to a global logger. Callers merge
//! the lists with [`merge_logs`] or a [`LogAccumulator`], and the host replays
//! the final list into `tracing` with [`emit`] once a run is complete.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Error => "ERROR",
        })
    }
}

/// A single pending log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Rendered underlying cause, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Ordered logs paired with the value they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsAndValue<T> {
    pub logs: Vec<LogEntry>,
    pub value: T,
}

impl<T> LogsAndValue<T> {
    #[must_use]
    pub fn new(logs: Vec<LogEntry>, value: T) -> Self {
        Self { logs, value }
    }

    /// A value that produced no diagnostics.
    #[must_use]
    pub fn silent(value: T) -> Self {
        Self {
            logs: Vec::new(),
            value,
        }
    }

    /// Transforms the value, keeping the logs.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LogsAndValue<U> {
        LogsAndValue {
            logs: self.logs,
            value: f(self.value),
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<LogEntry>, T) {
        (self.logs, self.value)
    }
}

/// Concatenates log groups in the order given. Entries within a group keep
/// their relative order.
pub fn merge_logs<I>(groups: I) -> Vec<LogEntry>
where
    I: IntoIterator<Item = Vec<LogEntry>>,
{
    groups.into_iter().flatten().collect()
}

/// Incremental form of [`merge_logs`] for sequential stages.
#[derive(Debug, Default, Clone)]
pub struct LogAccumulator {
    logs: Vec<LogEntry>,
}

impl LogAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        self.logs.extend(entries);
    }

    /// Appends the logs of a stage result and hands back its value.
    pub fn absorb<T>(&mut self, result: LogsAndValue<T>) -> T {
        self.logs.extend(result.logs);
        result.value
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    #[must_use]
    pub fn finish<T>(self, value: T) -> LogsAndValue<T> {
        LogsAndValue::new(self.logs, value)
    }

    #[must_use]
    pub fn into_logs(self) -> Vec<LogEntry> {
        self.logs
    }
}

/// Replays log entries through `tracing` at their matching level.
pub fn emit(logs: &[LogEntry]) {
    for entry in logs {
        match (entry.level, entry.error.as_deref()) {
            (LogLevel::Debug, None) => tracing::debug!("{}", entry.message),
            (LogLevel::Debug, Some(error)) => tracing::debug!(error, "{}", entry.message),
            (LogLevel::Info, None) => tracing::info!("{}", entry.message),
            (LogLevel::Info, Some(error)) => tracing::info!(error, "{}", entry.message),
            (LogLevel::Error, None) => tracing::error!("{}", entry.message),
            (LogLevel::Error, Some(error)) => tracing::error!(error, "{}", entry.message),
        }
    }
}
