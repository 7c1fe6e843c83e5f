//! The user-facing command log: a bounded history of per-line results.

use std::collections::VecDeque;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// The result of one submitted line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub input: String,
    /// Success message or error message.
    pub outcome: Result<String, String>,
}

impl LogEntry {
    pub fn new(input: impl Into<String>, outcome: Result<String, String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            input: input.into(),
            outcome,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn message(&self) -> &str {
        match &self.outcome {
            Ok(m) | Err(m) => m,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
            % 86_400;
        let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
        let tag = if self.is_ok() { "ok" } else { "error" };
        write!(f, "[{h:02}:{m:02}:{s:02}] {tag}: {}", self.message())
    }
}

/// Keeps the most recent entries; the oldest is dropped when full.
#[derive(Debug, Clone)]
pub struct CommandLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl CommandLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
