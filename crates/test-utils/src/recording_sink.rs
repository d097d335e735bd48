use std::sync::Mutex;

use procwatch::monitor::RECORD_PREFIX;
use procwatch::sink::LogSink;
use procwatch::types::LogLevel;

/// One record captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

/// A sink that remembers every record instead of printing it.
///
/// `silent()` reports every level as disabled, which lets tests check that
/// capture does not depend on log filtering.
#[derive(Debug)]
pub struct RecordingSink {
    enabled: bool,
    records: Mutex<Vec<Record>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            enabled: true,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            enabled: false,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// Grouped output records from `source`, with the `">> "` prefix removed.
    pub fn groups(&self, source: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.source == source)
            .filter_map(|r| r.message.strip_prefix(RECORD_PREFIX).map(str::to_string))
            .collect()
    }

    /// Messages logged at `level`, from any source.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .map(|r| r.message)
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for RecordingSink {
    fn is_enabled(&self, _level: LogLevel, _source: &str) -> bool {
        self.enabled
    }

    fn log(&self, level: LogLevel, source: &str, message: &str) {
        let mut guard = self.records.lock().unwrap();
        guard.push(Record {
            level,
            source: source.to_string(),
            message: message.to_string(),
        });
    }
}
