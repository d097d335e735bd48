// src/sink.rs

//! Pluggable logging sink.
//!
//! Monitors and sessions emit through a `LogSink`; the level of a channel's
//! records is only known at runtime. `TracingSink` is the production
//! implementation. Tests supply their own to observe exactly which records
//! were emitted.

use std::fmt::Debug;

use tracing::Level;

use crate::types::LogLevel;

/// Destination for the records emitted by monitors and sessions.
pub trait LogSink: Send + Sync + Debug {
    /// Whether a record at `level` from `source` would be kept.
    ///
    /// Callers use this to skip formatting records nobody will see.
    fn is_enabled(&self, level: LogLevel, source: &str) -> bool;

    /// Emit one record.
    fn log(&self, level: LogLevel, source: &str, message: &str);
}

/// Sink that forwards every record to the global `tracing` subscriber,
/// carrying `source` as a structured field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn is_enabled(&self, level: LogLevel, _source: &str) -> bool {
        match level {
            LogLevel::Error => tracing::enabled!(Level::ERROR),
            LogLevel::Warn => tracing::enabled!(Level::WARN),
            LogLevel::Info => tracing::enabled!(Level::INFO),
            LogLevel::Debug => tracing::enabled!(Level::DEBUG),
            LogLevel::Trace | LogLevel::All => tracing::enabled!(Level::TRACE),
        }
    }

    fn log(&self, level: LogLevel, source: &str, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(source = %source, "{}", message),
            LogLevel::Warn => tracing::warn!(source = %source, "{}", message),
            LogLevel::Info => tracing::info!(source = %source, "{}", message),
            LogLevel::Debug => tracing::debug!(source = %source, "{}", message),
            LogLevel::Trace | LogLevel::All => tracing::trace!(source = %source, "{}", message),
        }
    }
}
