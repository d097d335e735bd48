use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Severity at which a monitor emits the records of its channel.
///
/// `All` is the catch-all filter threshold ("log everything"). It is accepted
/// by [`crate::logging::init_logging`] but rejected as a channel level, since a
/// record has to be routed to exactly one concrete level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    All,
}

impl LogLevel {
    pub fn is_catch_all(self) -> bool {
        matches!(self, LogLevel::All)
    }

    /// Concrete `tracing` level; `All` maps to the most verbose one.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace | LogLevel::All => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            "all" => Ok(LogLevel::All),
            other => Err(format!(
                "invalid log level: {other} (expected error, warn, info, debug, trace or all)"
            )),
        }
    }
}

/// One of the two output channels of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Stdout => "stdout",
            Channel::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a monitor does when reading its channel fails.
///
/// - `Record`: log the failure, treat it as end-of-stream (default).
/// - `Escalate`: log it as well, and make `wait_for` return
///   [`crate::errors::ProcwatchError::StreamRead`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Record,
    Escalate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(FailurePolicy::Record),
            "escalate" => Ok(FailurePolicy::Escalate),
            other => Err(format!(
                "invalid read_failure policy: {other} (expected \"record\" or \"escalate\")"
            )),
        }
    }
}
