// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{FailurePolicy, LogLevel};

/// Default cap on the number of lines coalesced into one stack-trace record.
pub const DEFAULT_MAX_STACK_LINES: usize = 1000;

/// Default bound on the post-exit wait for both monitors.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(2);

/// Session configuration as read from a TOML file.
///
/// ```toml
/// [session]
/// label = "build"
/// stdout_level = "info"
/// stderr_level = "warn"
/// completion_timeout_ms = 2000
///
/// [monitor]
/// max_stack_lines = 1000
/// read_failure = "record"
/// ```
///
/// All sections are optional and have reasonable defaults. Turn it into a
/// [`SessionConfig`] with `SessionConfig::try_from`, which validates it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionConfig {
    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// Prefix of the log source names (`<label>:stdout`, `<label>:stderr`).
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default = "default_stdout_level")]
    pub stdout_level: LogLevel,

    #[serde(default = "default_stderr_level")]
    pub stderr_level: LogLevel,

    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,
}

fn default_stdout_level() -> LogLevel {
    LogLevel::Info
}

fn default_stderr_level() -> LogLevel {
    LogLevel::Warn
}

fn default_completion_timeout_ms() -> u64 {
    DEFAULT_COMPLETION_TIMEOUT.as_millis() as u64
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            label: None,
            stdout_level: default_stdout_level(),
            stderr_level: default_stderr_level(),
            completion_timeout_ms: default_completion_timeout_ms(),
        }
    }
}

/// `[monitor]` section, handed to every stream monitor of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Maximum number of lines grouped into one stack-trace record.
    #[serde(default = "default_max_stack_lines")]
    pub max_stack_lines: usize,

    /// What to do when reading a channel fails.
    #[serde(default)]
    pub read_failure: FailurePolicy,
}

fn default_max_stack_lines() -> usize {
    DEFAULT_MAX_STACK_LINES
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_stack_lines: default_max_stack_lines(),
            read_failure: FailurePolicy::default(),
        }
    }
}

/// Validated configuration of a [`crate::process::ProcessSession`].
///
/// Fields are public so callers can tweak a `SessionConfig::default()`;
/// the session re-validates on construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub label: Option<String>,
    pub stdout_level: LogLevel,
    pub stderr_level: LogLevel,
    pub completion_timeout: Duration,
    pub monitor: MonitorConfig,
}

impl SessionConfig {
    pub(crate) fn new_unchecked(session: SessionSection, monitor: MonitorConfig) -> Self {
        Self {
            label: session.label,
            stdout_level: session.stdout_level,
            stderr_level: session.stderr_level,
            completion_timeout: Duration::from_millis(session.completion_timeout_ms),
            monitor,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new_unchecked(SessionSection::default(), MonitorConfig::default())
    }
}
