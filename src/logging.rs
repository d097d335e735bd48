// src/logging.rs

//! Logging setup for `procwatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit level passed by the embedding application (if provided)
//! 2. `PROCWATCH_LOG` environment variable (e.g. "info", "debug", "all")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that the host's stdout stays free.

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

use crate::types::LogLevel;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "PROCWATCH_LOG";

/// Initialise global logging subscriber.
///
/// Fails if another global subscriber is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level.as_tracing())
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from an explicit value and the env var contents.
pub fn resolve_level(explicit: Option<LogLevel>, env_value: Option<&str>) -> LogLevel {
    match explicit {
        Some(lvl) => lvl,
        None => env_value
            .and_then(|s| s.parse::<LogLevel>().ok())
            .unwrap_or(LogLevel::Info),
    }
}
