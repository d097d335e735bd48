// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{MonitorConfig, RawSessionConfig, SessionConfig};
use crate::errors::{ProcwatchError, Result};
use crate::types::LogLevel;

impl TryFrom<RawSessionConfig> for SessionConfig {
    type Error = ProcwatchError;

    fn try_from(raw: RawSessionConfig) -> std::result::Result<Self, Self::Error> {
        let config = SessionConfig::new_unchecked(raw.session, raw.monitor);
        config.validate()?;
        Ok(config)
    }
}

impl SessionConfig {
    /// Check the invariants a session relies on.
    pub fn validate(&self) -> Result<()> {
        validate_channel_level("stdout_level", self.stdout_level)?;
        validate_channel_level("stderr_level", self.stderr_level)?;
        validate_completion_timeout(self.completion_timeout)?;
        validate_monitor(&self.monitor)?;
        Ok(())
    }
}

fn validate_channel_level(field: &str, level: LogLevel) -> Result<()> {
    if level.is_catch_all() {
        return Err(ProcwatchError::ConfigError(format!(
            "[session].{field} cannot be \"all\": it is a filter threshold, not a record level"
        )));
    }
    Ok(())
}

fn validate_completion_timeout(timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(ProcwatchError::ConfigError(
            "[session].completion_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_monitor(monitor: &MonitorConfig) -> Result<()> {
    if monitor.max_stack_lines == 0 {
        return Err(ProcwatchError::ConfigError(
            "[monitor].max_stack_lines must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
