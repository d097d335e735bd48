#![allow(dead_code)]

use std::time::Duration;

use procwatch::config::SessionConfig;
use procwatch::types::{FailurePolicy, LogLevel};

/// Builder for `SessionConfig` to simplify test setup.
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.config.label = Some(label.to_string());
        self
    }

    pub fn stdout_level(mut self, level: LogLevel) -> Self {
        self.config.stdout_level = level;
        self
    }

    pub fn stderr_level(mut self, level: LogLevel) -> Self {
        self.config.stderr_level = level;
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = timeout;
        self
    }

    pub fn max_stack_lines(mut self, max: usize) -> Self {
        self.config.monitor.max_stack_lines = max;
        self
    }

    pub fn read_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.monitor.read_failure = policy;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
            .validate()
            .expect("Failed to build valid config from builder");
        self.config
    }

    /// Skip validation, for tests that expect construction to fail.
    pub fn build_unchecked(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
