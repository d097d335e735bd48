// src/lib.rs

pub mod config;
pub mod errors;
pub mod logging;
pub mod monitor;
pub mod process;
pub mod sink;
pub mod types;

pub use crate::config::SessionConfig;
pub use crate::errors::{ProcwatchError, Result};
pub use crate::process::{ProcessCommand, ProcessHandle, ProcessResult, ProcessSession};
pub use crate::sink::{LogSink, TracingSink};
pub use crate::types::{Channel, FailurePolicy, LogLevel};

/// High-level entry point: start `command`, wait for it, and return its
/// result.
///
/// This wires together:
/// - process start
/// - both stream monitors
/// - the bounded completion wait
///
/// The session is closed before returning, whatever the outcome.
pub async fn run(command: &ProcessCommand, config: SessionConfig) -> Result<ProcessResult> {
    let session = ProcessSession::start(command, config)?;
    let result = session.wait_for().await;
    session.close();
    result
}
