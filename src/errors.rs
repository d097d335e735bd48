// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Channel;

/// Longest stdout excerpt carried in a [`ProcwatchError::NonZeroExit`] message.
pub const MAX_OUTPUT_EXCERPT: usize = 4096;

#[derive(Error, Debug)]
pub enum ProcwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to spawn process (program={program:?}): {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("failed waiting for process: {0}")]
    Wait(std::io::Error),

    #[error("process exited with non-zero code {code}; stdout:\n{}", output_excerpt(.output))]
    NonZeroExit { code: i32, output: String },

    #[error("failed reading {channel}: {source}")]
    StreamRead {
        channel: Channel,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcwatchError>;

impl ProcwatchError {
    /// Equivalent error for handing out again.
    ///
    /// I/O sources keep their kind and message; variants without an
    /// I/O source are rebuilt field by field, the rest become `Other`.
    pub(crate) fn replay(&self) -> Self {
        match self {
            ProcwatchError::ConfigError(msg) => ProcwatchError::ConfigError(msg.clone()),
            ProcwatchError::Spawn { program, source } => ProcwatchError::Spawn {
                program: program.clone(),
                source: copy_io_error(source),
            },
            ProcwatchError::Wait(source) => ProcwatchError::Wait(copy_io_error(source)),
            ProcwatchError::NonZeroExit { code, output } => ProcwatchError::NonZeroExit {
                code: *code,
                output: output.clone(),
            },
            ProcwatchError::StreamRead { channel, source } => ProcwatchError::StreamRead {
                channel: *channel,
                source: copy_io_error(source),
            },
            ProcwatchError::IoError(source) => ProcwatchError::IoError(copy_io_error(source)),
            other => ProcwatchError::Other(anyhow::anyhow!(other.to_string())),
        }
    }
}

fn copy_io_error(err: &std::io::Error) -> std::io::Error {
    std::io::Error::new(err.kind(), err.to_string())
}

/// Shorten captured output for an error message.
///
/// Keeps the tail, where failures usually explain themselves, and notes how
/// much was cut.
pub fn output_excerpt(output: &str) -> String {
    let total = output.chars().count();
    if total <= MAX_OUTPUT_EXCERPT {
        return output.to_string();
    }

    let skipped = total - MAX_OUTPUT_EXCERPT;
    let start = output
        .char_indices()
        .nth(skipped)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    format!("... ({skipped} earlier characters omitted)\n{}", &output[start..])
}
