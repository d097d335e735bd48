// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawSessionConfig, SessionConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawSessionConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSessionConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawSessionConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Rejects the catch-all level for either channel, a zero completion
///   timeout and a zero `max_stack_lines`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SessionConfig> {
    let raw = load_from_path(path)?;
    SessionConfig::try_from(raw)
}

/// Same as [`load_and_validate`], for configuration already held in memory.
pub fn from_toml_str(contents: &str) -> Result<SessionConfig> {
    let raw: RawSessionConfig = toml::from_str(contents)?;
    SessionConfig::try_from(raw)
}
