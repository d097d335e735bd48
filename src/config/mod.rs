// src/config/mod.rs

//! Session configuration: TOML model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{from_toml_str, load_and_validate, load_from_path};
pub use model::{
    DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MAX_STACK_LINES, MonitorConfig, RawSessionConfig,
    SessionConfig, SessionSection,
};
