// src/process/mod.rs

//! Process lifecycle.
//!
//! - [`handle`] provides the `ProcessHandle` trait and the `TokioProcess`
//!   implementation used in production; tests can replace it with a fake.
//! - [`command`] describes and starts a process.
//! - [`session`] owns a process and its monitors and produces the result.
//! - [`result`] is the immutable outcome.

pub mod command;
pub mod handle;
pub mod result;
pub mod session;

pub use command::ProcessCommand;
pub use handle::{ProcessHandle, SIGNALLED_EXIT_CODE, TokioProcess};
pub use result::ProcessResult;
pub use session::{DEFAULT_LABEL, ProcessSession};
