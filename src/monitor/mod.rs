// src/monitor/mod.rs

//! Output channel monitoring.
//!
//! - [`coalesce`] groups stack-trace lines into single records (pure).
//! - [`capture`] is the passthrough buffer shared with the session.
//! - [`completion`] is the countdown the session waits on.
//! - [`stream`] drains one channel on a background task.
//! - [`supervisor`] starts both monitors and owns their shutdown.

pub mod capture;
pub mod coalesce;
pub mod completion;
pub mod stream;
pub mod supervisor;

pub use capture::CaptureBuffer;
pub use coalesce::{LineCoalescer, is_continuation};
pub use completion::{CompletionGuard, CompletionSignal};
pub use stream::{ChannelReader, MonitorExit, RECORD_PREFIX, StreamMonitor};
pub use supervisor::{MonitorSupervisor, MonitorTarget};
