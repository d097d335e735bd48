// src/process/handle.rs

//! Process handle abstraction.
//!
//! The session talks to a `ProcessHandle` instead of a raw child process.
//! This makes it easy to swap in a fake process in tests while keeping the
//! production implementation, [`TokioProcess`], small.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::process::Child;

use crate::monitor::ChannelReader;

/// Exit code reported when a process was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// A started process: two output channels, a way to wait, a way to kill.
pub trait ProcessHandle: Send {
    /// Hand out the stdout reader; `None` once taken or if it was never piped.
    fn take_stdout(&mut self) -> Option<ChannelReader>;

    /// Hand out the stderr reader; `None` once taken or if it was never piped.
    fn take_stderr(&mut self) -> Option<ChannelReader>;

    /// Wait for the process to exit and return its exit code.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = io::Result<i32>> + Send + '_>>;

    /// Forcibly stop the process.
    ///
    /// Must be idempotent: terminating an exited process is not an error.
    fn terminate(&mut self) -> io::Result<()>;
}

/// Production handle backed by `tokio::process::Child`.
#[derive(Debug)]
pub struct TokioProcess {
    child: Child,
}

impl TokioProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl ProcessHandle for TokioProcess {
    fn take_stdout(&mut self) -> Option<ChannelReader> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::new(stdout) as ChannelReader)
    }

    fn take_stderr(&mut self) -> Option<ChannelReader> {
        self.child
            .stderr
            .take()
            .map(|stderr| Box::new(stderr) as ChannelReader)
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = io::Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(status.code().unwrap_or(SIGNALLED_EXIT_CODE))
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err),
        }
    }
}
