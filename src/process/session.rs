// src/process/session.rs

//! A running process plus the monitors draining its output.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::SessionConfig;
use crate::errors::{ProcwatchError, Result};
use crate::monitor::stream::interrupt_requested;
use crate::monitor::{
    CaptureBuffer, ChannelReader, CompletionSignal, MonitorExit, MonitorSupervisor, MonitorTarget,
};
use crate::process::command::ProcessCommand;
use crate::process::handle::ProcessHandle;
use crate::process::result::ProcessResult;
use crate::sink::{LogSink, TracingSink};
use crate::types::{Channel, FailurePolicy, LogLevel};

/// Label used for log sources when neither config nor command provides one.
pub const DEFAULT_LABEL: &str = "process";

/// Owns one process, its two stream monitors and the eventual result.
///
/// - [`wait_for`](Self::wait_for) runs the process to completion once; later
///   and concurrent calls share that run's outcome, failure included.
/// - [`stdout`](Self::stdout) / [`capture`](Self::capture) /
///   [`capture_quietly`](Self::capture_quietly) return the captured stdout,
///   optionally failing on a non-zero exit code.
/// - [`close`](Self::close) interrupts the monitors and terminates the
///   process. It is synchronous, idempotent and may run at any time,
///   including while another task is inside `wait_for`.
pub struct ProcessSession {
    label: String,
    config: SessionConfig,
    redirect_error_to_output: bool,
    sink: Arc<dyn LogSink>,
    supervisor: MonitorSupervisor,
    process: Mutex<Option<Box<dyn ProcessHandle>>>,
    channels: Mutex<Option<(ChannelReader, ChannelReader)>>,
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
    outcome: OnceCell<Result<ProcessResult>>,
}

impl fmt::Debug for ProcessSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSession")
            .field("label", &self.label)
            .field("config", &self.config)
            .field("redirect_error_to_output", &self.redirect_error_to_output)
            .field("supervisor", &self.supervisor)
            .field("outcome", &self.outcome.get())
            .finish_non_exhaustive()
    }
}

impl ProcessSession {
    /// Wrap an already started process.
    ///
    /// Fails if the config is invalid or the handle does not expose both
    /// output channels.
    pub fn new<H>(handle: H, config: SessionConfig) -> Result<Self>
    where
        H: ProcessHandle + 'static,
    {
        Self::from_boxed(Box::new(handle), config, false)
    }

    /// Start `command` and wrap the resulting process.
    ///
    /// Without a configured label, the program's file name is used.
    pub fn start(command: &ProcessCommand, mut config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if config.label.is_none() {
            config.label = Some(command.label());
        }
        let handle = command.start()?;
        Self::from_boxed(Box::new(handle), config, command.redirects_error_to_output())
    }

    fn from_boxed(
        mut handle: Box<dyn ProcessHandle>,
        config: SessionConfig,
        redirect_error_to_output: bool,
    ) -> Result<Self> {
        config.validate()?;

        let stdout = handle.take_stdout().ok_or_else(|| {
            ProcwatchError::ConfigError("process handle exposes no stdout channel".to_string())
        })?;
        let stderr = handle.take_stderr().ok_or_else(|| {
            ProcwatchError::ConfigError("process handle exposes no stderr channel".to_string())
        })?;

        let label = config
            .label
            .clone()
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());

        Ok(Self {
            label,
            supervisor: MonitorSupervisor::new(config.monitor),
            config,
            redirect_error_to_output,
            sink: Arc::new(TracingSink),
            process: Mutex::new(Some(handle)),
            channels: Mutex::new(Some((stdout, stderr))),
            stdout: CaptureBuffer::new(),
            stderr: CaptureBuffer::new(),
            outcome: OnceCell::new(),
        })
    }

    /// Route records to `sink` instead of `tracing`. Call before `wait_for`.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_closed(&self) -> bool {
        self.supervisor.is_closed()
    }

    /// Log source name of a channel's records.
    pub fn source_name(&self, channel: Channel) -> String {
        format!("{}:{}", self.label, channel)
    }

    /// Run the process to completion and return its result.
    ///
    /// Launches both monitors, waits for the process to exit, then waits at
    /// most `completion_timeout` for the monitors. A monitor still running
    /// after that is reported as an error record and the result is built
    /// from what was captured so far.
    ///
    /// A failed run is not retried: later calls report the same error.
    pub async fn wait_for(&self) -> Result<ProcessResult> {
        match self
            .outcome
            .get_or_init(|| self.run_to_completion())
            .await
        {
            Ok(result) => Ok(result.clone()),
            Err(err) => Err(err.replay()),
        }
    }

    /// Captured stdout; with `check_exit_code`, a non-zero exit is an error.
    pub async fn stdout(&self, check_exit_code: bool) -> Result<String> {
        let result = self.wait_for().await?;
        if check_exit_code && !result.success() {
            return Err(ProcwatchError::NonZeroExit {
                code: result.exit_code(),
                output: result.into_stdout(),
            });
        }
        Ok(result.into_stdout())
    }

    /// Wait and capture stdout, failing on a non-zero exit code.
    pub async fn capture(&self) -> Result<String> {
        self.stdout(true).await
    }

    /// Wait and capture stdout, ignoring the exit code.
    pub async fn capture_quietly(&self) -> Result<String> {
        self.stdout(false).await
    }

    /// Interrupt the monitors and terminate the process.
    pub fn close(&self) {
        if self.supervisor.close() {
            debug!(label = %self.label, "closing process session");
        }

        // While `wait_for` holds the handle, the closed flag makes it
        // terminate the process itself.
        if let Some(handle) = self.lock_process().as_mut() {
            self.terminate(handle.as_mut());
        }
    }

    async fn run_to_completion(&self) -> Result<ProcessResult> {
        let signal = Arc::new(CompletionSignal::new(2));
        self.supervisor
            .launch(&signal, &self.sink, self.monitor_targets());

        let exit_code = self.wait_for_exit().await?;

        let timeout = self.config.completion_timeout;
        let settled = signal.wait_timeout(timeout).await;
        if !settled {
            self.sink.log(
                LogLevel::Error,
                &self.label,
                &format!(
                    "{} stream monitor(s) still running {timeout:?} after process exit; output may be incomplete",
                    signal.remaining()
                ),
            );
        }

        for (channel, exit) in self.supervisor.collect_exits(settled).await {
            debug!(label = %self.label, %channel, ?exit, "stream monitor finished");
            if let MonitorExit::Failed(source) = exit {
                if self.config.monitor.read_failure == FailurePolicy::Escalate {
                    return Err(ProcwatchError::StreamRead { channel, source });
                }
            }
        }

        Ok(ProcessResult::new(
            exit_code,
            self.stdout.to_text(),
            self.stderr.to_text(),
        ))
    }

    fn monitor_targets(&self) -> [MonitorTarget; 2] {
        let taken = self.lock_channels().take();
        let (stdout_reader, stderr_reader) = match taken {
            Some((stdout, stderr)) => (Some(stdout), Some(stderr)),
            None => (None, None),
        };

        let (stderr_level, stderr_capture) = if self.redirect_error_to_output {
            (self.config.stdout_level, self.stdout.clone())
        } else {
            (self.config.stderr_level, self.stderr.clone())
        };

        [
            MonitorTarget {
                channel: Channel::Stdout,
                source: self.source_name(Channel::Stdout),
                level: self.config.stdout_level,
                reader: stdout_reader,
                capture: self.stdout.clone(),
            },
            MonitorTarget {
                channel: Channel::Stderr,
                source: self.source_name(Channel::Stderr),
                level: stderr_level,
                reader: stderr_reader,
                capture: stderr_capture,
            },
        ]
    }

    async fn wait_for_exit(&self) -> Result<i32> {
        let taken = self.lock_process().take();
        let Some(mut handle) = taken else {
            return Err(ProcwatchError::Wait(std::io::Error::other(
                "process handle is already being waited on",
            )));
        };

        let mut closed = self.supervisor.subscribe_closed();
        let mut terminated = false;
        let status = tokio::select! {
            status = handle.wait() => status,
            _ = interrupt_requested(&mut closed) => {
                debug!(label = %self.label, "session closed while waiting; terminating process");
                self.terminate(handle.as_mut());
                terminated = true;
                handle.wait().await
            }
        };

        *self.lock_process() = Some(handle);

        // A `close` that ran while the handle was out found nothing to
        // terminate and the exit won the race above.
        if !terminated && self.supervisor.is_closed() {
            if let Some(handle) = self.lock_process().as_mut() {
                self.terminate(handle.as_mut());
            }
        }

        let exit_code = status.map_err(ProcwatchError::Wait)?;
        debug!(label = %self.label, exit_code, "process exited");
        Ok(exit_code)
    }

    fn terminate(&self, handle: &mut dyn ProcessHandle) {
        if let Err(err) = handle.terminate() {
            self.sink.log(
                LogLevel::Warn,
                &self.label,
                &format!("failed to terminate process: {err}"),
            );
        }
    }

    fn lock_process(&self) -> MutexGuard<'_, Option<Box<dyn ProcessHandle>>> {
        self.process.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_channels(&self) -> MutexGuard<'_, Option<(ChannelReader, ChannelReader)>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
