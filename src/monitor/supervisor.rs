// src/monitor/supervisor.rs

//! Owner of a session's two stream monitors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::monitor::capture::CaptureBuffer;
use crate::monitor::completion::{CompletionGuard, CompletionSignal};
use crate::monitor::stream::{ChannelReader, MonitorExit, StreamMonitor};
use crate::sink::LogSink;
use crate::types::{Channel, LogLevel};

/// Everything needed to start the monitor of one channel.
///
/// `reader` is `None` when the channel has already been handed out; that
/// channel then counts as finished straight away.
pub struct MonitorTarget {
    pub channel: Channel,
    pub source: String,
    pub level: LogLevel,
    pub reader: Option<ChannelReader>,
    pub capture: CaptureBuffer,
}

/// State shared between `launch` and `close`. One lock guards both the
/// closed flag and the decision to start monitors.
#[derive(Default)]
struct SupervisorState {
    closed: bool,
    tasks: Vec<(Channel, JoinHandle<MonitorExit>)>,
}

/// Starts both monitors as background tasks and guarantees the completion
/// signal reaches zero, even when the session was closed before they could
/// start.
pub struct MonitorSupervisor {
    config: MonitorConfig,
    state: Mutex<SupervisorState>,
    interrupt: watch::Sender<bool>,
}

impl std::fmt::Debug for MonitorSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("MonitorSupervisor")
            .field("config", &self.config)
            .field("closed", &state.closed)
            .field("tasks", &state.tasks.len())
            .finish()
    }
}

impl MonitorSupervisor {
    pub fn new(config: MonitorConfig) -> Self {
        let (interrupt, _) = watch::channel(false);
        Self {
            config,
            state: Mutex::new(SupervisorState::default()),
            interrupt,
        }
    }

    /// Start one monitor per target.
    ///
    /// If the supervisor is already closed, nothing is spawned and the
    /// signal is counted down once per target instead. Returns the number of
    /// monitors actually started.
    pub fn launch(
        &self,
        signal: &Arc<CompletionSignal>,
        sink: &Arc<dyn LogSink>,
        targets: [MonitorTarget; 2],
    ) -> usize {
        let mut state = self.lock_state();

        if state.closed {
            debug!("supervisor closed before launch; not starting monitors");
            for _ in &targets {
                signal.count_down();
            }
            return 0;
        }

        let mut started = 0;
        for target in targets {
            let Some(reader) = target.reader else {
                debug!(source = %target.source, "channel already taken; nothing to monitor");
                signal.count_down();
                continue;
            };

            let monitor = StreamMonitor::new(
                target.channel,
                target.source,
                target.level,
                reader,
                target.capture,
                &self.config,
                Arc::clone(sink),
            );
            let guard = CompletionGuard::new(Arc::clone(signal));
            let interrupt = self.interrupt.subscribe();

            let handle = tokio::spawn(async move {
                let _guard = guard;
                monitor.run(interrupt).await
            });
            state.tasks.push((target.channel, handle));
            started += 1;
        }

        debug!(started, "stream monitors launched");
        started
    }

    /// Mark the supervisor closed and ask running monitors to stop.
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let mut state = self.lock_state();
        if state.closed {
            return false;
        }
        state.closed = true;
        self.interrupt.send_replace(true);
        debug!(running = state.tasks.len(), "supervisor closed; interrupting monitors");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Receiver that turns `true` once the supervisor is closed.
    pub fn subscribe_closed(&self) -> watch::Receiver<bool> {
        self.interrupt.subscribe()
    }

    /// Exit reasons of every monitor that has finished.
    ///
    /// With `settled`, the completion signal already reached zero: every
    /// monitor is past its last line and all of them are awaited. Otherwise
    /// monitors still running stay owned by the supervisor.
    pub async fn collect_exits(&self, settled: bool) -> Vec<(Channel, MonitorExit)> {
        let tasks = std::mem::take(&mut self.lock_state().tasks);

        let mut exits = Vec::new();
        let mut running = Vec::new();
        for (channel, handle) in tasks {
            if !settled && !handle.is_finished() {
                running.push((channel, handle));
                continue;
            }
            match handle.await {
                Ok(exit) => exits.push((channel, exit)),
                Err(err) => warn!(%channel, error = %err, "stream monitor task failed"),
            }
        }

        if !running.is_empty() {
            self.lock_state().tasks.extend(running);
        }
        exits
    }

    fn lock_state(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MonitorSupervisor {
    fn drop(&mut self) {
        self.interrupt.send_replace(true);
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in state.tasks.drain(..) {
            handle.abort();
        }
    }
}
