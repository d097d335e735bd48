// src/monitor/stream.rs

//! Single-channel stream monitor.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::monitor::capture::CaptureBuffer;
use crate::monitor::coalesce::LineCoalescer;
use crate::sink::LogSink;
use crate::types::{Channel, LogLevel};

/// Readable end of one process output channel.
pub type ChannelReader = Box<dyn AsyncRead + Send + Unpin>;

/// Prefix of every grouped record a monitor emits.
pub const RECORD_PREFIX: &str = ">> ";

/// How a monitor stopped.
#[derive(Debug)]
pub enum MonitorExit {
    /// The channel reached end-of-stream and everything was flushed.
    EndOfStream,
    /// Interruption was requested; buffered lines may not have been flushed.
    Interrupted,
    /// Reading the channel failed.
    Failed(io::Error),
}

/// Drains one channel into a [`CaptureBuffer`] and a [`LogSink`].
///
/// Every byte read goes to the capture buffer as-is. Lines are decoded
/// (lossily) and fed through a [`LineCoalescer`]; each finished group is
/// logged as one record at the monitor's level.
pub struct StreamMonitor {
    channel: Channel,
    source: String,
    level: LogLevel,
    reader: BufReader<ChannelReader>,
    capture: CaptureBuffer,
    coalescer: LineCoalescer,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for StreamMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamMonitor")
            .field("channel", &self.channel)
            .field("source", &self.source)
            .field("level", &self.level)
            .field("coalescer", &self.coalescer)
            .finish_non_exhaustive()
    }
}

impl StreamMonitor {
    pub fn new(
        channel: Channel,
        source: impl Into<String>,
        level: LogLevel,
        reader: ChannelReader,
        capture: CaptureBuffer,
        config: &MonitorConfig,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            channel,
            source: source.into(),
            level,
            reader: BufReader::new(reader),
            capture,
            coalescer: LineCoalescer::new(config.max_stack_lines),
            sink,
        }
    }

    /// Pump the channel until end-of-stream, interruption or a read failure.
    ///
    /// `interrupt` is level-triggered: once it holds `true` (or its sender is
    /// gone) the monitor stops at the next suspension point.
    pub async fn run(mut self, mut interrupt: watch::Receiver<bool>) -> MonitorExit {
        debug!(source = %self.source, channel = %self.channel, "stream monitor started");

        let mut raw = Vec::new();
        loop {
            raw.clear();

            let read = tokio::select! {
                biased;
                _ = interrupt_requested(&mut interrupt) => {
                    return self.interrupted();
                }
                res = self.reader.read_until(b'\n', &mut raw) => res,
            };

            match read {
                Ok(0) => {
                    self.flush();
                    debug!(source = %self.source, "stream monitor reached end of stream");
                    return MonitorExit::EndOfStream;
                }
                Ok(_) => self.accept(&raw),
                Err(_) if is_interrupted(&interrupt) => return self.interrupted(),
                Err(err) => {
                    // Lines read before the failure are still real output.
                    self.flush();
                    self.sink.log(
                        LogLevel::Error,
                        &self.source,
                        &format!("failed reading {}: {err}", self.channel),
                    );
                    return MonitorExit::Failed(err);
                }
            }
        }
    }

    fn accept(&mut self, raw: &[u8]) {
        self.capture.append(raw);

        let line = decode_line(raw);
        if let Some(group) = self.coalescer.push(&line) {
            self.emit(&group);
        }
    }

    fn flush(&mut self) {
        if let Some(group) = self.coalescer.finish() {
            self.emit(&group);
        }
    }

    fn emit(&self, group: &str) {
        if self.sink.is_enabled(self.level, &self.source) {
            self.sink
                .log(self.level, &self.source, &format!("{RECORD_PREFIX}{group}"));
        }
    }

    fn interrupted(&self) -> MonitorExit {
        self.sink.log(
            LogLevel::Debug,
            &self.source,
            &format!(
                "{} monitor interrupted with {} buffered line(s)",
                self.channel,
                self.coalescer.pending_lines()
            ),
        );
        MonitorExit::Interrupted
    }
}

/// Resolve once interruption has been requested or its sender dropped.
pub(crate) async fn interrupt_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

fn is_interrupted(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow()
}

/// Decode a raw line and strip its terminator (`\n` or `\r\n`).
fn decode_line(raw: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(raw).into_owned();
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
