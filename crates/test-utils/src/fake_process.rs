use std::future::Future;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::watch;

use procwatch::monitor::ChannelReader;
use procwatch::process::{ProcessHandle, SIGNALLED_EXIT_CODE};

type ExitSender = Arc<watch::Sender<Option<i32>>>;

/// A fake process that:
/// - serves its output from memory (or from pipes driven by a [`FakeControl`])
/// - exits when told to, or when terminated
/// - counts how often it was terminated.
pub struct FakeProcess {
    stdout: Option<ChannelReader>,
    stderr: Option<ChannelReader>,
    exit: ExitSender,
    terminations: Arc<AtomicUsize>,
}

impl FakeProcess {
    /// A process that has already exited with `code` after writing the given
    /// output.
    pub fn finished(code: i32, stdout: &str, stderr: &str) -> Self {
        let (exit, _) = watch::channel(Some(code));
        Self {
            stdout: Some(Box::new(Cursor::new(stdout.as_bytes().to_vec()))),
            stderr: Some(Box::new(Cursor::new(stderr.as_bytes().to_vec()))),
            exit: Arc::new(exit),
            terminations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A running process; output and exit are driven through the control.
    pub fn running() -> (Self, FakeControl) {
        let (stdout_reader, stdout_writer) = tokio::io::duplex(64 * 1024);
        let (stderr_reader, stderr_writer) = tokio::io::duplex(64 * 1024);
        let (exit, _) = watch::channel(None);
        let exit = Arc::new(exit);
        let terminations = Arc::new(AtomicUsize::new(0));

        let process = Self {
            stdout: Some(Box::new(stdout_reader)),
            stderr: Some(Box::new(stderr_reader)),
            exit: Arc::clone(&exit),
            terminations: Arc::clone(&terminations),
        };
        let control = FakeControl {
            stdout: Some(stdout_writer),
            stderr: Some(stderr_writer),
            exit,
            terminations,
        };
        (process, control)
    }

    pub fn with_stdout(mut self, reader: ChannelReader) -> Self {
        self.stdout = Some(reader);
        self
    }

    pub fn without_stderr(mut self) -> Self {
        self.stderr = None;
        self
    }

    /// Shared termination counter, readable after the process was moved
    /// into a session.
    pub fn terminations(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.terminations)
    }
}

impl ProcessHandle for FakeProcess {
    fn take_stdout(&mut self) -> Option<ChannelReader> {
        self.stdout.take()
    }

    fn take_stderr(&mut self) -> Option<ChannelReader> {
        self.stderr.take()
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = io::Result<i32>> + Send + '_>> {
        let mut rx = self.exit.subscribe();
        Box::pin(async move {
            if rx.wait_for(|code| code.is_some()).await.is_err() {
                return Err(io::Error::other("fake process exit sender dropped"));
            }
            let code = *rx.borrow();
            Ok(code.unwrap_or(SIGNALLED_EXIT_CODE))
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        set_exit(&self.exit, SIGNALLED_EXIT_CODE);
        Ok(())
    }
}

/// Test-side end of a [`FakeProcess::running`] process.
pub struct FakeControl {
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    exit: ExitSender,
    terminations: Arc<AtomicUsize>,
}

impl FakeControl {
    pub async fn write_stdout(&mut self, text: &str) -> io::Result<()> {
        write_to(&mut self.stdout, text).await
    }

    pub async fn write_stderr(&mut self, text: &str) -> io::Result<()> {
        write_to(&mut self.stderr, text).await
    }

    /// Close both pipes; the monitors see end-of-stream.
    pub fn close_pipes(&mut self) {
        self.stdout = None;
        self.stderr = None;
    }

    /// Let the process exit with `code` (ignored if it already exited).
    pub fn exit(&self, code: i32) {
        set_exit(&self.exit, code);
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

async fn write_to(pipe: &mut Option<DuplexStream>, text: &str) -> io::Result<()> {
    match pipe {
        Some(pipe) => pipe.write_all(text.as_bytes()).await,
        None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
    }
}

fn set_exit(exit: &ExitSender, code: i32) {
    exit.send_if_modified(|current| {
        if current.is_some() {
            return false;
        }
        *current = Some(code);
        true
    });
}

/// Reader that serves `data`, then fails with `kind`.
pub struct FailingReader {
    data: Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingReader {
    pub fn new(data: &str, kind: io::ErrorKind) -> Self {
        Self {
            data: Cursor::new(data.as_bytes().to_vec()),
            kind,
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let kind = self.kind;
        match Pin::new(&mut self.data).poll_read(cx, buf) {
            Poll::Ready(Ok(())) if buf.filled().len() == before => {
                Poll::Ready(Err(io::Error::new(kind, "simulated read failure")))
            }
            other => other,
        }
    }
}
