// tests/supervisor.rs

mod common;
use crate::common::{init_tracing, recording_sink, with_timeout};

use std::error::Error;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use procwatch::config::MonitorConfig;
use procwatch::monitor::{
    CaptureBuffer, ChannelReader, CompletionGuard, CompletionSignal, MonitorExit,
    MonitorSupervisor, MonitorTarget,
};
use procwatch::types::{Channel, LogLevel};

type TestResult = Result<(), Box<dyn Error>>;

fn target(channel: Channel, reader: Option<ChannelReader>, capture: &CaptureBuffer) -> MonitorTarget {
    MonitorTarget {
        channel,
        source: format!("job:{channel}"),
        level: LogLevel::Info,
        reader,
        capture: capture.clone(),
    }
}

fn text(s: &str) -> Option<ChannelReader> {
    Some(Box::new(Cursor::new(s.as_bytes().to_vec())))
}

#[test]
fn completion_signal_saturates_at_zero() {
    let signal = CompletionSignal::new(2);
    assert_eq!(signal.remaining(), 2);

    signal.count_down();
    assert!(!signal.is_complete());
    signal.count_down();
    assert!(signal.is_complete());

    signal.count_down();
    assert_eq!(signal.remaining(), 0);
}

#[tokio::test]
async fn completion_guard_counts_down_when_its_task_is_aborted() -> TestResult {
    init_tracing();

    let signal = Arc::new(CompletionSignal::new(1));
    let guard = CompletionGuard::new(Arc::clone(&signal));

    let task = tokio::spawn(async move {
        let _guard = guard;
        std::future::pending::<()>().await;
    });
    tokio::task::yield_now().await;
    assert!(!signal.is_complete());

    task.abort();
    assert!(task.await.is_err());
    assert!(signal.wait_timeout(Duration::from_secs(1)).await);
    Ok(())
}

#[tokio::test]
async fn wait_timeout_reports_an_unfinished_count() -> TestResult {
    let signal = CompletionSignal::new(1);
    assert!(!signal.wait_timeout(Duration::from_millis(20)).await);

    signal.count_down();
    assert!(signal.wait_timeout(Duration::from_millis(20)).await);
    Ok(())
}

#[tokio::test]
async fn launched_monitors_drain_both_channels() -> TestResult {
    init_tracing();

    let supervisor = MonitorSupervisor::new(MonitorConfig::default());
    let signal = Arc::new(CompletionSignal::new(2));
    let (sink, dyn_sink) = recording_sink();
    let stdout = CaptureBuffer::new();
    let stderr = CaptureBuffer::new();

    let started = supervisor.launch(
        &signal,
        &dyn_sink,
        [
            target(Channel::Stdout, text("out\n"), &stdout),
            target(Channel::Stderr, text("err\n"), &stderr),
        ],
    );
    assert_eq!(started, 2);

    with_timeout(signal.wait()).await;
    assert_eq!(stdout.to_text(), "out\n");
    assert_eq!(stderr.to_text(), "err\n");
    assert_eq!(sink.groups("job:stdout"), vec!["out"]);
    assert_eq!(sink.groups("job:stderr"), vec!["err"]);

    let exits = supervisor.collect_exits(true).await;
    assert_eq!(exits.len(), 2);
    assert!(exits.iter().all(|(_, exit)| matches!(exit, MonitorExit::EndOfStream)));
    Ok(())
}

#[tokio::test]
async fn launch_after_close_starts_nothing_but_still_completes() -> TestResult {
    init_tracing();

    let supervisor = MonitorSupervisor::new(MonitorConfig::default());
    assert!(supervisor.close());
    assert!(!supervisor.close());
    assert!(supervisor.is_closed());

    let signal = Arc::new(CompletionSignal::new(2));
    let (sink, dyn_sink) = recording_sink();
    let capture = CaptureBuffer::new();

    let started = supervisor.launch(
        &signal,
        &dyn_sink,
        [
            target(Channel::Stdout, text("never read\n"), &capture),
            target(Channel::Stderr, text("never read\n"), &capture),
        ],
    );

    assert_eq!(started, 0);
    assert!(signal.is_complete());
    assert!(capture.is_empty());
    assert!(sink.records().is_empty());
    assert!(supervisor.collect_exits(false).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_reader_counts_as_finished() -> TestResult {
    init_tracing();

    let supervisor = MonitorSupervisor::new(MonitorConfig::default());
    let signal = Arc::new(CompletionSignal::new(2));
    let (_sink, dyn_sink) = recording_sink();
    let capture = CaptureBuffer::new();

    let started = supervisor.launch(
        &signal,
        &dyn_sink,
        [
            target(Channel::Stdout, text("only stdout\n"), &capture),
            target(Channel::Stderr, None, &capture),
        ],
    );

    assert_eq!(started, 1);
    with_timeout(signal.wait()).await;
    assert_eq!(capture.to_text(), "only stdout\n");
    Ok(())
}

#[tokio::test]
async fn close_interrupts_running_monitors() -> TestResult {
    init_tracing();

    let supervisor = MonitorSupervisor::new(MonitorConfig::default());
    let signal = Arc::new(CompletionSignal::new(2));
    let (_sink, dyn_sink) = recording_sink();
    let capture = CaptureBuffer::new();

    // Writers stay alive, so neither channel ever reaches end-of-stream.
    let (stdout_reader, _stdout_writer) = tokio::io::duplex(64);
    let (stderr_reader, _stderr_writer) = tokio::io::duplex(64);

    supervisor.launch(
        &signal,
        &dyn_sink,
        [
            target(Channel::Stdout, Some(Box::new(stdout_reader)), &capture),
            target(Channel::Stderr, Some(Box::new(stderr_reader)), &capture),
        ],
    );
    assert!(!signal.wait_timeout(Duration::from_millis(20)).await);

    supervisor.close();
    with_timeout(signal.wait()).await;

    let exits = supervisor.collect_exits(true).await;
    assert_eq!(exits.len(), 2);
    assert!(exits.iter().all(|(_, exit)| matches!(exit, MonitorExit::Interrupted)));
    Ok(())
}
