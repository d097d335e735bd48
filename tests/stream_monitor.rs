// tests/stream_monitor.rs

mod common;
use crate::common::{FailingReader, RecordingSink, init_tracing, java_trace, recording_sink, with_timeout};

use std::error::Error;
use std::io::{self, Cursor};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

use procwatch::config::MonitorConfig;
use procwatch::monitor::{CaptureBuffer, ChannelReader, MonitorExit, StreamMonitor};
use procwatch::sink::LogSink;
use procwatch::types::{Channel, LogLevel};

type TestResult = Result<(), Box<dyn Error>>;

const SOURCE: &str = "job:stdout";

fn monitor(
    reader: ChannelReader,
    capture: &CaptureBuffer,
    sink: Arc<dyn LogSink>,
    max_stack_lines: usize,
) -> StreamMonitor {
    let config = MonitorConfig {
        max_stack_lines,
        ..MonitorConfig::default()
    };
    StreamMonitor::new(
        Channel::Stdout,
        SOURCE,
        LogLevel::Info,
        reader,
        capture.clone(),
        &config,
        sink,
    )
}

fn from_text(text: &str) -> ChannelReader {
    Box::new(Cursor::new(text.as_bytes().to_vec()))
}

#[tokio::test]
async fn capture_is_byte_exact() -> TestResult {
    init_tracing();

    let text = "one\r\ntwo\n\nthree without newline";
    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);

    let exit = with_timeout(monitor(from_text(text), &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    assert!(matches!(exit, MonitorExit::EndOfStream));
    assert_eq!(capture.to_text(), text);
    assert_eq!(
        sink.groups(SOURCE),
        vec!["one", "two", "", "three without newline"]
    );
    assert!(sink.records().iter().all(|r| r.level == LogLevel::Info));
    Ok(())
}

#[tokio::test]
async fn capture_does_not_depend_on_the_sink_being_enabled() -> TestResult {
    init_tracing();

    let text: String = (0..500).map(|i| format!("line {i}\n")).collect();
    let capture = CaptureBuffer::new();
    let sink = Arc::new(RecordingSink::silent());
    let dyn_sink: Arc<dyn LogSink> = sink.clone();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);

    let exit = with_timeout(monitor(from_text(&text), &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    assert!(matches!(exit, MonitorExit::EndOfStream));
    assert_eq!(capture.to_text(), text);
    assert!(sink.records().is_empty());
    Ok(())
}

#[tokio::test]
async fn long_trace_becomes_a_single_record() -> TestResult {
    init_tracing();

    let trace = java_trace(20);
    let text = format!("{}\n", trace.join("\n"));
    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);

    with_timeout(monitor(from_text(&text), &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    let groups = sink.groups(SOURCE);
    assert_eq!(groups, vec![trace.join("\n")]);
    assert_eq!(capture.to_text(), text);
    Ok(())
}

#[tokio::test]
async fn oversized_trace_is_split_without_losing_lines() -> TestResult {
    init_tracing();

    let trace = java_trace(9);
    let text = format!("{}\n", trace.join("\n"));
    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);

    with_timeout(monitor(from_text(&text), &capture, dyn_sink, 4).run(interrupt_rx)).await;

    let groups = sink.groups(SOURCE);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups.join("\n"), trace.join("\n"));
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_is_captured_raw_and_logged_lossily() -> TestResult {
    init_tracing();

    let bytes = b"caf\xe9\n".to_vec();
    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);

    let reader: ChannelReader = Box::new(Cursor::new(bytes.clone()));
    with_timeout(monitor(reader, &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    assert_eq!(capture.to_bytes(), bytes);
    assert_eq!(sink.groups(SOURCE), vec!["caf\u{fffd}"]);
    Ok(())
}

#[tokio::test]
async fn read_failure_flushes_logs_an_error_and_stops() -> TestResult {
    init_tracing();

    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (_interrupt_tx, interrupt_rx) = watch::channel(false);
    let reader: ChannelReader = Box::new(FailingReader::new(
        "first\nsecond\n",
        io::ErrorKind::ConnectionReset,
    ));

    let exit = with_timeout(monitor(reader, &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    match exit {
        MonitorExit::Failed(err) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected a read failure, got {other:?}"),
    }
    assert_eq!(capture.to_text(), "first\nsecond\n");
    assert_eq!(sink.groups(SOURCE), vec!["first", "second"]);

    let errors = sink.messages_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed reading stdout"), "got: {}", errors[0]);
    Ok(())
}

#[tokio::test]
async fn interruption_stops_a_blocked_monitor() -> TestResult {
    init_tracing();

    let (reader, mut writer) = tokio::io::duplex(1024);
    let capture = CaptureBuffer::new();
    let (sink, dyn_sink) = recording_sink();
    let (interrupt_tx, interrupt_rx) = watch::channel(false);

    let task = tokio::spawn(monitor(Box::new(reader), &capture, dyn_sink, 1000).run(interrupt_rx));

    // Leave a trace open so there is something buffered when we interrupt.
    writer.write_all(b"boom\n\tat a.B.c(B.java:1)\n").await?;
    tokio::task::yield_now().await;

    interrupt_tx.send_replace(true);
    let exit = with_timeout(task).await?;

    assert!(matches!(exit, MonitorExit::Interrupted));
    assert!(sink.messages_at(LogLevel::Info).is_empty());
    let debug = sink.messages_at(LogLevel::Debug);
    assert_eq!(debug.len(), 1);
    assert!(debug[0].contains("interrupted"), "got: {}", debug[0]);
    Ok(())
}

#[tokio::test]
async fn dropped_interrupt_sender_counts_as_interruption() -> TestResult {
    init_tracing();

    let (reader, _writer) = tokio::io::duplex(1024);
    let capture = CaptureBuffer::new();
    let (_sink, dyn_sink) = recording_sink();
    let (interrupt_tx, interrupt_rx) = watch::channel(false);
    drop(interrupt_tx);

    let exit = with_timeout(monitor(Box::new(reader), &capture, dyn_sink, 1000).run(interrupt_rx)).await;

    assert!(matches!(exit, MonitorExit::Interrupted));
    Ok(())
}
