#![allow(dead_code)]

use std::sync::Arc;

use procwatch::sink::LogSink;

pub use procwatch_test_utils::{
    FailingReader, FakeControl, FakeProcess, RecordingSink, SessionConfigBuilder, init_tracing,
    with_timeout, with_timeout_of,
};

/// A recording sink plus the same sink as a trait object, ready to hand to
/// a session or monitor.
pub fn recording_sink() -> (Arc<RecordingSink>, Arc<dyn LogSink>) {
    let sink = Arc::new(RecordingSink::new());
    let dyn_sink: Arc<dyn LogSink> = sink.clone();
    (sink, dyn_sink)
}

/// Java-style exception with `frames` `at` lines.
pub fn java_trace(frames: usize) -> Vec<String> {
    let mut lines = vec![
        "Exception in thread \"main\" java.lang.IllegalStateException: boom".to_string(),
    ];
    for i in 0..frames {
        lines.push(format!("\tat com.example.App.step{i}(App.java:{})", 10 + i));
    }
    lines
}
