// src/monitor/completion.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Countdown that lets the session wait for both stream monitors.
///
/// Decrements saturate at zero, so the transition to zero happens exactly
/// once no matter how many extra `count_down` calls arrive.
#[derive(Debug)]
pub struct CompletionSignal {
    remaining: watch::Sender<usize>,
}

impl CompletionSignal {
    pub fn new(count: usize) -> Self {
        let (remaining, _) = watch::channel(count);
        Self { remaining }
    }

    pub fn count_down(&self) {
        self.remaining.send_if_modified(|remaining| {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
            true
        });
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until the count reaches zero.
    pub async fn wait(&self) {
        let mut rx = self.remaining.subscribe();
        // The sender lives in `self`, so this can't observe a closed channel.
        let _ = rx.wait_for(|remaining| *remaining == 0).await;
    }

    /// Wait at most `timeout`; returns whether the count reached zero.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

/// Counts its signal down once when dropped.
///
/// Each monitor task owns one, so completion is signalled on every exit
/// path: normal return, interruption, read failure, abort or panic.
#[derive(Debug)]
pub struct CompletionGuard {
    signal: Arc<CompletionSignal>,
}

impl CompletionGuard {
    pub fn new(signal: Arc<CompletionSignal>) -> Self {
        Self { signal }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.signal.count_down();
    }
}
