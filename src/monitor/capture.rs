// src/monitor/capture.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared passthrough buffer holding every byte a monitor has read.
///
/// Cloning shares the underlying buffer. The session keeps one clone per
/// channel so it can build a result from whatever was captured, even when
/// a monitor is still running.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, data: &[u8]) {
        self.lock().extend_from_slice(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Captured bytes as text; invalid UTF-8 is replaced.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A panicking writer can only leave whole lines behind.
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
