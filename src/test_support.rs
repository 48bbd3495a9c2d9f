//! Shared test support utilities
//!
//! Provides an in-memory `LogSink` that captures committed bytes for use in
//! unit and integration tests.

use crate::error::DaemonError;
use crate::port::{LogSink, SinkKind};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Sink that records every committed line.
///
/// Clones share the same buffer: hand one to the daemon, inspect another.
#[derive(Clone)]
pub struct MemorySink {
    kind: SinkKind,
    written: Arc<Mutex<Vec<u8>>>,
    should_fail: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new(kind: SinkKind) -> Self {
        Self {
            kind,
            written: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn contents(&self) -> String {
        let written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&written).into_owned()
    }

    /// Committed lines, each still carrying its trailing newline.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .split_inclusive('\n')
            .map(str::to_string)
            .collect()
    }

    /// Poll until at least `count` lines were committed or `timeout` expires.
    pub async fn wait_for_lines(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.lines().len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl LogSink for MemorySink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    fn write_line<'a>(
        &'a mut self,
        line: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(DaemonError::SinkWrite(io::Error::other(
                    "Mock sink failure",
                )));
            }
            self.written
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(line);
            Ok(())
        })
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
