//! Hand-off queue between the listener and the committer.
//!
//! Any number of producers push decoded entries; exactly one consumer pops
//! them in push order. Popping waits on the channel instead of polling.

use crate::domain::LogEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ingest queue consumer has shut down")]
pub struct QueueClosed;

/// Create an unbounded ingest queue.
#[must_use]
pub fn ingest_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        QueueSender {
            tx,
            depth: depth.clone(),
        },
        QueueReceiver { rx, depth },
    )
}

/// Producer handle. Cheap to clone, usable from any task or thread.
#[derive(Clone, Debug)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<LogEntry>,
    depth: Arc<AtomicUsize>,
}

impl QueueSender {
    /// Enqueue without waiting.
    pub fn push(&self, entry: LogEntry) -> Result<(), QueueClosed> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        self.tx.send(entry).map_err(|_| {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            QueueClosed
        })
    }

    /// Approximate number of entries waiting to be committed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single consumer handle.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<LogEntry>,
    depth: Arc<AtomicUsize>,
}

impl QueueReceiver {
    /// Wait for the oldest entry.
    ///
    /// Returns `None` once every sender has been dropped and the queue is
    /// empty.
    pub async fn pop(&mut self) -> Option<LogEntry> {
        let entry = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::AcqRel);
        Some(entry)
    }

    #[cfg(test)]
    pub(crate) fn try_pop(&mut self) -> Option<LogEntry> {
        let entry = self.rx.try_recv().ok()?;
        self.depth.fetch_sub(1, Ordering::AcqRel);
        Some(entry)
    }

    /// Refuse further pushes. Entries already queued can still be popped.
    pub fn close(&mut self) {
        self.rx.close();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
