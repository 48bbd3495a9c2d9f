//! The single consumer of the ingest queue.
//!
//! Entries are popped in order, rendered and written to the sink one at a
//! time. Nothing else writes to the sink, which is what keeps lines from
//! concurrent clients from interleaving.

use crate::domain::LogEntry;
use crate::error::DaemonError;
use crate::format::{Style, format_entry};
use crate::port::LogSink;
use crate::queue::QueueReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Committer {
    queue: QueueReceiver,
    sink: Box<dyn LogSink>,
    style: Style,
}

impl Committer {
    #[must_use]
    pub fn new(queue: QueueReceiver, sink: Box<dyn LogSink>, style: Style) -> Self {
        Self { queue, sink, style }
    }

    /// Commit entries until `shutdown` is cancelled or every producer is gone.
    ///
    /// On cancellation the queue is closed and entries already in it are
    /// still committed before the sink is flushed. Returns the number of
    /// committed entries. A sink write failure stops the loop immediately.
    pub async fn run(self, shutdown: CancellationToken) -> Result<u64, DaemonError> {
        let Committer {
            mut queue,
            mut sink,
            style,
        } = self;
        let mut committed: u64 = 0;

        info!(sink = ?sink.kind(), style = ?style, "Committer started");

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    queue.close();
                    if queue.is_empty() {
                        info!("Committer shutting down");
                    } else {
                        info!(pending = queue.len(), "Committer shutting down, draining queued entries");
                    }
                    while let Some(entry) = queue.pop().await {
                        commit(sink.as_mut(), &entry, style).await?;
                        committed += 1;
                    }
                    break;
                }

                popped = queue.pop() => match popped {
                    Some(entry) => {
                        commit(sink.as_mut(), &entry, style).await?;
                        committed += 1;
                    }
                    None => {
                        debug!("All producers dropped, committer stopping");
                        break;
                    }
                },
            }
        }

        sink.flush().await?;
        info!(committed, "Committer stopped");
        Ok(committed)
    }
}

/// Render and write a single entry.
pub async fn commit(
    sink: &mut dyn LogSink,
    entry: &LogEntry,
    style: Style,
) -> Result<(), DaemonError> {
    let line = format_entry(entry, style);
    sink.write_line(line.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SESSION_BANNER, Severity};
    use crate::port::SinkKind;
    use crate::queue::ingest_queue;
    use crate::test_support::MemorySink;
    use std::time::Duration;

    #[tokio::test]
    async fn commits_in_queue_order() {
        let (tx, rx) = ingest_queue();
        let sink = MemorySink::new(SinkKind::File);
        let committer = Committer::new(rx, Box::new(sink.clone()), Style::Plain);

        tx.push(LogEntry::session_header()).unwrap();
        tx.push(LogEntry::new(Severity::Info, "first")).unwrap();
        tx.push(LogEntry::new(Severity::Error, "second")).unwrap();
        drop(tx);

        let committed = committer.run(CancellationToken::new()).await.unwrap();
        assert_eq!(committed, 3);
        assert_eq!(
            sink.contents(),
            format!("{SESSION_BANNER}Info: first\nError: second\n")
        );
    }

    #[tokio::test]
    async fn colored_style_wraps_lines() {
        let (tx, rx) = ingest_queue();
        let sink = MemorySink::new(SinkKind::Console);
        let committer = Committer::new(rx, Box::new(sink.clone()), Style::Colored);

        tx.push(LogEntry::new(Severity::Info, "hello world")).unwrap();
        drop(tx);
        committer.run(CancellationToken::new()).await.unwrap();

        assert_eq!(sink.contents(), "\x1b[0;36mInfo: hello world\x1b[0m\n");
    }

    #[tokio::test]
    async fn shutdown_drains_pending_entries() {
        let (tx, rx) = ingest_queue();
        let sink = MemorySink::new(SinkKind::File);
        let committer = Committer::new(rx, Box::new(sink.clone()), Style::Plain);
        let shutdown = CancellationToken::new();

        for i in 0..10 {
            tx.push(LogEntry::new(Severity::Debug, format!("entry {i}")))
                .unwrap();
        }
        shutdown.cancel();

        let committed = committer.run(shutdown).await.unwrap();
        assert_eq!(committed, 10);
        assert_eq!(sink.lines().len(), 10);
        assert!(tx.push(LogEntry::new(Severity::Info, "late")).is_err());
    }

    #[tokio::test]
    async fn waits_for_entries_while_idle() {
        let (tx, rx) = ingest_queue();
        let sink = MemorySink::new(SinkKind::File);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            Committer::new(rx, Box::new(sink.clone()), Style::Plain).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink.contents().is_empty());

        tx.push(LogEntry::new(Severity::Info, "woke up")).unwrap();
        assert!(sink.wait_for_lines(1, Duration::from_secs(5)).await);

        shutdown.cancel();
        assert_eq!(handle.await.unwrap().unwrap(), 1);
        assert_eq!(sink.contents(), "Info: woke up\n");
    }

    #[tokio::test]
    async fn sink_failure_stops_the_committer() {
        let (tx, rx) = ingest_queue();
        let sink = MemorySink::new(SinkKind::File);
        sink.set_should_fail(true);
        let committer = Committer::new(rx, Box::new(sink.clone()), Style::Plain);

        tx.push(LogEntry::new(Severity::Error, "never written")).unwrap();
        let result = committer.run(CancellationToken::new()).await;

        assert!(matches!(result, Err(DaemonError::SinkWrite(_))));
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn committing_twice_writes_identical_bytes() {
        let mut sink = MemorySink::new(SinkKind::Console);
        let entry = LogEntry::new(Severity::Debug, "twice");

        commit(&mut sink, &entry, Style::Colored).await.unwrap();
        commit(&mut sink, &entry, Style::Colored).await.unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }
}
