use super::committer::Committer;
use super::listener::{Listener, ListenerOptions};
use crate::config::Settings;
use crate::domain::LogEntry;
use crate::error::DaemonError;
use crate::port::LogSink;
use crate::queue::ingest_queue;
use std::io;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info};

/// A bound, ready-to-run daemon: listener, committer and the queue between
/// them.
pub struct Daemon {
    listener: Listener,
    committer: Committer,
}

impl Daemon {
    /// Run the startup sequence up to, but not including, the accept loop.
    ///
    /// The socket is bound and the session banner is already queued when
    /// this returns, so clients may connect before [`Daemon::run`] starts.
    pub async fn bind(settings: &Settings, sink: Box<dyn LogSink>) -> Result<Self, DaemonError> {
        settings.validate()?;
        let style = settings.style_for(sink.kind());
        let (queue_tx, queue_rx) = ingest_queue();

        let listener =
            Listener::bind(settings.port, queue_tx.clone(), ListenerOptions::from(settings))
                .await?;
        queue_tx.push(LogEntry::session_header())?;
        let committer = Committer::new(queue_rx, sink, style);

        Ok(Self {
            listener,
            committer,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Start the committer in the background and run the listener until
    /// `shutdown` is cancelled or either side fails.
    ///
    /// When the listener stops, entries it already queued are committed
    /// before this returns.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DaemonError> {
        // Separate from `shutdown`: the committer must outlive the listener's
        // last push.
        let committer_shutdown = CancellationToken::new();
        let mut committer = tokio::spawn(
            self.committer
                .run(committer_shutdown.clone())
                .in_current_span(),
        );

        let listener_result = tokio::select! {
            result = self.listener.run(shutdown) => result,
            joined = &mut committer => {
                let err = match joined {
                    Ok(Ok(committed)) => DaemonError::Task(format!(
                        "committer stopped unexpectedly after {committed} entries"
                    )),
                    Ok(Err(e)) => e,
                    Err(e) => DaemonError::Task(e.to_string()),
                };
                error!(error = %err, "Committer failed");
                return Err(err);
            }
        };

        committer_shutdown.cancel();
        let committed = committer
            .await
            .map_err(|e| DaemonError::Task(e.to_string()))?;

        listener_result?;
        let committed = committed?;
        info!(committed, "Daemon stopped");
        Ok(())
    }
}
