//! TCP accept loop.
//!
//! Each connection carries one `<level>:<message>` entry terminated by the
//! peer closing its side. Decoded entries are pushed onto the ingest queue;
//! the listener never touches the sink.

use crate::config::{ConnectionMode, ProtocolPolicy, Settings};
use crate::domain::LogEntry;
use crate::error::DaemonError;
use crate::protocol::{DecodeError, LineDecoder};
use crate::queue::QueueSender;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

/// Pending-connection backlog passed to `listen(2)`.
pub const LISTEN_BACKLOG: u32 = 1024;

/// Size of a single socket read.
const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    pub policy: ProtocolPolicy,
    pub mode: ConnectionMode,
    pub read_timeout: Option<Duration>,
    pub max_prefix_len: usize,
}

impl From<&Settings> for ListenerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            policy: settings.policy,
            mode: settings.connection_mode,
            read_timeout: settings.read_timeout(),
            max_prefix_len: settings.max_prefix_len,
        }
    }
}

pub struct Listener {
    listener: TcpListener,
    queue: QueueSender,
    options: ListenerOptions,
}

impl Listener {
    /// Bind `0.0.0.0:<port>` with address reuse so a restarted daemon can
    /// rebind immediately.
    pub async fn bind(
        port: u16,
        queue: QueueSender,
        options: ListenerOptions,
    ) -> Result<Self, DaemonError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let bind_error = |source: io::Error| DaemonError::Bind {
            address: addr.to_string(),
            source,
        };

        let socket = TcpSocket::new_v4().map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket.set_reuseport(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(LISTEN_BACKLOG).map_err(bind_error)?;

        Ok(Self {
            listener,
            queue,
            options,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Accept failures are always fatal. Failed connections are fatal under
    /// [`ProtocolPolicy::Strict`] and dropped under
    /// [`ProtocolPolicy::Isolate`]. A closed queue always ends the loop.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DaemonError> {
        let mut readers: JoinSet<(SocketAddr, Result<(), DaemonError>)> = JoinSet::new();

        let address = self.local_addr().map_err(DaemonError::Accept)?;
        info!(
            %address,
            policy = ?self.options.policy,
            mode = ?self.options.mode,
            "Listening for log connections"
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    if self.queue.is_empty() {
                        info!("Listener shutting down");
                    } else {
                        info!(queued = self.queue.len(), "Listener shutting down");
                    }
                    break;
                }

                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(|e| {
                        error!(error = %e, "Failed to accept connection");
                        DaemonError::Accept(e)
                    })?;
                    debug!(%peer, "Accepted connection");

                    match self.options.mode {
                        ConnectionMode::Sequential => {
                            let outcome = tokio::select! {
                                () = shutdown.cancelled() => {
                                    info!(%peer, "Listener shutting down, abandoning connection in progress");
                                    break;
                                }
                                outcome = receive(stream, peer, self.options, &self.queue) => outcome,
                            };
                            self.dispatch(peer, outcome)?;
                        }
                        ConnectionMode::Concurrent => {
                            let options = self.options;
                            let queue = self.queue.clone();
                            readers.spawn(
                                async move { (peer, receive(stream, peer, options, &queue).await) }
                                    .in_current_span(),
                            );
                        }
                    }
                }

                Some(joined) = readers.join_next(), if !readers.is_empty() => {
                    let (peer, outcome) = joined.map_err(|e| DaemonError::Task(e.to_string()))?;
                    self.dispatch(peer, outcome)?;
                }
            }
        }

        // Readers that already queued their entry are done; the rest are
        // mid-read and get abandoned.
        readers.shutdown().await;
        Ok(())
    }

    fn dispatch(&self, peer: SocketAddr, outcome: Result<(), DaemonError>) -> Result<(), DaemonError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(e @ DaemonError::QueueClosed(_)) => Err(e),
            Err(e) => match self.options.policy {
                ProtocolPolicy::Strict => {
                    error!(%peer, error = %e, "Rejected connection, terminating (strict policy)");
                    Err(e)
                }
                ProtocolPolicy::Isolate => {
                    warn!(%peer, error = %e, "Dropped connection");
                    Ok(())
                }
            },
        }
    }
}

enum ReadFailure {
    Io(io::Error),
    Decode(DecodeError),
}

impl From<io::Error> for ReadFailure {
    fn from(e: io::Error) -> Self {
        ReadFailure::Io(e)
    }
}

impl From<DecodeError> for ReadFailure {
    fn from(e: DecodeError) -> Self {
        ReadFailure::Decode(e)
    }
}

/// Read one connection and queue its entry.
async fn receive(
    stream: TcpStream,
    peer: SocketAddr,
    options: ListenerOptions,
    queue: &QueueSender,
) -> Result<(), DaemonError> {
    let entry = read_connection(stream, peer, options).await?;
    let (level, bytes) = (entry.level, entry.message.len());
    queue.push(entry)?;
    debug!(%peer, %level, bytes, queued = queue.len(), "Received log entry");
    Ok(())
}

async fn read_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    options: ListenerOptions,
) -> Result<LogEntry, DaemonError> {
    let read = read_entry(&mut stream, options.max_prefix_len);
    let outcome = match options.read_timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ReadFailure::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no end of message within {}ms", limit.as_millis()),
            ))),
        },
        None => read.await,
    };

    outcome.map_err(|failure| match failure {
        ReadFailure::Io(source) => DaemonError::Connection { peer, source },
        ReadFailure::Decode(source) => DaemonError::Protocol { peer, source },
    })
}

/// Read a stream to EOF and decode it as a single entry.
async fn read_entry<R>(reader: &mut R, max_prefix_len: usize) -> Result<LogEntry, ReadFailure>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = LineDecoder::new(max_prefix_len);
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        decoder.feed(&buf[..n])?;
    }
    Ok(decoder.finish()?)
}
