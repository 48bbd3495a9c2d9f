use crate::protocol::DecodeError;
use crate::queue::QueueClosed;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Failed to open sink {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to sink: {0}")]
    SinkWrite(#[source] std::io::Error),

    #[error("Malformed message from {peer}: {source}")]
    Protocol {
        peer: SocketAddr,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to read from {peer}: {source}")]
    Connection {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),

    #[error("Background task failed: {0}")]
    Task(String),
}
