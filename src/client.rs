//! Client side of the line protocol.
//!
//! Every call opens a fresh connection, writes one `<level>:<message>`
//! payload and closes the write half; the daemon treats EOF as the end of
//! the message and never replies.

use crate::domain::Severity;
use crate::protocol::encode;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to log daemon at {address}: {source}")]
    Connect {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send log message: {0}")]
    Write(#[source] io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct LogClient {
    addr: SocketAddr,
}

impl LogClient {
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Client for a daemon on the loopback interface.
    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn write_log(&self, level: Severity, message: &str) -> Result<(), ClientError> {
        let mut stream =
            TcpStream::connect(self.addr)
                .await
                .map_err(|source| ClientError::Connect {
                    address: self.addr,
                    source,
                })?;
        stream
            .write_all(&encode(level, message))
            .await
            .map_err(ClientError::Write)?;
        stream.shutdown().await.map_err(ClientError::Write)
    }

    pub async fn info(&self, message: &str) -> Result<(), ClientError> {
        self.write_log(Severity::Info, message).await
    }

    pub async fn debug(&self, message: &str) -> Result<(), ClientError> {
        self.write_log(Severity::Debug, message).await
    }

    pub async fn error(&self, message: &str) -> Result<(), ClientError> {
        self.write_log(Severity::Error, message).await
    }
}
