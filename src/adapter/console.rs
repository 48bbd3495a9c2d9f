use crate::error::DaemonError;
use crate::port::{LogSink, SinkKind};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncWriteExt, Stdout};

/// Writes committed lines to the process's standard output.
pub struct ConsoleSink {
    out: Stdout,
}

impl ConsoleSink {
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl LogSink for ConsoleSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn write_line<'a>(
        &'a mut self,
        line: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            self.out
                .write_all(line)
                .await
                .map_err(DaemonError::SinkWrite)?;
            self.out.flush().await.map_err(DaemonError::SinkWrite)
        })
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + '_>> {
        Box::pin(async move { self.out.flush().await.map_err(DaemonError::SinkWrite) })
    }
}
