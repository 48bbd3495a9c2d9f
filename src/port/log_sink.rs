use crate::error::DaemonError;
use std::future::Future;
use std::pin::Pin;

/// Where committed lines end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    File,
}

/// Destination for committed log lines.
///
/// A sink is owned by the committer alone; implementations need no internal
/// locking. The trait is dyn-compatible by returning boxed futures.
pub trait LogSink: Send {
    fn kind(&self) -> SinkKind;

    /// Write one fully formatted line.
    fn write_line<'a>(
        &'a mut self,
        line: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>>;

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + '_>>;
}
