pub mod console;
pub mod file;

pub use console::ConsoleSink;
pub use file::FileSink;

use crate::config::SinkTarget;
use crate::error::DaemonError;
use crate::port::LogSink;
use tracing::info;

/// Open the sink selected on the command line.
pub async fn open_sink(target: &SinkTarget) -> Result<Box<dyn LogSink>, DaemonError> {
    match target {
        SinkTarget::Stdout => Ok(Box::new(ConsoleSink::stdout())),
        SinkTarget::File(path) => {
            let sink = FileSink::open(path).await?;
            info!(path = %sink.path().display(), "Appending to file sink");
            Ok(Box::new(sink))
        }
    }
}
