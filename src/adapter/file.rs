//! Append-only file sink.
//!
//! The file is opened with `O_APPEND | O_CREAT` so several daemon runs
//! accumulate in one file, each starting with its own session banner.
//! A new file gets the default creation mode filtered by the umask, so other
//! processes sharing the log can read it.

use crate::error::DaemonError;
use crate::port::{LogSink, SinkKind};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    pub async fn open(path: &Path) -> Result<Self, DaemonError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| DaemonError::SinkOpen {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "Opened file sink");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn write_line<'a>(
        &'a mut self,
        line: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + 'a>> {
        Box::pin(async move {
            self.file
                .write_all(line)
                .await
                .map_err(DaemonError::SinkWrite)?;
            self.file.flush().await.map_err(DaemonError::SinkWrite)
        })
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<(), DaemonError>> + Send + '_>> {
        Box::pin(async move {
            self.file.flush().await.map_err(DaemonError::SinkWrite)?;
            self.file.sync_data().await.map_err(DaemonError::SinkWrite)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.log");

        let mut sink = FileSink::open(&path).await.unwrap();
        sink.write_line(b"Info: created\n").await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(sink.kind(), SinkKind::File);
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Info: created\n");
    }

    #[tokio::test]
    async fn appends_to_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut sink = FileSink::open(&path).await.unwrap();
        sink.write_line(b"Error: disk full\n").await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "previous run\nError: disk full\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn new_file_uses_default_creation_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let reference = temp_dir.path().join("reference.log");
        std::fs::File::create(&reference).unwrap();
        let path = temp_dir.path().join("out.log");

        FileSink::open(&path).await.unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&reference));
    }

    #[tokio::test]
    async fn unwritable_path_reports_sink_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("out.log");

        let result = FileSink::open(&path).await;
        assert!(matches!(result, Err(DaemonError::SinkOpen { .. })));
    }
}
