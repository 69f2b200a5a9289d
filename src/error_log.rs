//! Best-effort error log
//!
//! Failed requests are reported to an [`ErrorLog`] before the caller's
//! handle settles. Writes are fire-and-forget: a failing sink is reported
//! through `tracing` and otherwise ignored.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{error, warn};

/// Append-only sink for request failures
#[async_trait]
pub trait ErrorLog: Send + Sync {
    /// Append one message. Returns once the message is persisted or the
    /// attempt has failed.
    async fn append(&self, message: &str);
}

/// Appends each message as one line to a file
#[derive(Debug, Clone)]
pub struct FileErrorLog {
    path: PathBuf,
}

impl FileErrorLog {
    /// Create a log writing to `path`; the file is created on first write
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&self, message: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{message}\n").as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl ErrorLog for FileErrorLog {
    async fn append(&self, message: &str) {
        if let Err(e) = self.write_line(message).await {
            warn!("Failed to write error log {}: {}", self.path.display(), e);
        }
    }
}

/// Emits each message as a `tracing` error event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

#[async_trait]
impl ErrorLog for TracingErrorLog {
    async fn append(&self, message: &str) {
        error!("{message}");
    }
}
