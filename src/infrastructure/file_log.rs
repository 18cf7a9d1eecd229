use super::timestamped;
use crate::domain::ports::LogSink;
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Log sink backed by an append-only text file.
///
/// The file is opened in append mode for each write and created on first use,
/// so no handle is kept between calls and no lock is needed.
pub struct FileLogSink {
    path: PathBuf,
    closed: AtomicBool,
}

impl FileLogSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ParkingError::Disposed("log sink"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn write(&self, line: &str) -> Result<()> {
        self.ensure_open()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let entry = format!("{}\n", timestamped(line));
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read(&self) -> Result<String> {
        self.ensure_open()?;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ParkingError::ResourceNotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
