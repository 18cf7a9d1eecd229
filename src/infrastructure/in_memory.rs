use super::timestamped;
use crate::domain::ports::LogSink;
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory log sink.
///
/// Clones share the same buffer, so a test can keep one handle for inspection
/// while the parking owns another.
#[derive(Default, Clone)]
pub struct InMemoryLogSink {
    lines: Arc<RwLock<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryLogSink {
    /// Creates a new, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines written so far, timestamp prefix included.
    pub async fn lines(&self) -> Vec<String> {
        self.lines.read().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSink for InMemoryLogSink {
    async fn write(&self, line: &str) -> Result<()> {
        if self.is_closed() {
            return Err(ParkingError::Disposed("log sink"));
        }
        self.lines.write().await.push(timestamped(line));
        Ok(())
    }

    async fn read(&self) -> Result<String> {
        if self.is_closed() {
            return Err(ParkingError::Disposed("log sink"));
        }
        let lines = self.lines.read().await;
        if lines.is_empty() {
            return Err(ParkingError::ResourceNotFound(PathBuf::from(":memory:")));
        }
        Ok(lines.iter().map(|line| format!("{line}\n")).collect())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
