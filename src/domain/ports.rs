use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Append-only text sink for the parking's transaction log.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Appends one line, prefixed with the current timestamp.
    async fn write(&self, line: &str) -> Result<()>;
    /// Returns everything written so far. Fails with `ResourceNotFound` if nothing exists yet.
    async fn read(&self) -> Result<String>;
    /// Releases the sink. Calling it more than once is harmless.
    async fn close(&self) -> Result<()>;
}

pub type LogSinkBox = Box<dyn LogSink>;

pub type ElapsedFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked every time a trigger's interval elapses.
pub type ElapsedHandler = Arc<dyn Fn() -> ElapsedFuture + Send + Sync>;

/// Periodic callback source.
///
/// `start` while already active is a no-op. Once `stop` returns, no handler is
/// running and none will start until the trigger is started again. After
/// `dispose` every operation except `is_active`, `interval` and `dispose` fails
/// with `Disposed`.
#[async_trait]
pub trait Trigger: Send + Sync {
    fn set_interval(&self, interval: Duration) -> Result<()>;
    fn interval(&self) -> Duration;
    fn on_elapsed(&self, handler: ElapsedHandler) -> Result<()>;
    fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    fn is_active(&self) -> bool;
    async fn dispose(&self);
}

pub type TriggerRef = Arc<dyn Trigger>;
