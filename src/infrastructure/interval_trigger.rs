use crate::domain::ports::{ElapsedHandler, Trigger};
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

type Handlers = Arc<Mutex<Vec<ElapsedHandler>>>;

struct RunningTask {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct TriggerState {
    interval: Duration,
    running: Option<RunningTask>,
    disposed: bool,
}

/// Trigger backed by a background tokio task and `tokio::time::interval`.
///
/// The first tick fires one full interval after `start`. Handlers run one after
/// another on the trigger's task; a panicking handler is reported and the next
/// tick proceeds. Interval changes apply from the next `start`.
///
/// `stop` waits for the task to finish, so it must not be awaited from inside
/// one of this trigger's own handlers.
pub struct IntervalTrigger {
    name: &'static str,
    state: Mutex<TriggerState>,
    handlers: Handlers,
}

impl IntervalTrigger {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            state: Mutex::new(TriggerState {
                interval,
                running: None,
                disposed: false,
            }),
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, TriggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn join(&self, task: RunningTask) {
        // The receiver is gone only if the task already ended.
        let _ = task.stop_tx.send(());
        if let Err(e) = task.handle.await {
            warn!(trigger = self.name, "Trigger task ended abnormally: {}", e);
        }
    }
}

async fn run(name: &'static str, period: Duration, handlers: Handlers, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // A stop request wins over a tick that came due while handlers ran.
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {}
        }

        let current: Vec<ElapsedHandler> = handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(trigger = name, handlers = current.len(), "Interval elapsed");
        for handler in current {
            if let Err(e) = tokio::spawn(handler()).await {
                warn!(trigger = name, "Elapsed handler failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl Trigger for IntervalTrigger {
    fn set_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(ParkingError::Validation(
                "Interval must be greater than zero".to_string(),
            ));
        }
        let mut state = self.state();
        if state.disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        state.interval = interval;
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.state().interval
    }

    fn on_elapsed(&self, handler: ElapsedHandler) -> Result<()> {
        if self.state().disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state();
        if state.disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        if state.running.is_some() {
            debug!(trigger = self.name, "Trigger already running");
            return Ok(());
        }
        if state.interval.is_zero() {
            return Err(ParkingError::Validation(
                "Interval must be greater than zero".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ParkingError::Validation("Trigger must be started inside a tokio runtime".to_string())
        })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = runtime.spawn(run(
            self.name,
            state.interval,
            self.handlers.clone(),
            stop_rx,
        ));
        info!(trigger = self.name, interval = ?state.interval, "Trigger started");
        state.running = Some(RunningTask { stop_tx, handle });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let task = {
            let mut state = self.state();
            if state.disposed {
                return Err(ParkingError::Disposed("trigger"));
            }
            state.running.take()
        };
        if let Some(task) = task {
            self.join(task).await;
            info!(trigger = self.name, "Trigger stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state()
            .running
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    async fn dispose(&self) {
        let task = {
            let mut state = self.state();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.running.take()
        };
        if let Some(task) = task {
            self.join(task).await;
        }
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!(trigger = self.name, "Trigger disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ElapsedFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: Arc<AtomicUsize>) -> ElapsedHandler {
        Arc::new(move || -> ElapsedFuture {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_every_interval() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));
        trigger.on_elapsed(counting_handler(counter.clone())).unwrap();
        trigger.start().unwrap();
        assert!(trigger.is_active());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        trigger.stop().await.unwrap();
        assert!(!trigger.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_callbacks_after_stop() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        trigger.on_elapsed(counting_handler(counter.clone())).unwrap();
        trigger.start().unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        trigger.stop().await.unwrap();
        let after_stop = counter.load(Ordering::SeqCst);
        assert_eq!(after_stop, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_slow_handler_starts_no_further_run() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let handler: ElapsedHandler = {
            let started = started.clone();
            let finished = finished.clone();
            Arc::new(move || -> ElapsedFuture {
                let started = started.clone();
                let finished = finished.clone();
                Box::pin(async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                })
            })
        };
        trigger.on_elapsed(handler).unwrap();

        for round in 0..20 {
            started.store(0, Ordering::SeqCst);
            finished.store(0, Ordering::SeqCst);
            trigger.start().unwrap();

            // The first run is still sleeping when the stop arrives, and the next
            // tick is already due by the time it returns.
            tokio::time::sleep(Duration::from_millis(1_500)).await;
            trigger.stop().await.unwrap();

            assert_eq!(started.load(Ordering::SeqCst), 1, "round {round}");
            assert_eq!(finished.load(Ordering::SeqCst), 1, "round {round}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_is_noop() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        trigger.on_elapsed(counting_handler(counter.clone())).unwrap();
        trigger.start().unwrap();
        trigger.start().unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        // A second task would have doubled the count.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        trigger.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_handler_does_not_kill_trigger() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        trigger
            .on_elapsed(Arc::new(|| -> ElapsedFuture { Box::pin(async { panic!("boom") }) }))
            .unwrap();
        trigger.on_elapsed(counting_handler(counter.clone())).unwrap();
        trigger.start().unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(trigger.is_active());
        trigger.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_disposed_trigger_rejects_operations() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        trigger.start().unwrap();
        trigger.dispose().await;
        trigger.dispose().await;

        assert!(!trigger.is_active());
        assert!(matches!(trigger.start(), Err(ParkingError::Disposed(_))));
        assert!(matches!(trigger.stop().await, Err(ParkingError::Disposed(_))));
        assert!(matches!(
            trigger.set_interval(Duration::from_secs(2)),
            Err(ParkingError::Disposed(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let trigger = IntervalTrigger::new("test", Duration::from_secs(1));
        assert!(matches!(
            trigger.set_interval(Duration::ZERO),
            Err(ParkingError::Validation(_))
        ));
        assert_eq!(trigger.interval(), Duration::from_secs(1));
    }
}
