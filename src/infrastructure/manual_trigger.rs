use crate::domain::ports::{ElapsedHandler, Trigger};
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct ManualState {
    interval: Duration,
    handlers: Vec<ElapsedHandler>,
    active: bool,
    disposed: bool,
}

/// Trigger that only fires when told to.
///
/// Lets tests drive billing and status callbacks deterministically instead of
/// waiting on a clock.
#[derive(Default)]
pub struct ManualTrigger {
    state: Mutex<ManualState>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs every registered handler once, in registration order, if the trigger
    /// is active. Returns how many handlers ran.
    pub async fn fire(&self) -> Result<usize> {
        let handlers = {
            let state = self.state();
            if state.disposed {
                return Err(ParkingError::Disposed("trigger"));
            }
            if !state.active {
                return Ok(0);
            }
            state.handlers.clone()
        };
        for handler in &handlers {
            handler().await;
        }
        Ok(handlers.len())
    }
}

#[async_trait]
impl Trigger for ManualTrigger {
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
        let mut state = self.state();
        if state.disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        state.handlers.push(handler);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state();
        if state.disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        state.active = true;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state();
        if state.disposed {
            return Err(ParkingError::Disposed("trigger"));
        }
        state.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state().active
    }

    async fn dispose(&self) {
        let mut state = self.state();
        state.active = false;
        state.disposed = true;
        state.handlers.clear();
    }
}
