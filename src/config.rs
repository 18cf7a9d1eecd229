use crate::error::{ParkingError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_BILLING_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOG_PATH: &str = "Transactions.log";

const MILLIS_PER_SEC: u64 = 1000;

/// Runtime settings for a parking instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub capacity: usize,
    pub billing_interval_secs: u64,
    pub status_interval_secs: u64,
    pub log_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            billing_interval_secs: DEFAULT_BILLING_INTERVAL_SECS,
            status_interval_secs: DEFAULT_STATUS_INTERVAL_SECS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ParkingError::Validation(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        interval_from_secs(self.billing_interval_secs)?;
        interval_from_secs(self.status_interval_secs)?;
        Ok(())
    }

    pub fn billing_interval(&self) -> Result<Duration> {
        interval_from_secs(self.billing_interval_secs)
    }

    pub fn status_interval(&self) -> Result<Duration> {
        interval_from_secs(self.status_interval_secs)
    }
}

/// Converts a configured period in whole seconds into a trigger interval.
pub fn interval_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(ParkingError::Validation(
            "Interval must be greater than zero".to_string(),
        ));
    }
    let millis = secs.checked_mul(MILLIS_PER_SEC).ok_or_else(|| {
        ParkingError::Validation(format!("Interval of {secs}s is too large"))
    })?;
    Ok(Duration::from_millis(millis))
}
