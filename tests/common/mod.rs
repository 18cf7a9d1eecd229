#![allow(dead_code)]

use async_trait::async_trait;
use parking_billing::application::parking::Parking;
use parking_billing::config::Settings;
use parking_billing::domain::ports::LogSink;
use parking_billing::domain::tariff::Tariff;
use parking_billing::error::{ParkingError, Result};
use parking_billing::infrastructure::in_memory::InMemoryLogSink;
use parking_billing::infrastructure::manual_trigger::ManualTrigger;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct TestParking {
    pub parking: Arc<Parking>,
    pub log: InMemoryLogSink,
    pub billing: Arc<ManualTrigger>,
    pub status: Arc<ManualTrigger>,
}

pub fn settings(capacity: usize) -> Settings {
    Settings {
        capacity,
        ..Settings::default()
    }
}

pub async fn open_parking(capacity: usize) -> TestParking {
    let log = InMemoryLogSink::new();
    let billing = Arc::new(ManualTrigger::new());
    let status = Arc::new(ManualTrigger::new());
    let parking = Parking::open(
        &settings(capacity),
        Tariff::default(),
        Box::new(log.clone()),
        billing.clone(),
        status.clone(),
    )
    .await
    .expect("Failed to open parking");
    TestParking {
        parking,
        log,
        billing,
        status,
    }
}

/// Log sink whose writes always fail. Counts the attempts.
#[derive(Default, Clone)]
pub struct FailingLogSink {
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl LogSink for FailingLogSink {
    async fn write(&self, _line: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ParkingError::Io(std::io::Error::other("disk full")))
    }

    async fn read(&self) -> Result<String> {
        Err(ParkingError::Io(std::io::Error::other("disk full")))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
