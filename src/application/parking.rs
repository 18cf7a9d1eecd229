use crate::config::Settings;
use crate::domain::ports::{ElapsedFuture, ElapsedHandler, LogSinkBox, TriggerRef};
use crate::domain::tariff::Tariff;
use crate::domain::transaction::{TransactionKind, TransactionRecord};
use crate::domain::vehicle::{Amount, Balance, Vehicle};
use crate::error::{ParkingError, Result};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

#[derive(Default)]
struct ParkingState {
    /// Insertion order doubles as billing order.
    vehicles: Vec<Vehicle>,
    balance: Balance,
    transactions: Vec<TransactionRecord>,
}

impl ParkingState {
    fn position(&self, id: &str) -> Option<usize> {
        self.vehicles.iter().position(|v| v.id() == id)
    }
}

/// Outcome of one billing sweep.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepReport {
    pub charged: usize,
    pub skipped: usize,
    pub collected: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub balance: Balance,
    pub capacity: usize,
    pub free_places: usize,
}

/// The parking registry and billing core.
///
/// `Parking` owns the parked vehicles, the aggregate balance and the transaction
/// history. Every read and write of that state goes through one mutex, including
/// the billing sweep and the status snapshot fired by the two triggers, so a
/// sweep never interleaves with client operations.
///
/// Triggers are shared with the caller. Their handlers hold a weak reference to
/// the parking and become no-ops once it is dropped.
pub struct Parking {
    capacity: usize,
    tariff: Tariff,
    billing_interval: Duration,
    status_interval: Duration,
    log: LogSinkBox,
    billing_trigger: TriggerRef,
    status_trigger: TriggerRef,
    state: Mutex<ParkingState>,
    shut_down: AtomicBool,
    closed: OnceCell<()>,
}

impl Parking {
    /// Creates a parking, binds the billing and status callbacks to the given
    /// triggers and starts both.
    pub async fn open(
        settings: &Settings,
        tariff: Tariff,
        log: LogSinkBox,
        billing_trigger: TriggerRef,
        status_trigger: TriggerRef,
    ) -> Result<Arc<Self>> {
        settings.validate()?;
        let billing_interval = settings.billing_interval()?;
        let status_interval = settings.status_interval()?;

        let parking = Arc::new(Self {
            capacity: settings.capacity,
            tariff,
            billing_interval,
            status_interval,
            log,
            billing_trigger,
            status_trigger,
            state: Mutex::new(ParkingState::default()),
            shut_down: AtomicBool::new(false),
            closed: OnceCell::new(),
        });

        let weak = Arc::downgrade(&parking);
        parking.billing_trigger.set_interval(billing_interval)?;
        parking.billing_trigger.on_elapsed(billing_handler(weak.clone()))?;
        parking.status_trigger.set_interval(status_interval)?;
        parking.status_trigger.on_elapsed(status_handler(weak))?;
        parking.billing_trigger.start()?;
        parking.status_trigger.start()?;

        parking
            .record(format!(
                "[Parking] Timers initialised | Billing every {}s | Status every {}s",
                billing_interval.as_secs(),
                status_interval.as_secs()
            ))
            .await;
        info!(capacity = parking.capacity, "Parking opened");
        Ok(parking)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn billing_interval(&self) -> Duration {
        self.billing_interval
    }

    pub fn status_interval(&self) -> Duration {
        self.status_interval
    }

    pub fn billing_trigger(&self) -> &TriggerRef {
        &self.billing_trigger
    }

    pub fn status_trigger(&self) -> &TriggerRef {
        &self.status_trigger
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_shut_down() {
            Err(ParkingError::Disposed("parking"))
        } else {
            Ok(())
        }
    }

    /// Writes a line to the transaction log. A failing sink is reported but never
    /// undoes the change the line describes.
    async fn record(&self, line: String) {
        if let Err(e) = self.log.write(&line).await {
            warn!("Failed to write transaction log: {}", e);
        }
    }

    /// Aggregate of every fee and penalty collected so far.
    pub async fn balance(&self) -> Balance {
        self.state.lock().await.balance
    }

    pub async fn free_places(&self) -> usize {
        self.capacity - self.state.lock().await.vehicles.len()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.lock().await.position(id).is_some()
    }

    /// Copies of the parked vehicles in arrival order.
    pub async fn vehicles(&self) -> Vec<Vehicle> {
        self.state.lock().await.vehicles.clone()
    }

    /// Copy of the full transaction history in the order it was recorded.
    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().await.transactions.clone()
    }

    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state.lock().await;
        StatusSnapshot {
            balance: state.balance,
            capacity: self.capacity,
            free_places: self.capacity - state.vehicles.len(),
        }
    }

    pub async fn read_log(&self) -> Result<String> {
        self.log.read().await
    }

    pub async fn add_vehicle(&self, vehicle: Vehicle) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;

        if state.vehicles.len() >= self.capacity {
            self.record(format!(
                "[Parking] Add failed | Vehicle {} | Reason: parking is full",
                vehicle.id()
            ))
            .await;
            return Err(ParkingError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if state.position(vehicle.id()).is_some() {
            self.record(format!(
                "[Parking] Add failed | Vehicle {} | Reason: duplicate ID",
                vehicle.id()
            ))
            .await;
            return Err(ParkingError::DuplicateId(vehicle.id().to_string()));
        }

        self.record(format!(
            "[Parking] Vehicle added | ID: {} | Type: {} | Balance: {}",
            vehicle.id(),
            vehicle.vehicle_type(),
            vehicle.balance()
        ))
        .await;
        info!(vehicle = vehicle.id(), "Vehicle added");
        state.vehicles.push(vehicle);
        Ok(())
    }

    /// Removes a vehicle. A vehicle in debt cannot leave.
    pub async fn remove_vehicle(&self, id: &str) -> Result<Vehicle> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;

        let Some(index) = state.position(id) else {
            self.record(format!(
                "[Parking] Remove failed | Vehicle {id} | Reason: not found"
            ))
            .await;
            return Err(ParkingError::NotFound(id.to_string()));
        };

        let balance = state.vehicles[index].balance();
        if balance.is_negative() {
            self.record(format!(
                "[Parking] Remove failed | Vehicle {id} | Reason: negative balance ({balance})"
            ))
            .await;
            return Err(ParkingError::NegativeBalance {
                id: id.to_string(),
                balance: balance.value(),
            });
        }

        let vehicle = state.vehicles.remove(index);
        self.record(format!(
            "[Parking] Vehicle removed | ID: {} | Type: {} | Final balance: {}",
            vehicle.id(),
            vehicle.vehicle_type(),
            vehicle.balance()
        ))
        .await;
        info!(vehicle = vehicle.id(), "Vehicle removed");
        Ok(vehicle)
    }

    /// Credits a parked vehicle and returns its new balance.
    pub async fn top_up_vehicle(&self, id: &str, amount: Decimal) -> Result<Balance> {
        let amount = match Amount::new(amount) {
            Ok(amount) => amount,
            Err(e) => {
                self.record(format!(
                    "[Parking] Top-up failed | Vehicle {id} | Reason: invalid amount ({amount})"
                ))
                .await;
                return Err(e);
            }
        };

        let mut guard = self.state.lock().await;
        self.ensure_open()?;
        let state = &mut *guard;

        let Some(index) = state.position(id) else {
            self.record(format!(
                "[Parking] Top-up failed | Vehicle {id} | Reason: not found"
            ))
            .await;
            return Err(ParkingError::NotFound(id.to_string()));
        };

        let vehicle = &mut state.vehicles[index];
        let before = vehicle.balance();
        vehicle.credit(amount.value())?;
        let after = vehicle.balance();
        state.transactions.push(TransactionRecord::new(
            vehicle.id(),
            vehicle.vehicle_type(),
            TransactionKind::TopUp,
            amount.value(),
        ));

        self.record(format!(
            "[Transaction] Top-up | Vehicle: {} | Sum: {} | Type: {} | Current balance: {}",
            vehicle.id(),
            amount.value().normalize(),
            vehicle.vehicle_type(),
            after
        ))
        .await;
        self.record(format!(
            "[Parking] Balance updated | ID: {} | Was: {} | Top-up: +{} | Now: {}",
            vehicle.id(),
            before,
            amount.value().normalize(),
            after
        ))
        .await;
        Ok(after)
    }

    /// Bills every parked vehicle once.
    ///
    /// A vehicle whose balance covers its fee pays the fee. Otherwise it pays the
    /// fee plus the penalty on the shortfall and its balance goes negative. The
    /// whole pass runs under a single lock acquisition. A vehicle that cannot be
    /// priced is logged and skipped; the rest of the batch still runs.
    pub async fn charge_vehicles(&self) -> SweepReport {
        let mut guard = self.state.lock().await;
        let mut report = SweepReport::default();
        if self.is_shut_down() {
            return report;
        }
        let state = &mut *guard;

        self.record(format!(
            "[Parking] Billing started | Vehicles: {}",
            state.vehicles.len()
        ))
        .await;

        for vehicle in state.vehicles.iter_mut() {
            let charge = match self
                .tariff
                .charge_for(vehicle.vehicle_type(), vehicle.balance().value())
            {
                Ok(charge) => charge,
                Err(e) => {
                    report.skipped += 1;
                    warn!(vehicle = vehicle.id(), "Skipping vehicle during billing: {}", e);
                    self.record(format!(
                        "[Parking] Billing skipped | Vehicle {} | Reason: {}",
                        vehicle.id(),
                        e
                    ))
                    .await;
                    continue;
                }
            };

            let total = charge.total();
            if let Err(e) = vehicle.debit(total) {
                report.skipped += 1;
                warn!(vehicle = vehicle.id(), "Skipping vehicle during billing: {}", e);
                continue;
            }
            state.balance += Balance::new(total);
            report.charged += 1;
            report.collected += Balance::new(total);

            let (kind, label) = if charge.is_penalised() {
                (TransactionKind::PenaltyCharge, "Charge with penalty")
            } else {
                (TransactionKind::Charge, "Charge")
            };
            state.transactions.push(TransactionRecord::new(
                vehicle.id(),
                vehicle.vehicle_type(),
                kind,
                total,
            ));
            self.record(format!(
                "[Transaction] {} | Vehicle: {} | Sum: {} | Type: {} | Current balance: {}",
                label,
                vehicle.id(),
                total.normalize(),
                vehicle.vehicle_type(),
                vehicle.balance()
            ))
            .await;
        }

        self.record(format!(
            "[Parking] Billing finished | Processed: {} | Parking balance: {}",
            report.charged, state.balance
        ))
        .await;
        debug!(
            charged = report.charged,
            skipped = report.skipped,
            "Billing sweep complete"
        );
        report
    }

    /// Writes the current balance and free places to the transaction log.
    pub async fn log_status(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.ensure_open()?;
        let line = format!(
            "[Parking] Status | Balance: {} | Free places: {}",
            state.balance,
            self.capacity - state.vehicles.len()
        );
        self.log.write(&line).await
    }

    /// Stops both triggers, closes the log and clears all state.
    ///
    /// Only the first call does the work; concurrent callers wait until it is
    /// done. Operations that mutate the parking fail with `Disposed` afterwards.
    pub async fn shutdown(&self) {
        self.closed.get_or_init(|| self.close()).await;
    }

    async fn close(&self) {
        self.shut_down.store(true, Ordering::SeqCst);

        // The registry lock is not held here: an in-flight sweep needs it to finish.
        for trigger in [&self.billing_trigger, &self.status_trigger] {
            if let Err(e) = trigger.stop().await {
                warn!("Failed to stop trigger: {}", e);
            }
        }
        if let Err(e) = self.log.close().await {
            warn!("Failed to close transaction log: {}", e);
        }

        let mut state = self.state.lock().await;
        *state = ParkingState::default();
        info!("Parking shut down");
    }
}

fn billing_handler(parking: Weak<Parking>) -> ElapsedHandler {
    Arc::new(move || -> ElapsedFuture {
        let parking = parking.clone();
        Box::pin(async move {
            if let Some(parking) = parking.upgrade() {
                parking.charge_vehicles().await;
            }
        })
    })
}

fn status_handler(parking: Weak<Parking>) -> ElapsedHandler {
    Arc::new(move || -> ElapsedFuture {
        let parking = parking.clone();
        Box::pin(async move {
            if let Some(parking) = parking.upgrade()
                && let Err(e) = parking.log_status().await
            {
                warn!("Failed to log parking status: {}", e);
            }
        })
    })
}
