use super::command::{Command, HELP, PlateArg};
use crate::application::parking::Parking;
use crate::domain::ports::TriggerRef;
use crate::domain::vehicle::Vehicle;
use crate::error::{ParkingError, Result};
use crate::interfaces::csv::transaction_writer::TransactionWriter;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const PLATE_ATTEMPTS: usize = 100;

/// Line-driven menu over a parking.
///
/// Reads one command per line until `exit` or end of input. A failing command
/// prints `Error: ...` and the session carries on.
pub struct MenuSession<'a, W: Write> {
    parking: &'a Parking,
    out: W,
}

impl<'a, W: Write> MenuSession<'a, W> {
    pub fn new(parking: &'a Parking, out: W) -> Self {
        Self { parking, out }
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(Command::Exit) => break,
                Ok(command) => {
                    debug!(?command, "Menu command");
                    if let Err(e) = self.execute(command).await {
                        writeln!(self.out, "Error: {e}")?;
                    }
                }
                Err(e) => writeln!(self.out, "Error: {e}")?,
            }
        }
        self.out.flush()?;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        let parking = self.parking;
        match command {
            Command::Balance => {
                writeln!(self.out, "Parking balance: {}", parking.balance().await)?;
            }
            Command::FreePlaces => {
                let status = parking.status().await;
                writeln!(
                    self.out,
                    "Free places: {} of {}",
                    status.free_places, status.capacity
                )?;
            }
            Command::Add {
                plate,
                vehicle_type,
                balance,
            } => {
                let id = match plate {
                    PlateArg::Given(id) => id,
                    PlateArg::Auto => self.free_plate().await?,
                };
                let vehicle = Vehicle::new(id, vehicle_type, balance)?;
                let id = vehicle.id().to_string();
                parking.add_vehicle(vehicle).await?;
                writeln!(self.out, "Vehicle {id} added")?;
            }
            Command::Remove { id } => {
                let vehicle = parking.remove_vehicle(&id).await?;
                writeln!(
                    self.out,
                    "Vehicle {} removed with balance {}",
                    vehicle.id(),
                    vehicle.balance()
                )?;
            }
            Command::TopUp { id, amount } => {
                let balance = parking.top_up_vehicle(&id, amount).await?;
                writeln!(self.out, "Vehicle {id} balance: {balance}")?;
            }
            Command::List { json } => {
                let vehicles = parking.vehicles().await;
                if json {
                    writeln!(self.out, "{}", serde_json::to_string_pretty(&vehicles)?)?;
                } else if vehicles.is_empty() {
                    writeln!(self.out, "Parking is empty")?;
                } else {
                    for vehicle in &vehicles {
                        writeln!(
                            self.out,
                            "ID: {}, Type: {}, Balance: {}",
                            vehicle.id(),
                            vehicle.vehicle_type(),
                            vehicle.balance()
                        )?;
                    }
                }
            }
            Command::Transactions => {
                let transactions = parking.transactions().await;
                if transactions.is_empty() {
                    writeln!(self.out, "No transactions yet")?;
                } else {
                    TransactionWriter::new(&mut self.out).write_transactions(&transactions)?;
                }
            }
            Command::ReadLog => {
                let log = parking.read_log().await?;
                write!(self.out, "{log}")?;
            }
            Command::Timers => {
                self.print_trigger("Billing timer", parking.billing_trigger())?;
                self.print_trigger("Status timer", parking.status_trigger())?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Exit => {}
        }
        Ok(())
    }

    fn print_trigger(&mut self, label: &str, trigger: &TriggerRef) -> Result<()> {
        writeln!(
            self.out,
            "{label}: interval {} ms, active: {}",
            trigger.interval().as_millis(),
            if trigger.is_active() { "yes" } else { "no" }
        )?;
        Ok(())
    }

    /// Picks a random plate that is not parked right now.
    async fn free_plate(&self) -> Result<String> {
        for _ in 0..PLATE_ATTEMPTS {
            let plate = Vehicle::generate_plate_number();
            if !self.parking.contains(&plate).await {
                return Ok(plate);
            }
        }
        Err(ParkingError::Validation(
            "Could not generate a free plate number".to_string(),
        ))
    }
}
