use crate::error::{ParkingError, Result};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::str::FromStr;

/// Signed money held by a vehicle or collected by the parking.
///
/// Only grows or shrinks through [`Amount`]s, so a charge can push it below zero
/// but never by a non-positive step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A credit or debit step; always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ParkingError::Validation(format!(
                "Amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum VehicleType {
    PassengerCar,
    Truck,
    Bus,
    Motorcycle,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::PassengerCar,
        VehicleType::Truck,
        VehicleType::Bus,
        VehicleType::Motorcycle,
    ];
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleType::PassengerCar => "PassengerCar",
            VehicleType::Truck => "Truck",
            VehicleType::Bus => "Bus",
            VehicleType::Motorcycle => "Motorcycle",
        };
        f.write_str(name)
    }
}

impl FromStr for VehicleType {
    type Err = ParkingError;

    /// Accepts type names in any case, a few short aliases and the menu digits 1-4.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "car" | "passengercar" | "passenger-car" | "passenger_car" => {
                Ok(VehicleType::PassengerCar)
            }
            "2" | "truck" => Ok(VehicleType::Truck),
            "3" | "bus" => Ok(VehicleType::Bus),
            "4" | "motorcycle" | "moto" => Ok(VehicleType::Motorcycle),
            other => Err(ParkingError::Validation(format!(
                "Unknown vehicle type '{other}'"
            ))),
        }
    }
}

/// Returns true when `id` has the `LL-NNNN-LL` shape: uppercase ASCII letters and digits.
pub fn is_valid_plate(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'-'
        && bytes[7] == b'-'
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[3..7].iter().all(u8::is_ascii_digit)
        && bytes[8..].iter().all(u8::is_ascii_uppercase)
}

/// A parked vehicle.
///
/// The id and type are fixed at construction. The balance only changes through
/// [`Vehicle::credit`] and [`Vehicle::debit`], which reject non-positive amounts.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Vehicle {
    id: String,
    vehicle_type: VehicleType,
    balance: Balance,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, vehicle_type: VehicleType, balance: Decimal) -> Result<Self> {
        let id = id.into();
        if !is_valid_plate(&id) {
            return Err(ParkingError::Validation(format!(
                "Invalid plate number '{id}', expected format AA-0000-AA"
            )));
        }
        if balance < Decimal::ZERO {
            return Err(ParkingError::Validation(
                "Initial balance cannot be negative".to_string(),
            ));
        }
        Ok(Self {
            id,
            vehicle_type,
            balance: Balance::new(balance),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Adds funds to the balance.
    pub fn credit(&mut self, amount: Decimal) -> Result<()> {
        let amount = Amount::new(amount)?;
        self.balance += amount.into();
        Ok(())
    }

    /// Removes funds from the balance. The result may be negative.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        let amount = Amount::new(amount)?;
        self.balance -= amount.into();
        Ok(())
    }

    /// Generates a random plate number. Uniqueness is not guaranteed.
    pub fn generate_plate_number() -> String {
        let mut rng = rand::thread_rng();
        let mut letter = || char::from(rng.gen_range(b'A'..=b'Z'));
        let prefix: String = [letter(), letter()].iter().collect();
        let suffix: String = [letter(), letter()].iter().collect();
        let digits: u16 = rand::thread_rng().gen_range(0..=9999);
        format!("{prefix}-{digits:04}-{suffix}")
    }
}
