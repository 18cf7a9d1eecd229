use super::vehicle::VehicleType;
use crate::error::{ParkingError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Multiplier applied to the shortfall when a balance does not cover the fee.
pub const PENALTY_COEFFICIENT: Decimal = dec!(2.5);

/// Outcome of pricing one billing period for a single vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    pub fee: Decimal,
    pub penalty: Decimal,
}

impl Charge {
    pub fn total(&self) -> Decimal {
        self.fee + self.penalty
    }

    pub fn is_penalised(&self) -> bool {
        self.penalty > Decimal::ZERO
    }
}

/// Fee table indexed by vehicle type.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    fees: BTreeMap<VehicleType, Decimal>,
    penalty_coefficient: Decimal,
}

impl Default for Tariff {
    fn default() -> Self {
        Self::new()
            .with_fee(VehicleType::PassengerCar, dec!(2.0))
            .with_fee(VehicleType::Truck, dec!(5.0))
            .with_fee(VehicleType::Bus, dec!(3.5))
            .with_fee(VehicleType::Motorcycle, dec!(1.5))
    }
}

impl Tariff {
    /// An empty table. Every lookup fails until fees are added.
    pub fn new() -> Self {
        Self {
            fees: BTreeMap::new(),
            penalty_coefficient: PENALTY_COEFFICIENT,
        }
    }

    pub fn with_fee(mut self, vehicle_type: VehicleType, fee: Decimal) -> Self {
        self.fees.insert(vehicle_type, fee);
        self
    }

    pub fn penalty_coefficient(&self) -> Decimal {
        self.penalty_coefficient
    }

    pub fn fee_for(&self, vehicle_type: VehicleType) -> Result<Decimal> {
        match self.fees.get(&vehicle_type) {
            Some(fee) if *fee > Decimal::ZERO => Ok(*fee),
            Some(fee) => Err(ParkingError::Validation(format!(
                "Fee for {vehicle_type} must be positive, got {fee}"
            ))),
            None => Err(ParkingError::Validation(format!(
                "No fee configured for {vehicle_type}"
            ))),
        }
    }

    /// Prices one period for a vehicle holding `balance`.
    ///
    /// A balance that covers the fee pays the fee alone. Otherwise the shortfall
    /// `fee - balance` is multiplied by the penalty coefficient and added on top.
    pub fn charge_for(&self, vehicle_type: VehicleType, balance: Decimal) -> Result<Charge> {
        let fee = self.fee_for(vehicle_type)?;
        let penalty = if balance >= fee {
            Decimal::ZERO
        } else {
            (fee - balance) * self.penalty_coefficient
        };
        Ok(Charge { fee, penalty })
    }
}
